use std::pin::Pin;
use std::task::{Context, Poll};

use futures::Stream;
use hcs_types::{ConsensusTimestamp, TopicId, TopicMessage};
use tokio::sync::mpsc;

use crate::error::LedgerResult;

/// Bounds of a message subscription.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SubscriptionQuery {
    pub topic_id: TopicId,
    /// Inclusive lower bound.
    pub start_time: Option<ConsensusTimestamp>,
    /// Inclusive upper bound. `None` keeps the subscription open for new messages.
    pub end_time: Option<ConsensusTimestamp>,
    pub limit: Option<usize>,
}

impl SubscriptionQuery {
    pub fn new(topic_id: TopicId) -> Self {
        Self {
            topic_id,
            start_time: None,
            end_time: None,
            limit: None,
        }
    }

    /// Returns `true` if `ts` falls inside the query bounds.
    pub fn contains(&self, ts: &ConsensusTimestamp) -> bool {
        self.start_time.map_or(true, |start| *ts >= start)
            && self.end_time.map_or(true, |end| *ts <= end)
    }
}

struct ReleaseGuard(Option<Box<dyn FnOnce() + Send>>);

impl Drop for ReleaseGuard {
    fn drop(&mut self) {
        if let Some(release) = self.0.take() {
            release();
        }
    }
}

/// A live message stream over one topic.
///
/// The subscription holds a ledger-side resource that is released exactly
/// once when the value is dropped, whichever way the consumer exits.
pub struct Subscription {
    receiver: mpsc::UnboundedReceiver<LedgerResult<TopicMessage>>,
    _release: ReleaseGuard,
}

impl Subscription {
    /// Wrap a receiver; `on_release` runs when the subscription is dropped.
    pub fn new(
        receiver: mpsc::UnboundedReceiver<LedgerResult<TopicMessage>>,
        on_release: impl FnOnce() + Send + 'static,
    ) -> Self {
        Self {
            receiver,
            _release: ReleaseGuard(Some(Box::new(on_release))),
        }
    }

    /// Next item, or `None` once the ledger closed the stream.
    pub async fn recv(&mut self) -> Option<LedgerResult<TopicMessage>> {
        self.receiver.recv().await
    }

    /// Release the subscription explicitly.
    pub fn close(self) {}
}

impl Stream for Subscription {
    type Item = LedgerResult<TopicMessage>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.receiver.poll_recv(cx)
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription").finish_non_exhaustive()
    }
}
