use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use hcs_cache::CacheService;
use hcs_crypto::PrivateKey;
use hcs_ledger::{Transaction, TransactionExecutor};
use hcs_transport::{MessageQuery, ReadTransport};
use hcs_types::{dedup_and_sort, AccountId, ConsensusTimestamp, TopicId, TopicMessage, TransactionId};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{ensure_success, SdkResult};
use crate::wait::VisibilityWaiter;

/// Slack applied to caller-supplied time bounds, which usually come from
/// millisecond-precision clocks.
const TIMESTAMP_TOLERANCE: Duration = Duration::from_millis(1);

#[derive(Clone, Debug, Default)]
pub struct SubmitMessageOptions {
    pub submit_key: Option<PrivateKey>,
    pub wait_for_visibility: bool,
    pub visibility_timeout: Option<Duration>,
}

/// Where and how a message was accepted.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageSubmission {
    pub node_id: AccountId,
    pub transaction_id: TransactionId,
    pub transaction_hash: String,
}

/// Time window and size of a history read. Bounds are inclusive.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MessageFilter {
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub limit: Option<usize>,
    /// Overrides the configured streaming wait for this read.
    pub max_wait: Option<Duration>,
}

impl MessageFilter {
    pub fn with_limit(limit: usize) -> Self {
        Self {
            limit: Some(limit),
            ..Self::default()
        }
    }
}

/// Publish messages and read reconciled topic history.
pub struct MessageService {
    executor: Arc<dyn TransactionExecutor>,
    transport: Arc<dyn ReadTransport>,
    cache: CacheService,
    waiter: VisibilityWaiter,
    stream_max_wait: Duration,
}

impl MessageService {
    pub fn new(
        executor: Arc<dyn TransactionExecutor>,
        transport: Arc<dyn ReadTransport>,
        cache: CacheService,
        waiter: VisibilityWaiter,
        stream_max_wait: Duration,
    ) -> Self {
        Self {
            executor,
            transport,
            cache,
            waiter,
            stream_max_wait,
        }
    }

    pub async fn submit_message(
        &self,
        topic_id: &TopicId,
        contents: &[u8],
        options: SubmitMessageOptions,
    ) -> SdkResult<MessageSubmission> {
        let transaction = Transaction::MessageSubmit {
            topic_id: *topic_id,
            message: contents.to_vec(),
        };
        let signers: Vec<PrivateKey> = options.submit_key.into_iter().collect();
        let receipt = self.executor.execute(transaction, &signers).await?;
        ensure_success("message_submit", &receipt)?;
        self.cache.remove_messages(topic_id)?;
        debug!(
            topic_id = %topic_id,
            sequence_number = ?receipt.topic_sequence_number,
            size = contents.len(),
            "message submitted"
        );

        if options.wait_for_visibility {
            let everything = MessageFilter::default();
            self.waiter
                .with_timeout(options.visibility_timeout)
                .wait(
                    || self.get_topic_messages(topic_id, &everything),
                    |messages| messages.iter().any(|m| m.contents == contents),
                )
                .await?;
        }

        Ok(MessageSubmission {
            node_id: receipt.node_id,
            transaction_id: receipt.transaction_id,
            transaction_hash: receipt.transaction_hash,
        })
    }

    /// Messages on a topic within `filter`, ascending by consensus time with
    /// no duplicate timestamps.
    ///
    /// The cached list is served as is when its newest message already
    /// reaches `filter.to`. Otherwise only messages after that newest one
    /// are fetched and merged in.
    pub async fn get_topic_messages(
        &self,
        topic_id: &TopicId,
        filter: &MessageFilter,
    ) -> SdkResult<Vec<TopicMessage>> {
        let from = filter.from.map(ConsensusTimestamp::from);
        let to = filter.to.map(ConsensusTimestamp::from);

        let cached = self.cache.get_messages(topic_id)?.unwrap_or_default();
        let watermark = cached.last().map(|m| m.consensus_timestamp);

        // Coverage is exact; the tolerance only widens the returned window.
        if let (Some(watermark), Some(to)) = (watermark, to) {
            if watermark >= to {
                debug!(topic_id = %topic_id, count = cached.len(), "messages served from cache");
                return Ok(select(&cached, from, Some(to), filter.limit));
            }
        }

        let end = to.unwrap_or_else(ConsensusTimestamp::now);
        let start = watermark.map(|w| w.next());
        let fresh = if start.is_some_and(|s| s > end) {
            Vec::new()
        } else {
            let query = MessageQuery {
                start,
                end: Some(end),
                // A later `from` means a limited fetch could stop short of it.
                limit: if from.is_none() { filter.limit } else { None },
                max_wait: filter.max_wait.unwrap_or(self.stream_max_wait),
            };
            self.transport.topic_messages(topic_id, &query).await?
        };

        if fresh.is_empty() {
            return Ok(select(&cached, from, to, filter.limit));
        }

        let fetched = fresh.len();
        let merged = dedup_and_sort(cached.into_iter().chain(fresh));
        self.cache.set_messages(topic_id, &merged)?;
        info!(topic_id = %topic_id, fetched, total = merged.len(), "topic messages refreshed");
        Ok(select(&merged, from, to, filter.limit))
    }
}

fn select(
    messages: &[TopicMessage],
    from: Option<ConsensusTimestamp>,
    to: Option<ConsensusTimestamp>,
    limit: Option<usize>,
) -> Vec<TopicMessage> {
    let lower = from.map(|f| f.saturating_sub(TIMESTAMP_TOLERANCE));
    let upper = to.map(|t| t.saturating_add(TIMESTAMP_TOLERANCE));
    messages
        .iter()
        .filter(|m| lower.map_or(true, |l| m.consensus_timestamp >= l))
        .filter(|m| upper.map_or(true, |u| m.consensus_timestamp <= u))
        .take(limit.unwrap_or(usize::MAX))
        .cloned()
        .collect()
}

impl std::fmt::Debug for MessageService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MessageService")
            .field("transport", &self.transport.kind())
            .field("stream_max_wait", &self.stream_max_wait)
            .finish()
    }
}
