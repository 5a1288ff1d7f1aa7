use std::sync::Arc;

use async_trait::async_trait;
use hcs_ledger::{ConsensusQueryClient, ConsensusTopicInfo, LedgerError, SubscriptionQuery};
use hcs_types::{TopicId, TopicInfo, TopicMessage};
use tokio::time::{timeout_at, Instant};
use tracing::debug;

use crate::error::TransportResult;
use crate::traits::{MessageQuery, ReadTransport, TransportKind};

/// Reads straight from consensus nodes through a [`ConsensusQueryClient`].
///
/// Each message read opens one subscription and drops it before returning,
/// on every path.
pub struct StreamingTransport {
    client: Arc<dyn ConsensusQueryClient>,
}

impl StreamingTransport {
    pub fn new(client: Arc<dyn ConsensusQueryClient>) -> Self {
        Self { client }
    }
}

/// Canonical form of directly queried metadata.
pub fn normalize_topic_info(info: ConsensusTopicInfo) -> TopicInfo {
    TopicInfo {
        topic_id: info.topic_id,
        memo: info.memo,
        admin_key: info.admin_key.map(|k| k.to_canonical_string()),
        submit_key: info.submit_key.map(|k| k.to_canonical_string()),
        auto_renew_period: info.auto_renew_period.map(|p| p.as_secs()),
        auto_renew_account_id: info.auto_renew_account_id,
        expiration_time: info.expiration_time.map(|t| t.seconds),
    }
}

#[async_trait]
impl ReadTransport for StreamingTransport {
    fn kind(&self) -> TransportKind {
        TransportKind::Streaming
    }

    async fn topic_info(&self, topic_id: &TopicId) -> TransportResult<TopicInfo> {
        let info = self.client.topic_info(topic_id).await?;
        Ok(normalize_topic_info(info))
    }

    async fn topic_messages(
        &self,
        topic_id: &TopicId,
        query: &MessageQuery,
    ) -> TransportResult<Vec<TopicMessage>> {
        let deadline = Instant::now() + query.max_wait;
        let subscription_query = SubscriptionQuery {
            topic_id: *topic_id,
            start_time: query.start,
            end_time: query.end,
            limit: query.limit,
        };

        let mut subscription = match self.client.subscribe(subscription_query).await {
            Ok(subscription) => subscription,
            // A topic that never received a message reads as empty.
            Err(LedgerError::TopicNotFound(_)) => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let limit = query.limit.unwrap_or(usize::MAX);
        let mut messages = Vec::new();
        while messages.len() < limit {
            match timeout_at(deadline, subscription.recv()).await {
                Err(_) => {
                    debug!(topic_id = %topic_id, count = messages.len(), "stream wait elapsed");
                    break;
                }
                Ok(None) => break,
                Ok(Some(Ok(message))) => messages.push(message),
                Ok(Some(Err(LedgerError::TopicNotFound(_)))) => return Ok(Vec::new()),
                Ok(Some(Err(e))) => return Err(e.into()),
            }
        }
        debug!(topic_id = %topic_id, count = messages.len(), "streamed messages");
        Ok(messages)
    }
}

impl std::fmt::Debug for StreamingTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamingTransport").finish_non_exhaustive()
    }
}
