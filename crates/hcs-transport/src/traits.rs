use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use hcs_types::{ConsensusTimestamp, TopicId, TopicInfo, TopicMessage};

use crate::error::TransportResult;

/// Which read path a transport uses.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TransportKind {
    Streaming,
    Rest,
}

impl fmt::Display for TransportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Streaming => f.write_str("streaming"),
            Self::Rest => f.write_str("rest"),
        }
    }
}

/// Bounds of a message history read. Both ends are inclusive.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MessageQuery {
    pub start: Option<ConsensusTimestamp>,
    pub end: Option<ConsensusTimestamp>,
    pub limit: Option<usize>,
    /// How long a streaming read waits for the ledger before returning what
    /// it has. Ignored by the REST transport.
    pub max_wait: Duration,
}

impl MessageQuery {
    pub fn new(max_wait: Duration) -> Self {
        Self {
            start: None,
            end: None,
            limit: None,
            max_wait,
        }
    }
}

/// A read path for topic metadata and message history.
#[async_trait]
pub trait ReadTransport: Send + Sync {
    fn kind(&self) -> TransportKind;

    /// Current topic metadata. Absent or deleted topics are `NotFound`.
    async fn topic_info(&self, topic_id: &TopicId) -> TransportResult<TopicInfo>;

    /// Messages within `query`, in consensus order.
    async fn topic_messages(
        &self,
        topic_id: &TopicId,
        query: &MessageQuery,
    ) -> TransportResult<Vec<TopicMessage>>;
}
