use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::entity::TopicId;
use crate::timestamp::ConsensusTimestamp;

/// One consensus-ordered message on a topic. Immutable once ordered.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicMessage {
    pub topic_id: TopicId,
    pub consensus_timestamp: ConsensusTimestamp,
    pub sequence_number: u64,
    pub contents: Vec<u8>,
}

impl TopicMessage {
    pub fn new(
        topic_id: TopicId,
        consensus_timestamp: ConsensusTimestamp,
        sequence_number: u64,
        contents: impl Into<Vec<u8>>,
    ) -> Self {
        Self {
            topic_id,
            consensus_timestamp,
            sequence_number,
            contents: contents.into(),
        }
    }

    /// Contents as UTF-8, if valid.
    pub fn contents_str(&self) -> Option<&str> {
        std::str::from_utf8(&self.contents).ok()
    }
}

/// Deduplicate by consensus timestamp and sort ascending.
///
/// When two messages share a timestamp the one that appears first in
/// `messages` is kept and later duplicates are dropped.
pub fn dedup_and_sort(messages: impl IntoIterator<Item = TopicMessage>) -> Vec<TopicMessage> {
    let mut by_time: BTreeMap<ConsensusTimestamp, TopicMessage> = BTreeMap::new();
    for message in messages {
        by_time
            .entry(message.consensus_timestamp)
            .or_insert(message);
    }
    by_time.into_values().collect()
}
