use serde::{Deserialize, Serialize};

use crate::entity::{AccountId, TopicId};

/// Canonical topic metadata.
///
/// Both read transports normalize into this shape: keys are rendered as
/// canonical strings, the auto-renew period is in seconds, and the
/// expiration time is in epoch seconds. The REST transport does not expose
/// an expiration time, so it is optional.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicInfo {
    pub topic_id: TopicId,
    pub memo: String,
    pub admin_key: Option<String>,
    pub submit_key: Option<String>,
    pub auto_renew_period: Option<u64>,
    pub auto_renew_account_id: Option<AccountId>,
    pub expiration_time: Option<i64>,
}

impl TopicInfo {
    /// Minimal info with the given memo and no keys.
    pub fn new(topic_id: TopicId, memo: impl Into<String>) -> Self {
        Self {
            topic_id,
            memo: memo.into(),
            admin_key: None,
            submit_key: None,
            auto_renew_period: None,
            auto_renew_account_id: None,
            expiration_time: None,
        }
    }

    /// Returns `true` if anyone holding the admin key may still mutate the topic.
    pub fn is_mutable(&self) -> bool {
        self.admin_key.as_deref().is_some_and(|k| !k.is_empty())
    }
}
