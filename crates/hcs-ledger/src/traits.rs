use std::time::Duration;

use async_trait::async_trait;
use hcs_crypto::{PrivateKey, PublicKey};
use hcs_types::{AccountId, ConsensusTimestamp, TopicId};

use crate::error::LedgerResult;
use crate::subscription::{Subscription, SubscriptionQuery};
use crate::transaction::{Transaction, TransactionReceipt};

/// Sign, submit, and await the receipt of a transaction.
///
/// Implementations sign the body with every key in `signers` (and with the
/// payer's own key). A transaction that reached consensus but failed returns
/// `Ok` with a non-success status; `Err` is reserved for transport failures.
#[async_trait]
pub trait TransactionExecutor: Send + Sync {
    async fn execute(
        &self,
        transaction: Transaction,
        signers: &[PrivateKey],
    ) -> LedgerResult<TransactionReceipt>;
}

/// Topic metadata as the direct query path reports it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConsensusTopicInfo {
    pub topic_id: TopicId,
    pub memo: String,
    pub admin_key: Option<PublicKey>,
    pub submit_key: Option<PublicKey>,
    pub auto_renew_period: Option<Duration>,
    pub auto_renew_account_id: Option<AccountId>,
    pub expiration_time: Option<ConsensusTimestamp>,
    pub sequence_number: u64,
}

/// Direct queries against consensus nodes.
///
/// Only available in runtimes that can hold long-lived streaming
/// connections; elsewhere the REST mirror is used instead.
#[async_trait]
pub trait ConsensusQueryClient: Send + Sync {
    /// Current metadata of a topic. Deleted topics are `TopicNotFound`.
    async fn topic_info(&self, topic_id: &TopicId) -> LedgerResult<ConsensusTopicInfo>;

    /// Open a message subscription bounded by `query`.
    async fn subscribe(&self, query: SubscriptionQuery) -> LedgerResult<Subscription>;
}
