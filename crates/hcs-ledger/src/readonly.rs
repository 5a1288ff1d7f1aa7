use async_trait::async_trait;
use hcs_crypto::PrivateKey;

use crate::error::{LedgerError, LedgerResult};
use crate::traits::TransactionExecutor;
use crate::transaction::{Transaction, TransactionReceipt};

/// Executor for clients that only read: every transaction fails with
/// [`LedgerError::ReadOnly`] before anything is signed.
#[derive(Clone, Copy, Debug, Default)]
pub struct ReadOnlyExecutor;

#[async_trait]
impl TransactionExecutor for ReadOnlyExecutor {
    async fn execute(
        &self,
        _transaction: Transaction,
        _signers: &[PrivateKey],
    ) -> LedgerResult<TransactionReceipt> {
        Err(LedgerError::ReadOnly)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hcs_types::TopicId;

    #[tokio::test]
    async fn refuses_everything() {
        let tx = Transaction::TopicDelete {
            topic_id: TopicId::new(0, 0, 1),
        };
        let err = ReadOnlyExecutor.execute(tx, &[]).await.unwrap_err();
        assert_eq!(err, LedgerError::ReadOnly);
    }
}
