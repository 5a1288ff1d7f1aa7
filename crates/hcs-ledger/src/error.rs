use hcs_types::TopicId;

/// Errors produced by ledger collaborators.
///
/// A transaction that reached consensus and failed is not an error here: it
/// comes back as a receipt with a non-success [`crate::ReceiptStatus`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LedgerError {
    #[error("topic not found: {0}")]
    TopicNotFound(TopicId),

    #[error("ledger unavailable: {0}")]
    Unavailable(String),

    #[error("executor is read-only")]
    ReadOnly,

    #[error("serialization error: {0}")]
    Serialization(String),
}

pub type LedgerResult<T> = Result<T, LedgerError>;
