use std::time::Duration;

use hcs_cache::CacheError;
use hcs_codec::CodecError;
use hcs_ledger::{LedgerError, ReceiptStatus, TransactionReceipt};
use hcs_transport::TransportError;
use hcs_types::TopicId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SdkError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("{operation} failed with status {status}")]
    TransactionFailed {
        operation: &'static str,
        status: ReceiptStatus,
    },

    #[error("internal error: {0}")]
    InternalError(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("invalid format: {0}")]
    InvalidFormat(String),

    #[error("file topic {0} carries an admin key")]
    ImmutabilityViolation(TopicId),

    #[error("checksum mismatch: expected {expected}, got {actual}")]
    ChecksumMismatch { expected: String, actual: String },

    #[error("corrupt chunk sequence: {0}")]
    CorruptChunkSequence(String),

    #[error("timed out after {0:?}")]
    Timeout(Duration),

    #[error("transport error: {0}")]
    Transport(TransportError),

    #[error("cache error: {0}")]
    Cache(#[from] CacheError),

    #[error("ledger error: {0}")]
    Ledger(#[from] LedgerError),

    #[error("configuration error: {0}")]
    Config(String),
}

pub type SdkResult<T> = Result<T, SdkError>;

impl From<TransportError> for SdkError {
    fn from(e: TransportError) -> Self {
        match e {
            TransportError::NotFound(id) => Self::NotFound(format!("topic {id}")),
            other => Self::Transport(other),
        }
    }
}

impl From<CodecError> for SdkError {
    fn from(e: CodecError) -> Self {
        match e {
            CodecError::ChecksumMismatch { expected, actual } => Self::ChecksumMismatch { expected, actual },
            CodecError::NoChunks | CodecError::ChunkSequence { .. } => Self::CorruptChunkSequence(e.to_string()),
            CodecError::ChunkLimitTooSmall(_) => Self::InvalidArgument(e.to_string()),
            CodecError::CompressionFailed(_) => Self::InternalError(e.to_string()),
            CodecError::InvalidMemo(_)
            | CodecError::MalformedChunk(_)
            | CodecError::MissingPrefix
            | CodecError::Base64(_)
            | CodecError::DecompressionFailed(_) => Self::InvalidFormat(e.to_string()),
        }
    }
}

/// Fail with `TransactionFailed` unless the receipt reports success.
pub(crate) fn ensure_success(operation: &'static str, receipt: &TransactionReceipt) -> SdkResult<()> {
    if receipt.status.is_success() {
        Ok(())
    } else {
        Err(SdkError::TransactionFailed {
            operation,
            status: receipt.status,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_not_found_maps_to_not_found() {
        let err: SdkError = TransportError::NotFound(TopicId::new(0, 0, 8)).into();
        assert!(matches!(err, SdkError::NotFound(ref s) if s == "topic 0.0.8"));
    }

    #[test]
    fn codec_errors_map_to_kinds() {
        let seq: SdkError = CodecError::ChunkSequence { expected: 1, found: 2 }.into();
        assert!(matches!(seq, SdkError::CorruptChunkSequence(_)));
        let memo: SdkError = CodecError::InvalidMemo("x".into()).into();
        assert!(matches!(memo, SdkError::InvalidFormat(_)));
        let sum: SdkError = CodecError::ChecksumMismatch {
            expected: "a".into(),
            actual: "b".into(),
        }
        .into();
        assert!(matches!(sum, SdkError::ChecksumMismatch { .. }));
    }

    #[test]
    fn failed_status_names_the_operation() {
        let err = SdkError::TransactionFailed {
            operation: "topic_update",
            status: ReceiptStatus::InvalidSignature,
        };
        assert_eq!(err.to_string(), "topic_update failed with status INVALID_SIGNATURE");
    }
}
