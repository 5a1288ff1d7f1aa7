use hcs_ledger::LedgerError;
use hcs_types::TopicId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("topic not found: {0}")]
    NotFound(TopicId),

    #[error("mirror node returned {status}: {message}")]
    Http { status: u16, message: String },

    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("malformed response: {0}")]
    Malformed(String),

    #[error("invalid mirror url: {0}")]
    InvalidUrl(String),

    #[error("consensus query failed: {0}")]
    Ledger(LedgerError),

    #[error("transport unavailable: {0}")]
    Unavailable(String),
}

impl From<LedgerError> for TransportError {
    fn from(e: LedgerError) -> Self {
        match e {
            LedgerError::TopicNotFound(id) => Self::NotFound(id),
            other => Self::Ledger(other),
        }
    }
}

pub type TransportResult<T> = Result<T, TransportError>;
