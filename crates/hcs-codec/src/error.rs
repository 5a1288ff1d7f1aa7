use thiserror::Error;

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("invalid file memo: {0}")]
    InvalidMemo(String),

    #[error("malformed chunk: {0}")]
    MalformedChunk(String),

    #[error("chunk 0 does not carry the data-URI prefix")]
    MissingPrefix,

    #[error("file topic holds no chunks")]
    NoChunks,

    #[error("broken chunk sequence: expected index {expected}, found {found}")]
    ChunkSequence { expected: u64, found: u64 },

    #[error("message limit of {0} bytes leaves no room for chunk content")]
    ChunkLimitTooSmall(usize),

    #[error("base64 decode failed: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("compression failed: {0}")]
    CompressionFailed(String),

    #[error("decompression failed: {0}")]
    DecompressionFailed(String),

    #[error("checksum mismatch: memo says {expected}, content hashes to {actual}")]
    ChecksumMismatch { expected: String, actual: String },
}

pub type CodecResult<T> = Result<T, CodecError>;
