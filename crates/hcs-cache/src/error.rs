/// Errors from cache operations.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// Serialization of a value failed.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// The backing store is unavailable.
    #[error("cache backend unavailable: {0}")]
    Unavailable(String),
}

/// Result alias for cache operations.
pub type CacheResult<T> = Result<T, CacheError>;
