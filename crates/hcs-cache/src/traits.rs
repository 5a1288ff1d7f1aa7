use std::time::Duration;

use crate::error::CacheResult;

/// Injectable cache capability.
///
/// Implementations store opaque byte values under string keys. They must be
/// safe to share across tasks; no per-key locking is required.
pub trait CacheStore: Send + Sync {
    /// Read a value. Returns `Ok(None)` on a miss or an expired entry.
    fn get(&self, key: &str) -> CacheResult<Option<Vec<u8>>>;

    /// Write a value, replacing any previous one. `ttl` of `None` never expires.
    fn set(&self, key: &str, value: Vec<u8>, ttl: Option<Duration>) -> CacheResult<()>;

    /// Remove a value. Returns `true` if a live entry existed.
    fn remove(&self, key: &str) -> CacheResult<bool>;

    /// Remove every entry.
    fn clear(&self) -> CacheResult<()>;
}
