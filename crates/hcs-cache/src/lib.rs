//! Keyed cache for the HCS object layer.
//!
//! The cache fronts topic metadata, message lists, and reconstructed files.
//! It is a pure performance optimization: the ledger is the only source of
//! truth and every entry can be re-derived from it.
//!
//! # Entry Kinds
//!
//! - [`CacheKind::Info`] -- canonical topic metadata
//! - [`CacheKind::Messages`] -- deduplicated, ordered message list
//! - [`CacheKind::File`] -- verified bytes reassembled from a file topic
//!
//! # Storage Backends
//!
//! All backends implement the [`CacheStore`] trait:
//!
//! - [`InMemoryCacheStore`] -- `HashMap`-based store with per-entry expiry
//!
//! # Design Rules
//!
//! 1. Keys are `<network>:<kind>:<topic_id>`.
//! 2. Writing or removing a message list removes the topic's cached file.
//! 3. Removing topic info removes the topic's cached file; writing it does not.
//! 4. Concurrent writers to the same key race last-writer-wins.
//! 5. An entry that cannot be decoded is a miss and is evicted.

pub mod error;
pub mod key;
pub mod memory;
pub mod service;
pub mod traits;

pub use error::{CacheError, CacheResult};
pub use key::{CacheKey, CacheKind};
pub use memory::InMemoryCacheStore;
pub use service::{CacheService, CacheTtl};
pub use traits::CacheStore;
