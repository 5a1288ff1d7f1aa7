use std::sync::Arc;
use std::time::Duration;

use hcs_types::{TopicId, TopicInfo, TopicMessage};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use crate::error::{CacheError, CacheResult};
use crate::key::{CacheKey, CacheKind};
use crate::traits::CacheStore;

/// Per-kind time-to-live. `None` means entries never expire on their own.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CacheTtl {
    pub info: Option<Duration>,
    pub messages: Option<Duration>,
    pub file: Option<Duration>,
}

impl CacheTtl {
    fn for_kind(&self, kind: CacheKind) -> Option<Duration> {
        match kind {
            CacheKind::Info => self.info,
            CacheKind::Messages => self.messages,
            CacheKind::File => self.file,
        }
    }
}

/// Typed cache facade shared by the topic, message, and file services.
///
/// Owns the key scheme and the cascade: a topic's reconstructed file is
/// derived from its message list, so every message-list write or removal
/// drops the cached file as well.
#[derive(Clone)]
pub struct CacheService {
    store: Arc<dyn CacheStore>,
    network: String,
    ttl: CacheTtl,
}

impl CacheService {
    pub fn new(store: Arc<dyn CacheStore>, network: impl Into<String>, ttl: CacheTtl) -> Self {
        Self {
            store,
            network: network.into(),
            ttl,
        }
    }

    /// The network name every key is scoped to.
    pub fn network(&self) -> &str {
        &self.network
    }

    pub fn key(&self, kind: CacheKind, topic_id: &TopicId) -> CacheKey {
        CacheKey::new(self.network.clone(), kind, *topic_id)
    }

    // ---- Topic info ----

    pub fn get_info(&self, topic_id: &TopicId) -> CacheResult<Option<TopicInfo>> {
        self.read(CacheKind::Info, topic_id)
    }

    pub fn set_info(&self, topic_id: &TopicId, info: &TopicInfo) -> CacheResult<()> {
        self.write(CacheKind::Info, topic_id, info)
    }

    pub fn remove_info(&self, topic_id: &TopicId) -> CacheResult<()> {
        self.remove(CacheKind::Info, topic_id)?;
        self.remove(CacheKind::File, topic_id)
    }

    // ---- Message lists ----

    pub fn get_messages(&self, topic_id: &TopicId) -> CacheResult<Option<Vec<TopicMessage>>> {
        self.read(CacheKind::Messages, topic_id)
    }

    pub fn set_messages(&self, topic_id: &TopicId, messages: &[TopicMessage]) -> CacheResult<()> {
        self.write(CacheKind::Messages, topic_id, &messages)?;
        self.remove(CacheKind::File, topic_id)
    }

    pub fn remove_messages(&self, topic_id: &TopicId) -> CacheResult<()> {
        self.remove(CacheKind::Messages, topic_id)?;
        self.remove(CacheKind::File, topic_id)
    }

    // ---- Reconstructed files ----

    pub fn get_file(&self, topic_id: &TopicId) -> CacheResult<Option<Vec<u8>>> {
        self.read(CacheKind::File, topic_id)
    }

    pub fn set_file(&self, topic_id: &TopicId, bytes: &[u8]) -> CacheResult<()> {
        self.write(CacheKind::File, topic_id, &bytes)
    }

    pub fn remove_file(&self, topic_id: &TopicId) -> CacheResult<()> {
        self.remove(CacheKind::File, topic_id)
    }

    /// Drop every entry in the backing store.
    pub fn clear(&self) -> CacheResult<()> {
        self.store.clear()
    }

    fn read<T: DeserializeOwned>(&self, kind: CacheKind, topic_id: &TopicId) -> CacheResult<Option<T>> {
        let key = self.key(kind, topic_id).to_string();
        let Some(bytes) = self.store.get(&key)? else {
            debug!(key = %key, "cache miss");
            return Ok(None);
        };
        match bincode::deserialize(&bytes) {
            Ok(value) => {
                debug!(key = %key, "cache hit");
                Ok(Some(value))
            }
            Err(e) => {
                warn!(key = %key, error = %e, "evicting undecodable cache entry");
                self.store.remove(&key)?;
                Ok(None)
            }
        }
    }

    fn write<T: Serialize + ?Sized>(&self, kind: CacheKind, topic_id: &TopicId, value: &T) -> CacheResult<()> {
        let key = self.key(kind, topic_id).to_string();
        let bytes = bincode::serialize(value).map_err(|e| CacheError::Serialization(e.to_string()))?;
        self.store.set(&key, bytes, self.ttl.for_kind(kind))
    }

    fn remove(&self, kind: CacheKind, topic_id: &TopicId) -> CacheResult<()> {
        let key = self.key(kind, topic_id).to_string();
        self.store.remove(&key)?;
        Ok(())
    }
}

impl std::fmt::Debug for CacheService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheService")
            .field("network", &self.network)
            .field("ttl", &self.ttl)
            .finish()
    }
}
