use std::fmt;

use hcs_types::TopicId;

/// Kind of artifact held in a cache entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CacheKind {
    Info,
    Messages,
    File,
}

impl CacheKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Messages => "messages",
            Self::File => "file",
        }
    }
}

impl fmt::Display for CacheKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Composite cache key: network, kind, and topic.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub network: String,
    pub kind: CacheKind,
    pub topic_id: TopicId,
}

impl CacheKey {
    pub fn new(network: impl Into<String>, kind: CacheKind, topic_id: TopicId) -> Self {
        Self {
            network: network.into(),
            kind,
            topic_id,
        }
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.network, self.kind, self.topic_id)
    }
}
