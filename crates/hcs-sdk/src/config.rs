use std::path::Path;
use std::time::Duration;

use hcs_cache::CacheTtl;
use hcs_transport::RestConfig;
use serde::{Deserialize, Serialize};

use crate::error::{SdkError, SdkResult};
use crate::wait::WaitOptions;

/// Client configuration, loadable from TOML.
///
/// Every field has a default, so a file only needs the values it changes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Network name; scopes every cache key.
    pub network: String,
    /// Read through direct consensus subscriptions instead of the mirror node.
    pub direct_queries: bool,
    /// How long a streaming read waits before returning what it has.
    pub stream_max_wait_ms: u64,
    /// Upper bound on a serialized file chunk.
    pub max_message_bytes: usize,
    pub mirror: RestConfig,
    pub visibility: VisibilityConfig,
    pub cache: CacheConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            network: "testnet".into(),
            direct_queries: false,
            stream_max_wait_ms: 5_000,
            max_message_bytes: 1024,
            mirror: RestConfig::default(),
            visibility: VisibilityConfig::default(),
            cache: CacheConfig::default(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VisibilityConfig {
    pub timeout_ms: u64,
    pub poll_interval_ms: u64,
}

impl Default for VisibilityConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 120_000,
            poll_interval_ms: 500,
        }
    }
}

/// Per-kind cache lifetimes in seconds. `0` keeps entries until invalidated.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub info_ttl_secs: u64,
    pub messages_ttl_secs: u64,
    pub file_ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            info_ttl_secs: 300,
            messages_ttl_secs: 300,
            file_ttl_secs: 0,
        }
    }
}

fn ttl(secs: u64) -> Option<Duration> {
    (secs > 0).then(|| Duration::from_secs(secs))
}

impl ClientConfig {
    /// Read a TOML config file.
    pub fn load(path: impl AsRef<Path>) -> SdkResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| SdkError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&text)
    }

    pub fn from_toml_str(text: &str) -> SdkResult<Self> {
        toml::from_str(text).map_err(|e| SdkError::Config(e.to_string()))
    }

    pub fn to_toml_string(&self) -> SdkResult<String> {
        toml::to_string_pretty(self).map_err(|e| SdkError::Config(e.to_string()))
    }

    pub fn wait_options(&self) -> WaitOptions {
        WaitOptions {
            timeout: Duration::from_millis(self.visibility.timeout_ms),
            poll_interval: Duration::from_millis(self.visibility.poll_interval_ms),
        }
    }

    pub fn stream_max_wait(&self) -> Duration {
        Duration::from_millis(self.stream_max_wait_ms)
    }

    pub fn cache_ttl(&self) -> CacheTtl {
        CacheTtl {
            info: ttl(self.cache.info_ttl_secs),
            messages: ttl(self.cache.messages_ttl_secs),
            file: ttl(self.cache.file_ttl_secs),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn default_config() {
        let c = ClientConfig::default();
        assert_eq!(c.network, "testnet");
        assert!(!c.direct_queries);
        assert_eq!(c.mirror.page_size, 25);
        assert_eq!(c.max_message_bytes, 1024);
        assert_eq!(c.wait_options().timeout, Duration::from_millis(120_000));
        assert_eq!(c.wait_options().poll_interval, Duration::from_millis(500));
        assert_eq!(c.cache_ttl().file, None);
        assert_eq!(c.cache_ttl().info, Some(Duration::from_secs(300)));
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let c = ClientConfig::from_toml_str(
            r#"
            network = "mainnet"
            direct_queries = true

            [mirror]
            base_url = "https://mainnet.mirrornode.hedera.com"

            [visibility]
            timeout_ms = 10000
            "#,
        )
        .unwrap();
        assert_eq!(c.network, "mainnet");
        assert!(c.direct_queries);
        assert_eq!(c.mirror.base_url, "https://mainnet.mirrornode.hedera.com");
        assert_eq!(c.mirror.page_size, 25);
        assert_eq!(c.visibility.timeout_ms, 10_000);
        assert_eq!(c.visibility.poll_interval_ms, 500);
    }

    #[test]
    fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "network = \"previewnet\"\nmax_message_bytes = 512").unwrap();
        let c = ClientConfig::load(file.path()).unwrap();
        assert_eq!(c.network, "previewnet");
        assert_eq!(c.max_message_bytes, 512);
    }

    #[test]
    fn missing_file_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = ClientConfig::load(dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(err, SdkError::Config(_)));
    }

    #[test]
    fn invalid_toml_is_config_error() {
        assert!(matches!(
            ClientConfig::from_toml_str("network = ["),
            Err(SdkError::Config(_))
        ));
    }

    #[test]
    fn toml_roundtrip() {
        let c = ClientConfig::default();
        let text = c.to_toml_string().unwrap();
        assert_eq!(ClientConfig::from_toml_str(&text).unwrap(), c);
    }
}
