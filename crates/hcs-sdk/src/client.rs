use std::sync::Arc;

use hcs_cache::{CacheService, CacheStore, InMemoryCacheStore};
use hcs_codec::{FileCodec, CHUNK_ENVELOPE_OVERHEAD};
use hcs_ledger::{ConsensusQueryClient, ReadOnlyExecutor, TransactionExecutor};
use hcs_transport::{select_transport, ReadTransport, TransportKind};
use tracing::info;

use crate::config::ClientConfig;
use crate::error::{SdkError, SdkResult};
use crate::file::FileService;
use crate::message::MessageService;
use crate::topic::TopicService;
use crate::wait::VisibilityWaiter;

/// Entry point wiring the topic, message, and file services to one
/// executor, one read transport, and one cache.
pub struct HcsClient {
    config: ClientConfig,
    transport: Arc<dyn ReadTransport>,
    cache: CacheService,
    topics: Arc<TopicService>,
    messages: Arc<MessageService>,
    files: FileService,
}

impl HcsClient {
    pub fn builder(config: ClientConfig) -> HcsClientBuilder {
        HcsClientBuilder::new(config)
    }

    /// A read-only client over the mirror node named in `config`.
    pub fn read_only(config: ClientConfig) -> SdkResult<Self> {
        Self::builder(config).build()
    }

    // ---- Accessors ----

    pub fn topics(&self) -> &TopicService { &self.topics }
    pub fn messages(&self) -> &MessageService { &self.messages }
    pub fn files(&self) -> &FileService { &self.files }
    pub fn cache(&self) -> &CacheService { &self.cache }
    pub fn config(&self) -> &ClientConfig { &self.config }

    pub fn transport_kind(&self) -> TransportKind {
        self.transport.kind()
    }

    /// Drop every cached entry. The client stays usable and refills on read.
    pub fn close(&self) -> SdkResult<()> {
        self.cache.clear()?;
        info!(network = %self.config.network, "client cache cleared");
        Ok(())
    }
}

impl std::fmt::Debug for HcsClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HcsClient")
            .field("network", &self.config.network)
            .field("transport", &self.transport.kind())
            .finish_non_exhaustive()
    }
}

/// Collaborators an [`HcsClient`] is built from.
///
/// Without an executor the client refuses every write. Without an explicit
/// transport one is picked from `direct_queries`: streaming needs a
/// consensus client, REST uses the configured mirror node.
pub struct HcsClientBuilder {
    config: ClientConfig,
    executor: Option<Arc<dyn TransactionExecutor>>,
    consensus: Option<Arc<dyn ConsensusQueryClient>>,
    cache_store: Option<Arc<dyn CacheStore>>,
    transport: Option<Arc<dyn ReadTransport>>,
}

impl HcsClientBuilder {
    pub fn new(config: ClientConfig) -> Self {
        Self {
            config,
            executor: None,
            consensus: None,
            cache_store: None,
            transport: None,
        }
    }

    pub fn executor(mut self, executor: Arc<dyn TransactionExecutor>) -> Self {
        self.executor = Some(executor);
        self
    }

    pub fn consensus(mut self, consensus: Arc<dyn ConsensusQueryClient>) -> Self {
        self.consensus = Some(consensus);
        self
    }

    pub fn cache_store(mut self, store: Arc<dyn CacheStore>) -> Self {
        self.cache_store = Some(store);
        self
    }

    pub fn transport(mut self, transport: Arc<dyn ReadTransport>) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn build(self) -> SdkResult<HcsClient> {
        let config = self.config;
        if config.max_message_bytes <= CHUNK_ENVELOPE_OVERHEAD {
            return Err(SdkError::InvalidArgument(format!(
                "max_message_bytes must exceed {CHUNK_ENVELOPE_OVERHEAD}, got {}",
                config.max_message_bytes
            )));
        }

        let transport = match self.transport {
            Some(transport) => transport,
            None => select_transport(config.direct_queries, self.consensus, &config.mirror)?,
        };
        let executor = self
            .executor
            .unwrap_or_else(|| Arc::new(ReadOnlyExecutor));
        let store = self
            .cache_store
            .unwrap_or_else(|| Arc::new(InMemoryCacheStore::new()));

        let cache = CacheService::new(store, config.network.clone(), config.cache_ttl());
        let waiter = VisibilityWaiter::new(config.wait_options());

        let topics = Arc::new(TopicService::new(
            Arc::clone(&executor),
            Arc::clone(&transport),
            cache.clone(),
            waiter,
        ));
        let messages = Arc::new(MessageService::new(
            executor,
            Arc::clone(&transport),
            cache.clone(),
            waiter,
            config.stream_max_wait(),
        ));
        let files = FileService::new(
            Arc::clone(&topics),
            Arc::clone(&messages),
            cache.clone(),
            FileCodec::standard(config.max_message_bytes),
            waiter,
        );

        info!(
            network = %config.network,
            transport = %transport.kind(),
            "client ready"
        );
        Ok(HcsClient {
            config,
            transport,
            cache,
            topics,
            messages,
            files,
        })
    }
}
