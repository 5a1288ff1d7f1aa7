//! An in-memory network for service tests.

use std::sync::Arc;
use std::time::Duration;

use hcs_codec::Chunk;
use hcs_crypto::PrivateKey;
use hcs_ledger::InMemoryLedger;
use hcs_types::TopicId;

use crate::client::HcsClient;
use crate::config::ClientConfig;
use crate::message::SubmitMessageOptions;
use crate::topic::CreateTopicOptions;

pub(crate) struct TestNet {
    pub ledger: Arc<InMemoryLedger>,
    pub client: HcsClient,
}

impl TestNet {
    pub fn new() -> Self {
        Self::with_delay(Duration::ZERO)
    }

    /// Reads only observe ledger changes `delay` after they are accepted.
    pub fn with_delay(delay: Duration) -> Self {
        let ledger = Arc::new(InMemoryLedger::with_visibility_delay(delay));
        let config = ClientConfig {
            network: "localnet".into(),
            direct_queries: true,
            stream_max_wait_ms: 1_000,
            ..Default::default()
        };
        let client = HcsClient::builder(config)
            .executor(ledger.clone())
            .consensus(ledger.clone())
            .build()
            .unwrap();
        Self { ledger, client }
    }

    pub async fn create(&self, options: CreateTopicOptions) -> TopicId {
        self.client.topics().create_topic(options).await.unwrap()
    }

    pub async fn topic(&self) -> TopicId {
        self.create(CreateTopicOptions::default()).await
    }

    pub async fn admin_topic(&self, admin: &PrivateKey) -> TopicId {
        self.create(CreateTopicOptions {
            admin_key: Some(admin.clone()),
            ..Default::default()
        })
        .await
    }

    pub async fn topic_with_submit_key(&self, key: &PrivateKey) -> TopicId {
        self.create(CreateTopicOptions {
            submit_key: Some(key.public_key()),
            ..Default::default()
        })
        .await
    }

    pub async fn topic_with_memo(&self, memo: &str) -> TopicId {
        self.create(CreateTopicOptions {
            memo: Some(memo.into()),
            ..Default::default()
        })
        .await
    }

    /// Submit `chunks` as-is, in the given order.
    pub async fn publish_chunks(&self, topic_id: &TopicId, chunks: &[Chunk]) {
        for chunk in chunks {
            self.client
                .messages()
                .submit_message(topic_id, &chunk.to_json().unwrap(), SubmitMessageOptions::default())
                .await
                .unwrap();
        }
    }
}
