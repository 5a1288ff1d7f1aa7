use std::sync::Arc;
use std::time::Duration;

use hcs_cache::CacheService;
use hcs_codec::{Chunk, CodecResult, FileCodec, FileMemo};
use hcs_crypto::PrivateKey;
use hcs_types::TopicId;
use tracing::{debug, info, warn};

use crate::error::{SdkError, SdkResult};
use crate::message::{MessageFilter, MessageService, SubmitMessageOptions};
use crate::topic::{CreateTopicOptions, TopicService};
use crate::wait::VisibilityWaiter;

#[derive(Clone, Debug, Default)]
pub struct SubmitFileOptions {
    /// Signs every chunk; its public half becomes the file topic's submit key.
    pub submit_key: Option<PrivateKey>,
    pub wait_for_visibility: bool,
    pub visibility_timeout: Option<Duration>,
}

/// Store byte payloads as chunked, checksummed files on dedicated topics.
///
/// File topics never carry an admin key. Publication is not atomic: if a
/// chunk fails, the topic and the chunks before it stay on the ledger.
pub struct FileService {
    topics: Arc<TopicService>,
    messages: Arc<MessageService>,
    cache: CacheService,
    codec: FileCodec,
    waiter: VisibilityWaiter,
}

impl FileService {
    pub fn new(
        topics: Arc<TopicService>,
        messages: Arc<MessageService>,
        cache: CacheService,
        codec: FileCodec,
        waiter: VisibilityWaiter,
    ) -> Self {
        Self {
            topics,
            messages,
            cache,
            codec,
            waiter,
        }
    }

    /// The memo `payload` would be stored under, without publishing anything.
    pub fn file_memo(&self, payload: &[u8]) -> FileMemo {
        self.codec.memo_for(payload)
    }

    pub async fn submit_file(&self, payload: &[u8], options: SubmitFileOptions) -> SdkResult<TopicId> {
        let encoded = self.codec.encode(payload)?;
        let topic_id = self
            .topics
            .create_topic(CreateTopicOptions {
                memo: Some(encoded.memo.to_string()),
                submit_key: options.submit_key.as_ref().map(PrivateKey::public_key),
                admin_key: None,
                ..Default::default()
            })
            .await?;

        let chunk_count = encoded.chunks.len();
        for chunk in &encoded.chunks {
            let body = chunk.to_json()?;
            let chunk_options = SubmitMessageOptions {
                submit_key: options.submit_key.clone(),
                ..Default::default()
            };
            if let Err(e) = self.messages.submit_message(&topic_id, &body, chunk_options).await {
                warn!(
                    topic_id = %topic_id,
                    index = chunk.index,
                    chunk_count,
                    error = %e,
                    "chunk submission failed; file topic left partially written"
                );
                return Err(e);
            }
        }
        info!(topic_id = %topic_id, size = payload.len(), chunk_count, "file submitted");

        if options.wait_for_visibility {
            let everything = MessageFilter::default();
            self.waiter
                .with_timeout(options.visibility_timeout)
                .wait(
                    || self.messages.get_topic_messages(&topic_id, &everything),
                    |messages| messages.len() >= chunk_count,
                )
                .await?;
        }
        Ok(topic_id)
    }

    /// Rebuild and verify the payload stored on `topic_id`.
    pub async fn resolve_file(&self, topic_id: &TopicId) -> SdkResult<Vec<u8>> {
        if let Some(bytes) = self.cache.get_file(topic_id)? {
            debug!(topic_id = %topic_id, "file served from cache");
            return Ok(bytes);
        }

        let info = self.topics.get_topic_info(topic_id).await?;
        let memo = FileMemo::parse(&info.memo)?;
        if info.is_mutable() {
            return Err(SdkError::ImmutabilityViolation(*topic_id));
        }

        let messages = self
            .messages
            .get_topic_messages(topic_id, &MessageFilter::default())
            .await?;
        let chunks = messages
            .iter()
            .map(|m| Chunk::from_json(&m.contents))
            .collect::<CodecResult<Vec<_>>>()?;
        let payload = self.codec.decode(&memo, chunks)?;

        self.cache.set_file(topic_id, &payload)?;
        info!(topic_id = %topic_id, size = payload.len(), chunks = messages.len(), "file resolved");
        Ok(payload)
    }
}

impl std::fmt::Debug for FileService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileService")
            .field("codec", &self.codec)
            .finish_non_exhaustive()
    }
}
