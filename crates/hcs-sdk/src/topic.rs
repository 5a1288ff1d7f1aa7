use std::sync::Arc;
use std::time::Duration;

use hcs_cache::CacheService;
use hcs_crypto::{PrivateKey, PublicKey};
use hcs_ledger::{TopicCreate, TopicUpdate, Transaction, TransactionExecutor};
use hcs_transport::ReadTransport;
use hcs_types::{AccountId, TopicId, TopicInfo};
use tracing::{debug, info};

use crate::error::{ensure_success, SdkError, SdkResult};
use crate::wait::VisibilityWaiter;

#[derive(Clone, Debug, Default)]
pub struct CreateTopicOptions {
    pub memo: Option<String>,
    pub submit_key: Option<PublicKey>,
    /// Its public half becomes the topic's admin key.
    pub admin_key: Option<PrivateKey>,
    pub auto_renew_period: Option<Duration>,
    pub auto_renew_account_id: Option<AccountId>,
    /// Required whenever `auto_renew_account_id` is set: the account co-signs.
    pub auto_renew_account_key: Option<PrivateKey>,
    pub wait_for_visibility: bool,
    pub visibility_timeout: Option<Duration>,
}

/// Changes to apply to a topic. Unset fields stay as they are.
#[derive(Clone, Debug, Default)]
pub struct UpdateTopicOptions {
    pub memo: Option<String>,
    pub submit_key: Option<PublicKey>,
    pub admin_key: Option<PrivateKey>,
    pub auto_renew_period: Option<Duration>,
    pub auto_renew_account_id: Option<AccountId>,
    pub auto_renew_account_key: Option<PrivateKey>,
    pub wait_for_visibility: bool,
    pub visibility_timeout: Option<Duration>,
}

impl UpdateTopicOptions {
    /// Whether a freshly read `info` reflects every requested change.
    fn is_reflected_in(&self, info: &TopicInfo) -> bool {
        let canonical = |k: &PublicKey| Some(k.to_canonical_string());
        self.memo.as_ref().map_or(true, |m| &info.memo == m)
            && self.submit_key.as_ref().map_or(true, |k| info.submit_key == canonical(k))
            && self
                .admin_key
                .as_ref()
                .map_or(true, |k| info.admin_key == canonical(&k.public_key()))
            && self
                .auto_renew_period
                .map_or(true, |p| info.auto_renew_period == Some(p.as_secs()))
            && self
                .auto_renew_account_id
                .map_or(true, |a| info.auto_renew_account_id == Some(a))
    }
}

fn check_auto_renew_pair(
    account_id: Option<AccountId>,
    account_key: Option<&PrivateKey>,
) -> SdkResult<()> {
    if account_id.is_some() && account_key.is_none() {
        return Err(SdkError::InvalidArgument(
            "auto_renew_account_id requires auto_renew_account_key".into(),
        ));
    }
    Ok(())
}

/// Create, update, delete, and read topics.
pub struct TopicService {
    executor: Arc<dyn TransactionExecutor>,
    transport: Arc<dyn ReadTransport>,
    cache: CacheService,
    waiter: VisibilityWaiter,
}

impl TopicService {
    pub fn new(
        executor: Arc<dyn TransactionExecutor>,
        transport: Arc<dyn ReadTransport>,
        cache: CacheService,
        waiter: VisibilityWaiter,
    ) -> Self {
        Self {
            executor,
            transport,
            cache,
            waiter,
        }
    }

    pub async fn create_topic(&self, options: CreateTopicOptions) -> SdkResult<TopicId> {
        check_auto_renew_pair(options.auto_renew_account_id, options.auto_renew_account_key.as_ref())?;

        let signers: Vec<PrivateKey> = options
            .auto_renew_account_key
            .iter()
            .chain(options.admin_key.iter())
            .cloned()
            .collect();
        let create = TopicCreate {
            memo: options.memo.clone().unwrap_or_default(),
            admin_key: options.admin_key.as_ref().map(PrivateKey::public_key),
            submit_key: options.submit_key.clone(),
            auto_renew_period: options.auto_renew_period,
            auto_renew_account_id: options.auto_renew_account_id,
        };

        let receipt = self
            .executor
            .execute(Transaction::TopicCreate(create), &signers)
            .await?;
        ensure_success("topic_create", &receipt)?;
        let topic_id = receipt.topic_id.ok_or_else(|| {
            SdkError::InternalError("topic create succeeded without returning a topic id".into())
        })?;
        info!(topic_id = %topic_id, transaction_id = %receipt.transaction_id, "topic created");

        if options.wait_for_visibility {
            self.waiter
                .with_timeout(options.visibility_timeout)
                .wait(|| self.fetch_topic_info(&topic_id), |_| true)
                .await?;
        }
        Ok(topic_id)
    }

    pub async fn update_topic(
        &self,
        topic_id: &TopicId,
        current_admin_key: &PrivateKey,
        options: UpdateTopicOptions,
    ) -> SdkResult<()> {
        check_auto_renew_pair(options.auto_renew_account_id, options.auto_renew_account_key.as_ref())?;

        let signers: Vec<PrivateKey> = std::iter::once(current_admin_key)
            .chain(options.admin_key.iter())
            .chain(options.auto_renew_account_key.iter())
            .cloned()
            .collect();
        let update = TopicUpdate {
            memo: options.memo.clone(),
            admin_key: options.admin_key.as_ref().map(PrivateKey::public_key),
            submit_key: options.submit_key.clone(),
            auto_renew_period: options.auto_renew_period,
            auto_renew_account_id: options.auto_renew_account_id,
            ..TopicUpdate::new(*topic_id)
        };

        let receipt = self
            .executor
            .execute(Transaction::TopicUpdate(update), &signers)
            .await?;
        ensure_success("topic_update", &receipt)?;
        self.cache.remove_info(topic_id)?;
        info!(topic_id = %topic_id, "topic updated");

        if options.wait_for_visibility {
            self.waiter
                .with_timeout(options.visibility_timeout)
                .wait(
                    || self.fetch_topic_info(topic_id),
                    |info| options.is_reflected_in(info),
                )
                .await?;
        }
        Ok(())
    }

    pub async fn delete_topic(
        &self,
        topic_id: &TopicId,
        current_admin_key: &PrivateKey,
        wait_for_visibility: bool,
    ) -> SdkResult<()> {
        let receipt = self
            .executor
            .execute(
                Transaction::TopicDelete {
                    topic_id: *topic_id,
                },
                std::slice::from_ref(current_admin_key),
            )
            .await?;
        ensure_success("topic_delete", &receipt)?;
        self.cache.remove_info(topic_id)?;
        info!(topic_id = %topic_id, "topic deleted");

        if wait_for_visibility {
            self.waiter
                .wait(
                    || async move {
                        match self.fetch_topic_info(topic_id).await {
                            Ok(_) => Ok(false),
                            Err(SdkError::NotFound(_)) => Ok(true),
                            Err(e) => Err(e),
                        }
                    },
                    |gone| *gone,
                )
                .await?;
        }
        Ok(())
    }

    /// Topic metadata, from cache when present.
    pub async fn get_topic_info(&self, topic_id: &TopicId) -> SdkResult<TopicInfo> {
        if let Some(info) = self.cache.get_info(topic_id)? {
            return Ok(info);
        }
        let info = self.fetch_topic_info(topic_id).await?;
        self.cache.set_info(topic_id, &info)?;
        Ok(info)
    }

    /// Topic metadata straight from the transport, bypassing the cache.
    pub async fn fetch_topic_info(&self, topic_id: &TopicId) -> SdkResult<TopicInfo> {
        debug!(topic_id = %topic_id, transport = %self.transport.kind(), "reading topic info");
        Ok(self.transport.topic_info(topic_id).await?)
    }
}

impl std::fmt::Debug for TopicService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TopicService")
            .field("transport", &self.transport.kind())
            .field("cache", &self.cache)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testkit::TestNet;
    use hcs_ledger::ReceiptStatus;
    use hcs_types::ConsensusTimestamp;

    #[tokio::test]
    async fn create_and_read_topic() {
        let net = TestNet::new();
        let submit = PrivateKey::generate();
        let topic_id = net
            .client
            .topics()
            .create_topic(CreateTopicOptions {
                memo: Some("channel".into()),
                submit_key: Some(submit.public_key()),
                ..Default::default()
            })
            .await
            .unwrap();

        let info = net.client.topics().get_topic_info(&topic_id).await.unwrap();
        assert_eq!(info.memo, "channel");
        assert_eq!(info.submit_key, Some(submit.public_key().to_canonical_string()));
        assert!(!info.is_mutable());
    }

    #[tokio::test]
    async fn auto_renew_account_needs_its_key() {
        let net = TestNet::new();
        let err = net
            .client
            .topics()
            .create_topic(CreateTopicOptions {
                auto_renew_account_id: Some(AccountId::new(0, 0, 55)),
                ..Default::default()
            })
            .await
            .unwrap_err();
        assert!(matches!(err, SdkError::InvalidArgument(_)));
        assert_eq!(net.ledger.transaction_count(), 0);
    }

    #[tokio::test]
    async fn auto_renew_account_cosigns() {
        let net = TestNet::new();
        let account = AccountId::new(0, 0, 55);
        let account_key = PrivateKey::generate();
        net.ledger.register_account(account, account_key.public_key());

        let topic_id = net
            .client
            .topics()
            .create_topic(CreateTopicOptions {
                auto_renew_account_id: Some(account),
                auto_renew_account_key: Some(account_key),
                ..Default::default()
            })
            .await
            .unwrap();
        let info = net.client.topics().get_topic_info(&topic_id).await.unwrap();
        assert_eq!(info.auto_renew_account_id, Some(account));
    }

    #[tokio::test]
    async fn failed_receipt_is_transaction_failed() {
        let net = TestNet::new();
        net.ledger.fail_after(0, ReceiptStatus::InvalidSignature);
        let err = net
            .client
            .topics()
            .create_topic(CreateTopicOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            SdkError::TransactionFailed {
                status: ReceiptStatus::InvalidSignature,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn info_is_served_from_cache() {
        let net = TestNet::new();
        let topic_id = net.topic().await;
        net.client.topics().get_topic_info(&topic_id).await.unwrap();
        net.client.topics().get_topic_info(&topic_id).await.unwrap();
        assert_eq!(net.ledger.info_query_count(), 1);
    }

    #[tokio::test]
    async fn update_invalidates_cached_info() {
        let net = TestNet::new();
        let admin = PrivateKey::generate();
        let topic_id = net.admin_topic(&admin).await;
        net.client.topics().get_topic_info(&topic_id).await.unwrap();

        net.client
            .topics()
            .update_topic(
                &topic_id,
                &admin,
                UpdateTopicOptions {
                    memo: Some("renamed".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        let info = net.client.topics().get_topic_info(&topic_id).await.unwrap();
        assert_eq!(info.memo, "renamed");
    }

    #[tokio::test]
    async fn update_with_wrong_admin_fails() {
        let net = TestNet::new();
        let topic_id = net.admin_topic(&PrivateKey::generate()).await;
        let err = net
            .client
            .topics()
            .update_topic(&topic_id, &PrivateKey::generate(), UpdateTopicOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, SdkError::TransactionFailed { .. }));
    }

    #[tokio::test]
    async fn admin_key_rotation_requires_both_keys() {
        let net = TestNet::new();
        let admin = PrivateKey::generate();
        let next_admin = PrivateKey::generate();
        let topic_id = net.admin_topic(&admin).await;

        net.client
            .topics()
            .update_topic(
                &topic_id,
                &admin,
                UpdateTopicOptions {
                    admin_key: Some(next_admin.clone()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        let info = net.client.topics().get_topic_info(&topic_id).await.unwrap();
        assert_eq!(info.admin_key, Some(next_admin.public_key().to_canonical_string()));
    }

    #[tokio::test]
    async fn delete_makes_topic_not_found() {
        let net = TestNet::new();
        let admin = PrivateKey::generate();
        let topic_id = net.admin_topic(&admin).await;
        net.client.topics().get_topic_info(&topic_id).await.unwrap();

        net.client
            .topics()
            .delete_topic(&topic_id, &admin, true)
            .await
            .unwrap();
        let err = net.client.topics().get_topic_info(&topic_id).await.unwrap_err();
        assert!(matches!(err, SdkError::NotFound(_)));
    }

    // ---- Visibility waits against a lagging replica ----

    #[tokio::test(start_paused = true)]
    async fn create_waits_for_visibility() {
        let net = TestNet::with_delay(Duration::from_secs(3));
        let started = tokio::time::Instant::now();
        let topic_id = net
            .client
            .topics()
            .create_topic(CreateTopicOptions {
                wait_for_visibility: true,
                ..Default::default()
            })
            .await
            .unwrap();
        assert!(started.elapsed() >= Duration::from_secs(3));
        assert!(net.client.topics().fetch_topic_info(&topic_id).await.is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn create_wait_times_out() {
        let net = TestNet::with_delay(Duration::from_secs(60));
        let err = net
            .client
            .topics()
            .create_topic(CreateTopicOptions {
                wait_for_visibility: true,
                visibility_timeout: Some(Duration::from_secs(2)),
                ..Default::default()
            })
            .await
            .unwrap_err();
        assert!(matches!(err, SdkError::Timeout(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn update_waits_until_changes_are_visible() {
        let net = TestNet::with_delay(Duration::from_secs(2));
        let admin = PrivateKey::generate();
        let topic_id = net.admin_topic(&admin).await;
        tokio::time::advance(Duration::from_secs(2)).await;

        net.client
            .topics()
            .update_topic(
                &topic_id,
                &admin,
                UpdateTopicOptions {
                    memo: Some("v2".into()),
                    auto_renew_period: Some(Duration::from_secs(86_400)),
                    wait_for_visibility: true,
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        let info = net.client.topics().fetch_topic_info(&topic_id).await.unwrap();
        assert_eq!(info.memo, "v2");
        assert_eq!(info.auto_renew_period, Some(86_400));
        assert!(info.expiration_time.unwrap() > ConsensusTimestamp::zero().seconds);
    }
}
