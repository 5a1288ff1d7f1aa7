use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use hcs_crypto::{ContentHasher, PrivateKey, PublicKey, Sha256Hasher};
use hcs_types::{AccountId, ConsensusTimestamp, TopicId, TopicMessage, TransactionId};
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::debug;

use crate::error::{LedgerError, LedgerResult};
use crate::subscription::{Subscription, SubscriptionQuery};
use crate::traits::{ConsensusQueryClient, ConsensusTopicInfo, TransactionExecutor};
use crate::transaction::{
    ReceiptStatus, SignedTransaction, TopicCreate, TopicUpdate, Transaction, TransactionReceipt,
    MAX_MEMO_BYTES, MAX_MESSAGE_BYTES,
};

const DEFAULT_AUTO_RENEW_PERIOD: Duration = Duration::from_secs(7_776_000);
const FIRST_TOPIC_NUM: u64 = 1000;

type MessageSender = mpsc::UnboundedSender<LedgerResult<TopicMessage>>;

/// In-memory ledger for tests, local demos, and embedding.
///
/// Acts as both the [`TransactionExecutor`] and the [`ConsensusQueryClient`].
/// Every change is stamped with a query-side visibility instant so tests can
/// model a read replica that lags behind consensus.
pub struct InMemoryLedger {
    node_id: AccountId,
    payer: AccountId,
    visibility_delay: Duration,
    inner: RwLock<LedgerState>,
    stats: Arc<LedgerStats>,
    injected_failure: Mutex<Option<InjectedFailure>>,
    stream_error: Mutex<Option<LedgerError>>,
}

#[derive(Default)]
struct LedgerStats {
    transactions: AtomicU64,
    info_queries: AtomicU64,
    subscriptions_opened: AtomicU64,
    active_subscriptions: AtomicUsize,
}

struct InjectedFailure {
    remaining_successes: usize,
    status: ReceiptStatus,
}

struct LedgerState {
    topics: HashMap<TopicId, TopicRecord>,
    accounts: HashMap<AccountId, PublicKey>,
    next_topic_num: u64,
    last_timestamp: ConsensusTimestamp,
    live: Vec<LiveSubscriber>,
}

#[derive(Default)]
struct TopicRecord {
    /// Metadata history; `None` marks deletion.
    versions: Vec<(Instant, Option<ConsensusTopicInfo>)>,
    messages: Vec<(Instant, TopicMessage)>,
}

impl TopicRecord {
    fn current(&self) -> Option<&ConsensusTopicInfo> {
        self.versions.last().and_then(|(_, info)| info.as_ref())
    }

    fn visible(&self, now: Instant) -> Option<&ConsensusTopicInfo> {
        self.versions
            .iter()
            .rev()
            .find(|(at, _)| *at <= now)
            .and_then(|(_, info)| info.as_ref())
    }
}

struct LiveSubscriber {
    query: SubscriptionQuery,
    sender: MessageSender,
}

#[derive(Default)]
struct Applied {
    topic_id: Option<TopicId>,
    sequence_number: Option<u64>,
    message: Option<(Instant, TopicMessage)>,
}

impl LedgerState {
    fn next_timestamp(&mut self) -> ConsensusTimestamp {
        let now = ConsensusTimestamp::now();
        let next = if now > self.last_timestamp {
            now
        } else {
            self.last_timestamp.next()
        };
        self.last_timestamp = next;
        next
    }
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::with_visibility_delay(Duration::ZERO)
    }

    /// A ledger whose query side only sees changes `delay` after consensus.
    pub fn with_visibility_delay(delay: Duration) -> Self {
        Self {
            node_id: AccountId::new(0, 0, 3),
            payer: AccountId::new(0, 0, 2),
            visibility_delay: delay,
            inner: RwLock::new(LedgerState {
                topics: HashMap::new(),
                accounts: HashMap::new(),
                next_topic_num: FIRST_TOPIC_NUM,
                last_timestamp: ConsensusTimestamp::zero(),
                live: Vec::new(),
            }),
            stats: Arc::new(LedgerStats::default()),
            injected_failure: Mutex::new(None),
            stream_error: Mutex::new(None),
        }
    }

    /// The payer account stamped into transaction ids.
    pub fn payer(&self) -> AccountId {
        self.payer
    }

    /// Register an account so it can be used as an auto-renew account.
    pub fn register_account(&self, account_id: AccountId, key: PublicKey) {
        self.inner
            .write()
            .expect("lock poisoned")
            .accounts
            .insert(account_id, key);
    }

    /// After `successes` more successful transactions, fail the next one with
    /// `status`. The failure fires once.
    pub fn fail_after(&self, successes: usize, status: ReceiptStatus) {
        *self.injected_failure.lock().expect("lock poisoned") = Some(InjectedFailure {
            remaining_successes: successes,
            status,
        });
    }

    /// Make every new subscription yield `error` after its historical messages.
    pub fn fail_subscriptions_with(&self, error: Option<LedgerError>) {
        *self.stream_error.lock().expect("lock poisoned") = error;
    }

    /// All messages that reached consensus on a topic, visible or not.
    pub fn messages(&self, topic_id: &TopicId) -> Vec<TopicMessage> {
        let state = self.inner.read().expect("lock poisoned");
        state
            .topics
            .get(topic_id)
            .map(|record| record.messages.iter().map(|(_, m)| m.clone()).collect())
            .unwrap_or_default()
    }

    /// Consensus-side metadata, ignoring visibility. `None` if absent or deleted.
    pub fn consensus_topic(&self, topic_id: &TopicId) -> Option<ConsensusTopicInfo> {
        let state = self.inner.read().expect("lock poisoned");
        state.topics.get(topic_id).and_then(|r| r.current().cloned())
    }

    pub fn topic_count(&self) -> usize {
        self.inner.read().expect("lock poisoned").topics.len()
    }

    /// Executed transactions, including failed ones.
    pub fn transaction_count(&self) -> u64 {
        self.stats.transactions.load(Ordering::SeqCst)
    }

    /// Topic info queries served.
    pub fn info_query_count(&self) -> u64 {
        self.stats.info_queries.load(Ordering::SeqCst)
    }

    /// Subscriptions opened so far.
    pub fn subscription_count(&self) -> u64 {
        self.stats.subscriptions_opened.load(Ordering::SeqCst)
    }

    /// Subscriptions opened and not yet released.
    pub fn active_subscriptions(&self) -> usize {
        self.stats.active_subscriptions.load(Ordering::SeqCst)
    }

    fn take_injected_failure(&self) -> Option<ReceiptStatus> {
        let mut slot = self.injected_failure.lock().expect("lock poisoned");
        let failure = slot.as_mut()?;
        if failure.remaining_successes > 0 {
            failure.remaining_successes -= 1;
            return None;
        }
        slot.take().map(|f| f.status)
    }

    fn apply(
        &self,
        state: &mut LedgerState,
        signed: &SignedTransaction,
        now: Instant,
    ) -> Result<Applied, ReceiptStatus> {
        let visible_at = now + self.visibility_delay;
        match &signed.transaction {
            Transaction::TopicCreate(create) => {
                let info = create_topic(state, signed, create)?;
                let topic_id = info.topic_id;
                state.topics.insert(
                    topic_id,
                    TopicRecord {
                        versions: vec![(visible_at, Some(info))],
                        messages: Vec::new(),
                    },
                );
                Ok(Applied {
                    topic_id: Some(topic_id),
                    ..Default::default()
                })
            }
            Transaction::TopicUpdate(update) => {
                check_auto_renew(&state.accounts, signed, update.auto_renew_account_id)?;
                let record = state
                    .topics
                    .get_mut(&update.topic_id)
                    .ok_or(ReceiptStatus::InvalidTopicId)?;
                let current = record.current().ok_or(ReceiptStatus::InvalidTopicId)?;
                let updated = update_topic(current, signed, update)?;
                record.versions.push((visible_at, Some(updated)));
                Ok(Applied::default())
            }
            Transaction::TopicDelete { topic_id } => {
                let record = state
                    .topics
                    .get_mut(topic_id)
                    .ok_or(ReceiptStatus::InvalidTopicId)?;
                let current = record.current().ok_or(ReceiptStatus::InvalidTopicId)?;
                authorize_admin(current, signed)?;
                record.versions.push((visible_at, None));
                Ok(Applied::default())
            }
            Transaction::MessageSubmit { topic_id, message } => {
                if message.is_empty() {
                    return Err(ReceiptStatus::InvalidTopicMessage);
                }
                if message.len() > MAX_MESSAGE_BYTES {
                    return Err(ReceiptStatus::MessageSizeTooLarge);
                }
                {
                    let current = state
                        .topics
                        .get(topic_id)
                        .and_then(TopicRecord::current)
                        .ok_or(ReceiptStatus::InvalidTopicId)?;
                    if let Some(submit_key) = &current.submit_key {
                        if !signed.is_signed_by(submit_key) {
                            return Err(ReceiptStatus::InvalidSignature);
                        }
                    }
                }
                let timestamp = state.next_timestamp();
                let record = state
                    .topics
                    .get_mut(topic_id)
                    .ok_or(ReceiptStatus::InvalidTopicId)?;
                let sequence_number = match record.versions.last_mut() {
                    Some((_, Some(info))) => {
                        info.sequence_number += 1;
                        info.sequence_number
                    }
                    _ => return Err(ReceiptStatus::InvalidTopicId),
                };
                let msg = TopicMessage::new(*topic_id, timestamp, sequence_number, message.clone());
                record.messages.push((visible_at, msg.clone()));
                Ok(Applied {
                    sequence_number: Some(sequence_number),
                    message: Some((visible_at, msg)),
                    ..Default::default()
                })
            }
        }
    }

    fn deliver_live(&self, state: &mut LedgerState, visible_at: Instant, msg: &TopicMessage) {
        let mut delayed = Vec::new();
        state.live.retain(|sub| {
            if sub.query.topic_id != msg.topic_id {
                return !sub.sender.is_closed();
            }
            if sub.query.end_time.is_some_and(|end| msg.consensus_timestamp > end) {
                // Past the end bound: dropping the sender closes the stream.
                return false;
            }
            if !sub.query.contains(&msg.consensus_timestamp) {
                return !sub.sender.is_closed();
            }
            if self.visibility_delay.is_zero() {
                sub.sender.send(Ok(msg.clone())).is_ok()
            } else {
                delayed.push(sub.sender.clone());
                !sub.sender.is_closed()
            }
        });
        if !delayed.is_empty() {
            let msg = msg.clone();
            tokio::spawn(async move {
                tokio::time::sleep_until(visible_at).await;
                for sender in delayed {
                    let _ = sender.send(Ok(msg.clone()));
                }
            });
        }
    }
}

impl Default for InMemoryLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for InMemoryLedger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryLedger")
            .field("topic_count", &self.topic_count())
            .field("visibility_delay", &self.visibility_delay)
            .finish()
    }
}

fn create_topic(
    state: &mut LedgerState,
    signed: &SignedTransaction,
    create: &TopicCreate,
) -> Result<ConsensusTopicInfo, ReceiptStatus> {
    if create.memo.len() > MAX_MEMO_BYTES {
        return Err(ReceiptStatus::MemoTooLong);
    }
    if let Some(admin_key) = &create.admin_key {
        if !signed.is_signed_by(admin_key) {
            return Err(ReceiptStatus::InvalidSignature);
        }
    }
    check_auto_renew(&state.accounts, signed, create.auto_renew_account_id)?;

    let topic_id = TopicId::new(0, 0, state.next_topic_num);
    state.next_topic_num += 1;
    let auto_renew_period = create.auto_renew_period.unwrap_or(DEFAULT_AUTO_RENEW_PERIOD);
    Ok(ConsensusTopicInfo {
        topic_id,
        memo: create.memo.clone(),
        admin_key: create.admin_key.clone(),
        submit_key: create.submit_key.clone(),
        auto_renew_period: Some(auto_renew_period),
        auto_renew_account_id: create.auto_renew_account_id,
        expiration_time: Some(state.next_timestamp().saturating_add(auto_renew_period)),
        sequence_number: 0,
    })
}

fn update_topic(
    current: &ConsensusTopicInfo,
    signed: &SignedTransaction,
    update: &TopicUpdate,
) -> Result<ConsensusTopicInfo, ReceiptStatus> {
    authorize_admin(current, signed)?;
    if let Some(new_admin) = &update.admin_key {
        if !signed.is_signed_by(new_admin) {
            return Err(ReceiptStatus::InvalidSignature);
        }
    }
    let mut updated = current.clone();
    if let Some(memo) = &update.memo {
        if memo.len() > MAX_MEMO_BYTES {
            return Err(ReceiptStatus::MemoTooLong);
        }
        updated.memo = memo.clone();
    }
    if let Some(key) = &update.admin_key {
        updated.admin_key = Some(key.clone());
    }
    if let Some(key) = &update.submit_key {
        updated.submit_key = Some(key.clone());
    }
    if let Some(period) = update.auto_renew_period {
        updated.auto_renew_period = Some(period);
    }
    if let Some(account) = update.auto_renew_account_id {
        updated.auto_renew_account_id = Some(account);
    }
    Ok(updated)
}

fn authorize_admin(current: &ConsensusTopicInfo, signed: &SignedTransaction) -> Result<(), ReceiptStatus> {
    let admin_key = current.admin_key.as_ref().ok_or(ReceiptStatus::Unauthorized)?;
    if signed.is_signed_by(admin_key) {
        Ok(())
    } else {
        Err(ReceiptStatus::InvalidSignature)
    }
}

fn check_auto_renew(
    accounts: &HashMap<AccountId, PublicKey>,
    signed: &SignedTransaction,
    account_id: Option<AccountId>,
) -> Result<(), ReceiptStatus> {
    let Some(account_id) = account_id else {
        return Ok(());
    };
    let key = accounts
        .get(&account_id)
        .ok_or(ReceiptStatus::InvalidAutoRenewAccount)?;
    if signed.is_signed_by(key) {
        Ok(())
    } else {
        Err(ReceiptStatus::InvalidSignature)
    }
}

#[async_trait]
impl TransactionExecutor for InMemoryLedger {
    async fn execute(
        &self,
        transaction: Transaction,
        signers: &[PrivateKey],
    ) -> LedgerResult<TransactionReceipt> {
        let kind = transaction.kind();
        let signed = transaction.sign(signers)?;
        self.stats.transactions.fetch_add(1, Ordering::SeqCst);

        let mut receipt = TransactionReceipt {
            status: ReceiptStatus::Success,
            transaction_id: TransactionId::generate(self.payer),
            node_id: self.node_id,
            transaction_hash: Sha256Hasher.digest_hex(&signed.body),
            topic_id: None,
            topic_sequence_number: None,
        };

        if let Some(status) = self.take_injected_failure() {
            debug!(kind, status = %status, "injected transaction failure");
            receipt.status = status;
            return Ok(receipt);
        }

        let now = Instant::now();
        let mut state = self.inner.write().expect("lock poisoned");
        match self.apply(&mut state, &signed, now) {
            Ok(applied) => {
                if let Some((visible_at, msg)) = &applied.message {
                    self.deliver_live(&mut state, *visible_at, msg);
                }
                receipt.topic_id = applied.topic_id;
                receipt.topic_sequence_number = applied.sequence_number;
                debug!(kind, topic_id = ?applied.topic_id, "transaction reached consensus");
            }
            Err(status) => {
                debug!(kind, status = %status, "transaction failed");
                receipt.status = status;
            }
        }
        Ok(receipt)
    }
}

#[async_trait]
impl ConsensusQueryClient for InMemoryLedger {
    async fn topic_info(&self, topic_id: &TopicId) -> LedgerResult<ConsensusTopicInfo> {
        self.stats.info_queries.fetch_add(1, Ordering::SeqCst);
        let state = self.inner.read().expect("lock poisoned");
        state
            .topics
            .get(topic_id)
            .and_then(|record| record.visible(Instant::now()))
            .cloned()
            .ok_or(LedgerError::TopicNotFound(*topic_id))
    }

    async fn subscribe(&self, query: SubscriptionQuery) -> LedgerResult<Subscription> {
        self.stats.subscriptions_opened.fetch_add(1, Ordering::SeqCst);
        let now = Instant::now();
        let (tx, rx) = mpsc::unbounded_channel();
        let stream_error = self.stream_error.lock().expect("lock poisoned").clone();

        let mut state = self.inner.write().expect("lock poisoned");
        let record = state
            .topics
            .get(&query.topic_id)
            .filter(|record| record.visible(now).is_some())
            .ok_or(LedgerError::TopicNotFound(query.topic_id))?;

        let limit = query.limit.unwrap_or(usize::MAX);
        let mut sent = 0usize;
        let mut pending = Vec::new();
        for (visible_at, msg) in &record.messages {
            if !query.contains(&msg.consensus_timestamp) {
                continue;
            }
            if *visible_at > now {
                pending.push((*visible_at, msg.clone()));
                continue;
            }
            if sent == limit {
                break;
            }
            // The receiver is local, so sending cannot fail here.
            let _ = tx.send(Ok(msg.clone()));
            sent += 1;
        }

        let ended = query
            .end_time
            .is_some_and(|end| end <= ConsensusTimestamp::now());
        if let Some(error) = stream_error {
            let _ = tx.send(Err(error));
        } else if sent < limit && !ended {
            for (visible_at, msg) in pending {
                let tx = tx.clone();
                tokio::spawn(async move {
                    tokio::time::sleep_until(visible_at).await;
                    let _ = tx.send(Ok(msg));
                });
            }
            state.live.push(LiveSubscriber {
                query: query.clone(),
                sender: tx,
            });
        }

        self.stats.active_subscriptions.fetch_add(1, Ordering::SeqCst);
        let stats = Arc::clone(&self.stats);
        debug!(topic_id = %query.topic_id, replayed = sent, "subscription opened");
        Ok(Subscription::new(rx, move || {
            stats.active_subscriptions.fetch_sub(1, Ordering::SeqCst);
        }))
    }
}
