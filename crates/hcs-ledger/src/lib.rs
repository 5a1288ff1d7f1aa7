//! Ledger collaborator boundaries for the HCS object layer.
//!
//! The object layer never builds or gossips ledger transactions itself. This
//! crate defines what it needs from the outside world:
//! - [`Transaction`] -- the four topic mutations the layer issues
//! - [`TransactionExecutor`] -- sign, submit, and await a receipt
//! - [`ConsensusQueryClient`] -- direct topic queries and message subscriptions
//! - [`Subscription`] -- a scoped message stream released on drop
//! - [`InMemoryLedger`] -- a single-process ledger for tests and embedding
//! - [`ReadOnlyExecutor`] -- refuses every mutation, for read-only clients

pub mod error;
pub mod memory;
pub mod readonly;
pub mod subscription;
pub mod traits;
pub mod transaction;

pub use error::{LedgerError, LedgerResult};
pub use memory::InMemoryLedger;
pub use readonly::ReadOnlyExecutor;
pub use subscription::{Subscription, SubscriptionQuery};
pub use traits::{ConsensusQueryClient, ConsensusTopicInfo, TransactionExecutor};
pub use transaction::{
    ReceiptStatus, SignedTransaction, TopicCreate, TopicUpdate, Transaction, TransactionReceipt,
    MAX_MEMO_BYTES, MAX_MESSAGE_BYTES,
};
