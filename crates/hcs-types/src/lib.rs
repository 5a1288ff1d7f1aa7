//! Foundation types for the HCS object layer.
//!
//! This crate provides the identifier, timestamp, and record types shared by
//! every other crate in the workspace.
//!
//! # Key Types
//!
//! - [`TopicId`] / [`AccountId`] -- `shard.realm.num` ledger entity identifiers
//! - [`ConsensusTimestamp`] -- nanosecond-precision consensus time
//! - [`TransactionId`] -- payer account plus valid-start timestamp
//! - [`TopicInfo`] -- canonical, transport-independent topic metadata
//! - [`TopicMessage`] -- one consensus-ordered message on a topic

pub mod entity;
pub mod error;
pub mod message;
pub mod timestamp;
pub mod topic;
pub mod transaction;

pub use entity::{AccountId, EntityId, TopicId};
pub use error::TypeError;
pub use message::{dedup_and_sort, TopicMessage};
pub use timestamp::ConsensusTimestamp;
pub use topic::TopicInfo;
pub use transaction::TransactionId;
