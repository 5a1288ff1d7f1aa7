//! Object layer over a consensus ledger's topic service.
//!
//! Topics become addressable objects with cached metadata, message history
//! becomes an ordered, deduplicated list, and arbitrary byte payloads become
//! immutable, checksummed files spread over a dedicated topic.
//!
//! [`HcsClient`] is the entry point. It owns:
//! - [`TopicService`] -- create, update, delete, and read topics
//! - [`MessageService`] -- submit messages and read reconciled history
//! - [`FileService`] -- store and resolve chunked files
//!
//! Writes go through a [`hcs_ledger::TransactionExecutor`]; reads go through
//! one [`hcs_transport::ReadTransport`] chosen when the client is built.
//! Ledger writes become readable only after a delay, so every write accepts
//! an optional bounded [`VisibilityWaiter`] poll.

pub mod client;
pub mod config;
pub mod error;
pub mod file;
pub mod message;
pub mod topic;
pub mod wait;

#[cfg(test)]
mod testkit;

pub use client::{HcsClient, HcsClientBuilder};
pub use config::{CacheConfig, ClientConfig, VisibilityConfig};
pub use error::{SdkError, SdkResult};
pub use file::{FileService, SubmitFileOptions};
pub use message::{MessageFilter, MessageService, MessageSubmission, SubmitMessageOptions};
pub use topic::{CreateTopicOptions, TopicService, UpdateTopicOptions};
pub use wait::{VisibilityWaiter, WaitOptions};

// Re-export key types
pub use hcs_codec::FileMemo;
pub use hcs_crypto::{PrivateKey, PublicKey};
pub use hcs_types::{AccountId, ConsensusTimestamp, TopicId, TopicInfo, TopicMessage};
