use std::fmt;
use std::time::Duration;

use hcs_crypto::{PrivateKey, PublicKey, Signature};
use hcs_types::{AccountId, TopicId, TransactionId};
use serde::{Deserialize, Serialize};

use crate::error::{LedgerError, LedgerResult};

/// Maximum topic memo length in bytes.
pub const MAX_MEMO_BYTES: usize = 100;

/// Maximum contents of a single topic message in bytes.
pub const MAX_MESSAGE_BYTES: usize = 1024;

/// Body of a topic-create transaction.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicCreate {
    pub memo: String,
    pub admin_key: Option<PublicKey>,
    pub submit_key: Option<PublicKey>,
    pub auto_renew_period: Option<Duration>,
    pub auto_renew_account_id: Option<AccountId>,
}

/// Body of a topic-update transaction. `None` fields are left unchanged.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicUpdate {
    pub topic_id: TopicId,
    pub memo: Option<String>,
    pub admin_key: Option<PublicKey>,
    pub submit_key: Option<PublicKey>,
    pub auto_renew_period: Option<Duration>,
    pub auto_renew_account_id: Option<AccountId>,
}

impl TopicUpdate {
    pub fn new(topic_id: TopicId) -> Self {
        Self {
            topic_id,
            memo: None,
            admin_key: None,
            submit_key: None,
            auto_renew_period: None,
            auto_renew_account_id: None,
        }
    }
}

/// The topic mutations issued by the object layer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Transaction {
    TopicCreate(TopicCreate),
    TopicUpdate(TopicUpdate),
    TopicDelete { topic_id: TopicId },
    MessageSubmit { topic_id: TopicId, message: Vec<u8> },
}

impl Transaction {
    /// Human-readable transaction type, used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::TopicCreate(_) => "topic_create",
            Self::TopicUpdate(_) => "topic_update",
            Self::TopicDelete { .. } => "topic_delete",
            Self::MessageSubmit { .. } => "message_submit",
        }
    }

    /// The topic this transaction targets, if it already exists.
    pub fn topic_id(&self) -> Option<TopicId> {
        match self {
            Self::TopicCreate(_) => None,
            Self::TopicUpdate(u) => Some(u.topic_id),
            Self::TopicDelete { topic_id } | Self::MessageSubmit { topic_id, .. } => Some(*topic_id),
        }
    }

    /// Canonical bytes that signatures cover.
    pub fn body_bytes(&self) -> LedgerResult<Vec<u8>> {
        serde_json::to_vec(self).map_err(|e| LedgerError::Serialization(e.to_string()))
    }

    /// Sign the body with every key in `signers`.
    pub fn sign(self, signers: &[PrivateKey]) -> LedgerResult<SignedTransaction> {
        let body = self.body_bytes()?;
        let signatures = signers
            .iter()
            .map(|key| (key.public_key(), key.sign(&body)))
            .collect();
        Ok(SignedTransaction {
            transaction: self,
            body,
            signatures,
        })
    }
}

/// A transaction together with the body bytes and the signatures over them.
#[derive(Clone, Debug)]
pub struct SignedTransaction {
    pub transaction: Transaction,
    pub body: Vec<u8>,
    pub signatures: Vec<(PublicKey, Signature)>,
}

impl SignedTransaction {
    /// Returns `true` if `key` produced a valid signature over the body.
    pub fn is_signed_by(&self, key: &PublicKey) -> bool {
        self.signatures
            .iter()
            .any(|(signer, sig)| signer == key && key.verify(&self.body, sig).is_ok())
    }
}

/// Outcome code of a transaction that reached consensus.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReceiptStatus {
    Success,
    InvalidSignature,
    InvalidTopicId,
    Unauthorized,
    InvalidAutoRenewAccount,
    MemoTooLong,
    InvalidTopicMessage,
    MessageSizeTooLarge,
}

impl ReceiptStatus {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "SUCCESS",
            Self::InvalidSignature => "INVALID_SIGNATURE",
            Self::InvalidTopicId => "INVALID_TOPIC_ID",
            Self::Unauthorized => "UNAUTHORIZED",
            Self::InvalidAutoRenewAccount => "INVALID_AUTORENEW_ACCOUNT",
            Self::MemoTooLong => "MEMO_TOO_LONG",
            Self::InvalidTopicMessage => "INVALID_TOPIC_MESSAGE",
            Self::MessageSizeTooLarge => "MESSAGE_SIZE_TOO_LARGE",
        }
    }
}

impl fmt::Display for ReceiptStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Receipt returned once a transaction reached consensus.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionReceipt {
    pub status: ReceiptStatus,
    pub transaction_id: TransactionId,
    pub node_id: AccountId,
    /// Hex-encoded hash of the signed body.
    pub transaction_hash: String,
    /// Set by a successful topic create.
    pub topic_id: Option<TopicId>,
    /// Set by a successful message submit.
    pub topic_sequence_number: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn submit() -> Transaction {
        Transaction::MessageSubmit {
            topic_id: TopicId::new(0, 0, 5),
            message: b"hi".to_vec(),
        }
    }

    #[test]
    fn signatures_cover_the_body() {
        let key = PrivateKey::generate();
        let signed = submit().sign(std::slice::from_ref(&key)).unwrap();
        assert!(signed.is_signed_by(&key.public_key()));
        assert!(!signed.is_signed_by(&PrivateKey::generate().public_key()));
    }

    #[test]
    fn tampered_body_fails_verification() {
        let key = PrivateKey::generate();
        let mut signed = submit().sign(std::slice::from_ref(&key)).unwrap();
        signed.body.push(b' ');
        assert!(!signed.is_signed_by(&key.public_key()));
    }

    #[test]
    fn unsigned_transaction_has_no_signers() {
        let signed = submit().sign(&[]).unwrap();
        assert!(signed.signatures.is_empty());
    }

    #[test]
    fn kind_and_target() {
        assert_eq!(submit().kind(), "message_submit");
        assert_eq!(submit().topic_id(), Some(TopicId::new(0, 0, 5)));
        assert_eq!(Transaction::TopicCreate(TopicCreate::default()).topic_id(), None);
    }

    #[test]
    fn status_display() {
        assert_eq!(ReceiptStatus::Success.to_string(), "SUCCESS");
        assert_eq!(ReceiptStatus::InvalidSignature.to_string(), "INVALID_SIGNATURE");
        assert!(!ReceiptStatus::Unauthorized.is_success());
    }
}
