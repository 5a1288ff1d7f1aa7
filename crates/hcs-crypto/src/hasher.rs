use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sha2::Digest as _;

/// A 32-byte SHA-256 digest, rendered as 64 lowercase hex characters.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Digest([u8; 32]);

impl Digest {
    /// Create from a pre-computed hash.
    pub fn from_hash(hash: [u8; 32]) -> Self {
        Self(hash)
    }

    /// The raw 32-byte hash.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Lowercase hex encoding.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parse from exactly 64 lowercase hex characters.
    ///
    /// Uppercase input is rejected: digests appear inside protocol strings
    /// that are compared byte for byte.
    pub fn from_hex(s: &str) -> Result<Self, DigestError> {
        if s.len() != 64 {
            return Err(DigestError::InvalidLength(s.len()));
        }
        if !s.bytes().all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b)) {
            return Err(DigestError::InvalidHex(s.to_string()));
        }
        let bytes = hex::decode(s).map_err(|e| DigestError::InvalidHex(e.to_string()))?;
        let mut arr = [0u8; 32];
        arr.copy_from_slice(&bytes);
        Ok(Self(arr))
    }
}

impl FromStr for Digest {
    type Err = DigestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl fmt::Debug for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Digest({})", hex::encode(&self.0[..4]))
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// Hashing capability used to seal and verify stored payloads.
pub trait ContentHasher: Send + Sync {
    /// Hash raw bytes.
    fn digest(&self, data: &[u8]) -> Digest;

    /// Hash raw bytes and return the lowercase hex form.
    fn digest_hex(&self, data: &[u8]) -> String {
        self.digest(data).to_hex()
    }

    /// Verify that data produces the expected digest.
    fn verify(&self, data: &[u8], expected: &Digest) -> bool {
        self.digest(data) == *expected
    }
}

/// Plain SHA-256 without domain separation.
///
/// File memos carry the digest of the raw payload, so any party must be
/// able to recompute it with an off-the-shelf SHA-256.
#[derive(Clone, Copy, Debug, Default)]
pub struct Sha256Hasher;

impl ContentHasher for Sha256Hasher {
    fn digest(&self, data: &[u8]) -> Digest {
        let mut hasher = sha2::Sha256::new();
        hasher.update(data);
        Digest(hasher.finalize().into())
    }
}

/// Errors from digest parsing.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum DigestError {
    #[error("invalid digest length: expected 64 hex characters, got {0}")]
    InvalidLength(usize),

    #[error("invalid digest hex: {0}")]
    InvalidHex(String),
}
