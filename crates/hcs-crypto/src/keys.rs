use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// DER prefix of an ed25519 `SubjectPublicKeyInfo`.
const ED25519_PUBLIC_DER_PREFIX: &str = "302a300506032b6570032100";
/// DER prefix of an ed25519 PKCS#8 `PrivateKeyInfo`.
const ED25519_PRIVATE_DER_PREFIX: &str = "302e020100300506032b657004220420";

/// Ed25519 private key that authorizes topic and message transactions.
#[derive(Clone)]
pub struct PrivateKey(ed25519_dalek::SigningKey);

/// Ed25519 public key as stored on a topic.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct PublicKey(ed25519_dalek::VerifyingKey);

/// Ed25519 signature.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signature(#[serde(with = "signature_serde")] ed25519_dalek::Signature);

impl PrivateKey {
    /// Generate a new random key.
    pub fn generate() -> Self {
        let mut csprng = rand::thread_rng();
        Self(ed25519_dalek::SigningKey::generate(&mut csprng))
    }

    /// Create from a raw 32-byte seed.
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(ed25519_dalek::SigningKey::from_bytes(&bytes))
    }

    /// The corresponding public key.
    pub fn public_key(&self) -> PublicKey {
        PublicKey(self.0.verifying_key())
    }

    /// Sign a message.
    pub fn sign(&self, message: &[u8]) -> Signature {
        use ed25519_dalek::Signer;
        Signature(self.0.sign(message))
    }

    /// Raw seed bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        self.0.as_bytes()
    }

    /// DER-encoded hex (PKCS#8).
    pub fn to_der_hex(&self) -> String {
        format!("{ED25519_PRIVATE_DER_PREFIX}{}", hex::encode(self.0.as_bytes()))
    }

    /// Parse from DER hex or from a raw 64-character hex seed.
    pub fn from_string(s: &str) -> Result<Self, KeyError> {
        let raw = strip_der(s.trim(), ED25519_PRIVATE_DER_PREFIX)?;
        Ok(Self::from_bytes(raw))
    }
}

impl PublicKey {
    /// Verify a signature on a message.
    pub fn verify(&self, message: &[u8], signature: &Signature) -> Result<(), KeyError> {
        use ed25519_dalek::Verifier;
        self.0
            .verify(message, &signature.0)
            .map_err(|_| KeyError::InvalidSignature)
    }

    /// Raw public key bytes.
    pub fn as_bytes(&self) -> [u8; 32] {
        self.0.to_bytes()
    }

    /// Create from a raw 32-byte public key.
    pub fn from_bytes(bytes: [u8; 32]) -> Result<Self, KeyError> {
        let key = ed25519_dalek::VerifyingKey::from_bytes(&bytes)
            .map_err(|_| KeyError::InvalidKey("not a valid ed25519 point".into()))?;
        Ok(Self(key))
    }

    /// Raw key hex without the DER prefix.
    pub fn to_raw_hex(&self) -> String {
        hex::encode(self.0.to_bytes())
    }

    /// The canonical string form shared by both read transports: DER hex.
    pub fn to_canonical_string(&self) -> String {
        format!("{ED25519_PUBLIC_DER_PREFIX}{}", self.to_raw_hex())
    }

    /// Canonical form of a raw ed25519 key given as hex, as the mirror node
    /// reports it.
    pub fn canonicalize_raw_hex(raw: &str) -> Result<String, KeyError> {
        Ok(Self::from_string(raw)?.to_canonical_string())
    }

    /// Parse from DER hex or from raw 64-character hex.
    pub fn from_string(s: &str) -> Result<Self, KeyError> {
        let raw = strip_der(s.trim(), ED25519_PUBLIC_DER_PREFIX)?;
        Self::from_bytes(raw)
    }
}

fn strip_der(s: &str, prefix: &str) -> Result<[u8; 32], KeyError> {
    let lower = s.to_ascii_lowercase();
    let body = match lower.strip_prefix(prefix) {
        Some(rest) if rest.len() == 64 => rest,
        _ => lower.as_str(),
    };
    let bytes = hex::decode(body).map_err(|e| KeyError::InvalidKey(e.to_string()))?;
    bytes
        .try_into()
        .map_err(|b: Vec<u8>| KeyError::InvalidKey(format!("expected 32 key bytes, got {}", b.len())))
}

impl FromStr for PublicKey {
    type Err = KeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_string(s)
    }
}

impl FromStr for PrivateKey {
    type Err = KeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_string(s)
    }
}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_canonical_string())
    }
}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PrivateKey(<redacted>)")
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey({})", self.to_raw_hex())
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Signature({}...)", hex::encode(&self.0.to_bytes()[..8]))
    }
}

impl Serialize for PublicKey {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_canonical_string())
    }
}

impl<'de> Deserialize<'de> for PublicKey {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_string(&s).map_err(serde::de::Error::custom)
    }
}

/// Errors from key and signature operations.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum KeyError {
    #[error("invalid signature")]
    InvalidSignature,
    #[error("invalid key: {0}")]
    InvalidKey(String),
}

mod signature_serde {
    use serde::{self, Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(sig: &ed25519_dalek::Signature, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_bytes(&sig.to_bytes())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<ed25519_dalek::Signature, D::Error>
    where
        D: Deserializer<'de>,
    {
        let bytes: Vec<u8> = Vec::deserialize(deserializer)?;
        let arr: [u8; 64] = bytes
            .try_into()
            .map_err(|_| serde::de::Error::custom("expected 64-byte signature"))?;
        Ok(ed25519_dalek::Signature::from_bytes(&arr))
    }
}
