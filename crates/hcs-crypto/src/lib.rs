//! Cryptographic primitives for the HCS object layer.
//!
//! Provides the SHA-256 content hashing capability used to seal files and the
//! ed25519 keys that authorize topic and message transactions.
//!
//! All crypto operations wrap established libraries; there is no custom cryptography.

pub mod hasher;
pub mod keys;

pub use hasher::{ContentHasher, Digest, DigestError, Sha256Hasher};
pub use keys::{KeyError, PrivateKey, PublicKey, Signature};
