use std::fmt;
use std::str::FromStr;

use hcs_crypto::{ContentHasher, Digest};

use crate::error::{CodecError, CodecResult};

/// Compression algorithm tag carried in the memo.
pub const COMPRESSION_TAG: &str = "zstd";
/// Chunk-content encoding tag carried in the memo.
pub const ENCODING_TAG: &str = "base64";

/// The memo of a file topic: `<64 lowercase hex>:zstd:base64`.
///
/// The digest is SHA-256 of the uncompressed payload. Any other memo makes a
/// topic ineligible for file resolution.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FileMemo {
    digest: Digest,
}

impl FileMemo {
    pub fn new(digest: Digest) -> Self {
        Self { digest }
    }

    /// The memo a payload receives when stored as a file.
    pub fn for_payload(hasher: &dyn ContentHasher, payload: &[u8]) -> Self {
        Self::new(hasher.digest(payload))
    }

    /// Digest of the uncompressed payload.
    pub fn digest(&self) -> &Digest {
        &self.digest
    }

    /// Parse a topic memo, rejecting anything outside the exact grammar.
    pub fn parse(memo: &str) -> CodecResult<Self> {
        let invalid = || CodecError::InvalidMemo(memo.to_string());
        let mut parts = memo.splitn(3, ':');
        let (Some(hash), Some(algorithm), Some(encoding)) = (parts.next(), parts.next(), parts.next())
        else {
            return Err(invalid());
        };
        if algorithm != COMPRESSION_TAG || encoding != ENCODING_TAG {
            return Err(invalid());
        }
        let digest = Digest::from_hex(hash).map_err(|_| invalid())?;
        Ok(Self { digest })
    }

    /// Returns `true` if `memo` is a well-formed file memo.
    pub fn is_valid(memo: &str) -> bool {
        Self::parse(memo).is_ok()
    }

    /// Whether `payload` hashes to this memo's digest.
    pub fn matches(&self, hasher: &dyn ContentHasher, payload: &[u8]) -> bool {
        hasher.verify(payload, &self.digest)
    }
}

impl fmt::Display for FileMemo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{COMPRESSION_TAG}:{ENCODING_TAG}", self.digest.to_hex())
    }
}

impl FromStr for FileMemo {
    type Err = CodecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
