use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::{Deserialize, Serialize};

use crate::error::{CodecError, CodecResult};

/// Prefix carried by chunk 0 in front of the first base64 segment.
pub const DATA_URI_PREFIX: &str = "data:application/json;base64,";

/// Serialized bytes of a chunk beyond its content: `{"o":`, a `u64` of up to
/// 20 digits, `,"c":"` and `"}`.
pub const CHUNK_ENVELOPE_OVERHEAD: usize = 5 + 20 + 6 + 2;

/// One chunk message: `{"o": <index>, "c": <segment>}`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    #[serde(rename = "o")]
    pub index: u64,
    #[serde(rename = "c")]
    pub content: String,
}

impl Chunk {
    pub fn new(index: u64, content: impl Into<String>) -> Self {
        Self {
            index,
            content: content.into(),
        }
    }

    /// Message contents for this chunk.
    pub fn to_json(&self) -> CodecResult<Vec<u8>> {
        serde_json::to_vec(self).map_err(|e| CodecError::MalformedChunk(e.to_string()))
    }

    /// Parse a chunk from message contents.
    pub fn from_json(bytes: &[u8]) -> CodecResult<Self> {
        serde_json::from_slice(bytes).map_err(|e| CodecError::MalformedChunk(e.to_string()))
    }
}

/// Base64-encode `compressed` and split it into chunks whose serialized form
/// fits in `max_message_bytes`. Always yields at least one chunk.
pub fn split_into_chunks(compressed: &[u8], max_message_bytes: usize) -> CodecResult<Vec<Chunk>> {
    let capacity = max_message_bytes
        .checked_sub(CHUNK_ENVELOPE_OVERHEAD)
        .filter(|c| *c > 0)
        .ok_or(CodecError::ChunkLimitTooSmall(max_message_bytes))?;

    let stream = format!("{DATA_URI_PREFIX}{}", STANDARD.encode(compressed));
    // Base64 and the prefix are ASCII, so byte offsets are char boundaries.
    let chunks = stream
        .as_bytes()
        .chunks(capacity)
        .enumerate()
        .map(|(i, segment)| Chunk::new(i as u64, String::from_utf8_lossy(segment)))
        .collect();
    Ok(chunks)
}

/// Rebuild the compressed bytes from a file topic's chunks.
///
/// Chunks may arrive in any order. Their indices must be exactly `0..N-1`:
/// gaps and duplicates are rejected before anything is decoded.
pub fn reassemble(mut chunks: Vec<Chunk>) -> CodecResult<Vec<u8>> {
    if chunks.is_empty() {
        return Err(CodecError::NoChunks);
    }
    chunks.sort_by_key(|c| c.index);
    for (expected, chunk) in (0u64..).zip(&chunks) {
        if chunk.index != expected {
            return Err(CodecError::ChunkSequence {
                expected,
                found: chunk.index,
            });
        }
    }

    let mut encoded = String::with_capacity(chunks.iter().map(|c| c.content.len()).sum());
    for chunk in &chunks {
        if chunk.index == 0 {
            let body = chunk
                .content
                .strip_prefix(DATA_URI_PREFIX)
                .ok_or(CodecError::MissingPrefix)?;
            encoded.push_str(body);
        } else {
            encoded.push_str(&chunk.content);
        }
    }
    Ok(STANDARD.decode(encoded)?)
}
