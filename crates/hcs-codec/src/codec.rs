use std::sync::Arc;

use hcs_crypto::{ContentHasher, Sha256Hasher};
use tracing::debug;

use crate::chunk::{reassemble, split_into_chunks, Chunk};
use crate::compress::{Compressor, ZstdCompressor};
use crate::error::{CodecError, CodecResult};
use crate::memo::FileMemo;

/// A payload ready to publish: the memo for its topic and the chunk messages.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EncodedFile {
    pub memo: FileMemo,
    pub chunks: Vec<Chunk>,
}

/// Encodes payloads into file chunks and verifies them on the way back.
#[derive(Clone)]
pub struct FileCodec {
    compressor: Arc<dyn Compressor>,
    hasher: Arc<dyn ContentHasher>,
    max_message_bytes: usize,
}

impl FileCodec {
    pub fn new(
        compressor: Arc<dyn Compressor>,
        hasher: Arc<dyn ContentHasher>,
        max_message_bytes: usize,
    ) -> Self {
        Self {
            compressor,
            hasher,
            max_message_bytes,
        }
    }

    /// zstd and SHA-256 with the given per-message byte limit.
    pub fn standard(max_message_bytes: usize) -> Self {
        Self::new(Arc::new(ZstdCompressor::default()), Arc::new(Sha256Hasher), max_message_bytes)
    }

    pub fn max_message_bytes(&self) -> usize {
        self.max_message_bytes
    }

    /// The memo `payload` would be published under.
    pub fn memo_for(&self, payload: &[u8]) -> FileMemo {
        FileMemo::for_payload(self.hasher.as_ref(), payload)
    }

    pub fn encode(&self, payload: &[u8]) -> CodecResult<EncodedFile> {
        let memo = self.memo_for(payload);
        let compressed = self.compressor.compress(payload)?;
        let chunks = split_into_chunks(&compressed, self.max_message_bytes)?;
        debug!(
            digest = %memo.digest(),
            size = payload.len(),
            compressed = compressed.len(),
            chunks = chunks.len(),
            "encoded file"
        );
        Ok(EncodedFile { memo, chunks })
    }

    /// Reassemble, decompress, and check the result against `memo`.
    pub fn decode(&self, memo: &FileMemo, chunks: Vec<Chunk>) -> CodecResult<Vec<u8>> {
        let compressed = reassemble(chunks)?;
        let payload = self.compressor.decompress(&compressed)?;
        let actual = self.hasher.digest(&payload);
        if actual != *memo.digest() {
            return Err(CodecError::ChecksumMismatch {
                expected: memo.digest().to_hex(),
                actual: actual.to_hex(),
            });
        }
        Ok(payload)
    }
}

impl std::fmt::Debug for FileCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileCodec")
            .field("algorithm", &self.compressor.algorithm())
            .field("max_message_bytes", &self.max_message_bytes)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunk::DATA_URI_PREFIX;
    use proptest::prelude::*;

    fn codec() -> FileCodec {
        FileCodec::standard(1024)
    }

    #[test]
    fn hello_world_roundtrip() {
        let encoded = codec().encode(b"hello world").unwrap();
        assert!(FileMemo::is_valid(&encoded.memo.to_string()));
        assert_eq!(encoded.chunks.len(), 1);
        assert_eq!(codec().decode(&encoded.memo, encoded.chunks).unwrap(), b"hello world");
    }

    #[test]
    fn checksum_mismatch_returns_no_data() {
        let encoded = codec().encode(b"original").unwrap();
        let wrong = codec().memo_for(b"something else");
        let err = codec().decode(&wrong, encoded.chunks).unwrap_err();
        assert!(matches!(err, CodecError::ChecksumMismatch { .. }));
    }

    #[test]
    fn tampered_chunk_fails_before_checksum() {
        let mut encoded = codec().encode(b"original").unwrap();
        encoded.chunks[0].content = format!("{DATA_URI_PREFIX}AAAAAAAA");
        let err = codec().decode(&encoded.memo, encoded.chunks).unwrap_err();
        assert!(matches!(err, CodecError::DecompressionFailed(_)));
    }

    #[test]
    fn large_payload_spans_many_chunks() {
        let mut state = 0x2545_f491_4f6c_dd1du64;
        let payload: Vec<u8> = (0..20_000)
            .map(|_| {
                state ^= state << 13;
                state ^= state >> 7;
                state ^= state << 17;
                (state >> 32) as u8
            })
            .collect();
        let encoded = codec().encode(&payload).unwrap();
        assert!(encoded.chunks.len() > 1);
        for chunk in &encoded.chunks {
            assert!(chunk.to_json().unwrap().len() <= 1024);
        }
        assert_eq!(codec().decode(&encoded.memo, encoded.chunks).unwrap(), payload);
    }

    proptest! {
        #[test]
        fn any_payload_roundtrips(payload in proptest::collection::vec(any::<u8>(), 0..4096), limit in 64usize..2048) {
            let codec = FileCodec::standard(limit);
            let encoded = codec.encode(&payload).unwrap();
            for chunk in &encoded.chunks {
                prop_assert!(chunk.to_json().unwrap().len() <= limit);
            }
            prop_assert_eq!(codec.decode(&encoded.memo, encoded.chunks).unwrap(), payload);
        }
    }
}
