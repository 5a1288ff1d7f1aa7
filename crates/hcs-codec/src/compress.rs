use crate::error::{CodecError, CodecResult};
use crate::memo::COMPRESSION_TAG;

/// Compression capability used for file payloads.
pub trait Compressor: Send + Sync {
    /// Tag written into the file memo.
    fn algorithm(&self) -> &'static str;

    fn compress(&self, data: &[u8]) -> CodecResult<Vec<u8>>;

    fn decompress(&self, data: &[u8]) -> CodecResult<Vec<u8>>;
}

/// zstd at a fixed compression level.
#[derive(Clone, Copy, Debug)]
pub struct ZstdCompressor {
    level: i32,
}

impl ZstdCompressor {
    pub const DEFAULT_LEVEL: i32 = 3;

    pub fn new(level: i32) -> Self {
        Self { level }
    }

    pub fn level(&self) -> i32 {
        self.level
    }
}

impl Default for ZstdCompressor {
    fn default() -> Self {
        Self::new(Self::DEFAULT_LEVEL)
    }
}

impl Compressor for ZstdCompressor {
    fn algorithm(&self) -> &'static str {
        COMPRESSION_TAG
    }

    fn compress(&self, data: &[u8]) -> CodecResult<Vec<u8>> {
        zstd::encode_all(data, self.level).map_err(|e| CodecError::CompressionFailed(e.to_string()))
    }

    fn decompress(&self, data: &[u8]) -> CodecResult<Vec<u8>> {
        zstd::decode_all(data).map_err(|e| CodecError::DecompressionFailed(e.to_string()))
    }
}
