//! HCS-1 style file codec.
//!
//! A file is stored on a dedicated topic as:
//! - a memo `<sha256-hex>:zstd:base64` naming the payload digest and codecs
//! - an ordered run of chunk messages `{"o": index, "c": segment}`
//!
//! Chunk 0 starts with a `data:` URI prefix. Stripping it and concatenating
//! every segment in index order yields the base64 form of the zstd-compressed
//! payload. Reassembly here is strict: indices must be exactly `0..N-1`.

pub mod chunk;
pub mod codec;
pub mod compress;
pub mod error;
pub mod memo;

pub use chunk::{reassemble, split_into_chunks, Chunk, CHUNK_ENVELOPE_OVERHEAD, DATA_URI_PREFIX};
pub use codec::{EncodedFile, FileCodec};
pub use compress::{Compressor, ZstdCompressor};
pub use error::{CodecError, CodecResult};
pub use memo::{FileMemo, COMPRESSION_TAG, ENCODING_TAG};
