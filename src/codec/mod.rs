//! The binary video container: header, chunk index, chunk framing, and the RLE codec.
//!
//! Every operation here is a pure function over byte ranges — no I/O, no SRAM, no
//! HTTP. That keeps the container format testable in complete isolation from the
//! streamer/player state machines that drive it.

pub mod chunk;
pub mod frame;
pub mod header;
pub mod index;
pub mod rle;

pub use chunk::{parse_chunk, ChunkHeader, ChunkInfo, CHUNK_HEADER_LEN};
pub use frame::{FRAME_SIZE, TILE_BYTES, TILE_COUNT, THUMBNAIL_PALETTE_WORDS};
pub use header::{validate_header, VideoHeader, HEADER_SIZE};
pub use index::{VideoIndex, INDEX_ENTRIES, INDEX_SENTINEL, INDEX_SIZE};
pub use rle::{rle_encode, ByteSink, RleDecoder};

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CodecError {
    #[error("malformed magic bytes in video header")]
    MalformedMagic,

    #[error("unsupported format version")]
    UnsupportedFormat,

    #[error("corrupt RLE stream: reserved control byte 0x{0:02X}")]
    CodecCorrupt(u8),

    #[error("string field has no nul terminator")]
    MissingNulTerminator,

    #[error("buffer too short: need at least {needed} bytes, got {got}")]
    TooShort { needed: usize, got: usize },
}
