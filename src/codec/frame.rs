//! Sizing constants for a single decoded video frame.
//!
//! A frame is a 16-colour palette followed by a fixed grid of 8x8, 4-bits-per-pixel
//! tiles covering the console's 256x224 display (32x28 tiles). Frame payloads are
//! always consumed through the RLE codec straight into an SRAM bank, so this module
//! only needs to describe their size — nothing here ever holds a decoded frame in
//! memory on its own.

/// Number of 16-bit palette entries (ABGR4444) at the head of each frame.
pub const THUMBNAIL_PALETTE_WORDS: usize = 16;

/// 8x8 tiles across a 256x224 display: 32 columns by 28 rows.
pub const TILE_COUNT: usize = 32 * 28;

/// Bytes per 4-bits-per-pixel 8x8 tile (8 * 8 * 4 bits / 8).
pub const TILE_BYTES: usize = 32;

/// Total size in bytes of one decoded frame: palette plus every tile.
pub const FRAME_SIZE: usize = THUMBNAIL_PALETTE_WORDS * 2 + TILE_COUNT * TILE_BYTES;
