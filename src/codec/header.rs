//! The 8 KiB `VideoHeader` that opens every catalog entry's payload.
//!
//! Layout is fixed-width and big-endian throughout. The thumbnail region's
//! internal word structure belongs to the (out-of-scope) encoder; this module
//! only needs its length to land the header on exactly [`HEADER_SIZE`] bytes,
//! so it is carried as an opaque tail rather than decomposed further.

use super::CodecError;

/// Total on-disk/on-wire size of a `VideoHeader`.
pub const HEADER_SIZE: usize = 8192;

/// Fixed 16-byte magic at offset 0.
pub const MAGIC: &[u8; 16] = b"what nintendon't";

/// The only format version this crate understands.
pub const FORMAT_VERSION: u16 = 3;

pub const TITLE_LEN: usize = 128;
pub const RELATIVE_URL_LEN: usize = 128;
pub const RESERVED_LEN: usize = 696;
pub const THUMBNAIL_PALETTE_WORDS: usize = 16;

const MAGIC_OFFSET: usize = 0;
const FORMAT_VERSION_OFFSET: usize = MAGIC_OFFSET + 16;
const FRAME_RATE_OFFSET: usize = FORMAT_VERSION_OFFSET + 2;
const SAMPLE_RATE_OFFSET: usize = FRAME_RATE_OFFSET + 2;
const TOTAL_FRAMES_OFFSET: usize = SAMPLE_RATE_OFFSET + 2;
const TOTAL_SAMPLES_OFFSET: usize = TOTAL_FRAMES_OFFSET + 4;
const CHUNK_SIZE_OFFSET: usize = TOTAL_SAMPLES_OFFSET + 4;
const TOTAL_CHUNKS_OFFSET: usize = CHUNK_SIZE_OFFSET + 4;
const TITLE_OFFSET: usize = TOTAL_CHUNKS_OFFSET + 4;
const RELATIVE_URL_OFFSET: usize = TITLE_OFFSET + TITLE_LEN;
const COMPRESSION_OFFSET: usize = RELATIVE_URL_OFFSET + RELATIVE_URL_LEN;
const RESERVED_OFFSET: usize = COMPRESSION_OFFSET + 2;
const PALETTE_OFFSET: usize = RESERVED_OFFSET + RESERVED_LEN;
const THUMBNAIL_TILES_OFFSET: usize = PALETTE_OFFSET + THUMBNAIL_PALETTE_WORDS * 2;

/// Length of the opaque thumbnail tile region: whatever remains after the fixed
/// fields to bring the header to exactly [`HEADER_SIZE`] bytes.
pub const THUMBNAIL_TILE_DATA_LEN: usize = HEADER_SIZE - THUMBNAIL_TILES_OFFSET;

#[derive(Debug, Clone)]
pub struct VideoHeader {
    pub format_version: u16,
    pub frame_rate: u16,
    pub sample_rate: u16,
    pub total_frames: u32,
    pub total_samples: u32,
    pub chunk_size: u32,
    pub total_chunks: u32,
    pub title: [u8; TITLE_LEN],
    pub relative_url: [u8; RELATIVE_URL_LEN],
    pub compression: u16,
    pub thumbnail_palette: [u16; THUMBNAIL_PALETTE_WORDS],
    pub thumbnail_tile_data: Box<[u8]>,
}

/// Check only the magic and format version, without parsing the rest of the
/// header. This is the cheap pre-flight `START_VIDEO` runs before committing to
/// a full header fetch.
pub fn validate_header(bytes: &[u8]) -> Result<(), CodecError> {
    if bytes.len() < FORMAT_VERSION_OFFSET + 2 {
        return Err(CodecError::TooShort {
            needed: FORMAT_VERSION_OFFSET + 2,
            got: bytes.len(),
        });
    }
    if &bytes[MAGIC_OFFSET..MAGIC_OFFSET + 16] != MAGIC.as_slice() {
        return Err(CodecError::MalformedMagic);
    }
    let format_version = u16::from_be_bytes([bytes[FORMAT_VERSION_OFFSET], bytes[FORMAT_VERSION_OFFSET + 1]]);
    if format_version != FORMAT_VERSION {
        return Err(CodecError::UnsupportedFormat);
    }
    Ok(())
}

impl VideoHeader {
    pub fn parse(bytes: &[u8]) -> Result<Self, CodecError> {
        validate_header(bytes)?;
        if bytes.len() < HEADER_SIZE {
            return Err(CodecError::TooShort {
                needed: HEADER_SIZE,
                got: bytes.len(),
            });
        }

        let format_version = read_u16(bytes, FORMAT_VERSION_OFFSET);
        let frame_rate = read_u16(bytes, FRAME_RATE_OFFSET);
        let sample_rate = read_u16(bytes, SAMPLE_RATE_OFFSET);
        let total_frames = read_u32(bytes, TOTAL_FRAMES_OFFSET);
        let total_samples = read_u32(bytes, TOTAL_SAMPLES_OFFSET);
        let chunk_size = read_u32(bytes, CHUNK_SIZE_OFFSET);
        let total_chunks = read_u32(bytes, TOTAL_CHUNKS_OFFSET);

        let mut title = [0u8; TITLE_LEN];
        title.copy_from_slice(&bytes[TITLE_OFFSET..TITLE_OFFSET + TITLE_LEN]);

        let mut relative_url = [0u8; RELATIVE_URL_LEN];
        relative_url.copy_from_slice(&bytes[RELATIVE_URL_OFFSET..RELATIVE_URL_OFFSET + RELATIVE_URL_LEN]);

        let compression = read_u16(bytes, COMPRESSION_OFFSET);

        let mut thumbnail_palette = [0u16; THUMBNAIL_PALETTE_WORDS];
        for (i, slot) in thumbnail_palette.iter_mut().enumerate() {
            *slot = read_u16(bytes, PALETTE_OFFSET + i * 2);
        }

        let thumbnail_tile_data =
            bytes[THUMBNAIL_TILES_OFFSET..THUMBNAIL_TILES_OFFSET + THUMBNAIL_TILE_DATA_LEN].into();

        Ok(Self {
            format_version,
            frame_rate,
            sample_rate,
            total_frames,
            total_samples,
            chunk_size,
            total_chunks,
            title,
            relative_url,
            compression,
            thumbnail_palette,
            thumbnail_tile_data,
        })
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = vec![0u8; HEADER_SIZE];
        out[MAGIC_OFFSET..MAGIC_OFFSET + 16].copy_from_slice(MAGIC.as_slice());
        out[FORMAT_VERSION_OFFSET..FORMAT_VERSION_OFFSET + 2].copy_from_slice(&self.format_version.to_be_bytes());
        out[FRAME_RATE_OFFSET..FRAME_RATE_OFFSET + 2].copy_from_slice(&self.frame_rate.to_be_bytes());
        out[SAMPLE_RATE_OFFSET..SAMPLE_RATE_OFFSET + 2].copy_from_slice(&self.sample_rate.to_be_bytes());
        out[TOTAL_FRAMES_OFFSET..TOTAL_FRAMES_OFFSET + 4].copy_from_slice(&self.total_frames.to_be_bytes());
        out[TOTAL_SAMPLES_OFFSET..TOTAL_SAMPLES_OFFSET + 4].copy_from_slice(&self.total_samples.to_be_bytes());
        out[CHUNK_SIZE_OFFSET..CHUNK_SIZE_OFFSET + 4].copy_from_slice(&self.chunk_size.to_be_bytes());
        out[TOTAL_CHUNKS_OFFSET..TOTAL_CHUNKS_OFFSET + 4].copy_from_slice(&self.total_chunks.to_be_bytes());
        out[TITLE_OFFSET..TITLE_OFFSET + TITLE_LEN].copy_from_slice(&self.title);
        out[RELATIVE_URL_OFFSET..RELATIVE_URL_OFFSET + RELATIVE_URL_LEN].copy_from_slice(&self.relative_url);
        out[COMPRESSION_OFFSET..COMPRESSION_OFFSET + 2].copy_from_slice(&self.compression.to_be_bytes());
        for (i, word) in self.thumbnail_palette.iter().enumerate() {
            out[PALETTE_OFFSET + i * 2..PALETTE_OFFSET + i * 2 + 2].copy_from_slice(&word.to_be_bytes());
        }
        out[THUMBNAIL_TILES_OFFSET..THUMBNAIL_TILES_OFFSET + THUMBNAIL_TILE_DATA_LEN]
            .copy_from_slice(&self.thumbnail_tile_data);
        out
    }

    /// The title as a `&str`, stopping at the first nul byte.
    pub fn title_str(&self) -> Result<&str, CodecError> {
        nul_terminated_str(&self.title)
    }

    /// The relative URL as a `&str`, stopping at the first nul byte.
    pub fn relative_url_str(&self) -> Result<&str, CodecError> {
        nul_terminated_str(&self.relative_url)
    }
}

fn nul_terminated_str(field: &[u8]) -> Result<&str, CodecError> {
    let end = field
        .iter()
        .position(|&b| b == 0)
        .ok_or(CodecError::MissingNulTerminator)?;
    std::str::from_utf8(&field[..end]).map_err(|_| CodecError::MissingNulTerminator)
}

fn read_u16(bytes: &[u8], offset: usize) -> u16 {
    u16::from_be_bytes([bytes[offset], bytes[offset + 1]])
}

fn read_u32(bytes: &[u8], offset: usize) -> u32 {
    u32::from_be_bytes([bytes[offset], bytes[offset + 1], bytes[offset + 2], bytes[offset + 3]])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_header() -> VideoHeader {
        let mut title = [0u8; TITLE_LEN];
        title[..5].copy_from_slice(b"Title");
        let mut relative_url = [0u8; RELATIVE_URL_LEN];
        relative_url[..9].copy_from_slice(b"video.bin");
        VideoHeader {
            format_version: FORMAT_VERSION,
            frame_rate: 15,
            sample_rate: 8000,
            total_frames: 900,
            total_samples: 480_000,
            chunk_size: 131_072,
            total_chunks: 12,
            title,
            relative_url,
            compression: 1,
            thumbnail_palette: [0; THUMBNAIL_PALETTE_WORDS],
            thumbnail_tile_data: vec![0u8; THUMBNAIL_TILE_DATA_LEN].into_boxed_slice(),
        }
    }

    #[test]
    fn round_trips_through_bytes() {
        let header = sample_header();
        let bytes = header.to_bytes();
        assert_eq!(bytes.len(), HEADER_SIZE);
        let parsed = VideoHeader::parse(&bytes).expect("parse");
        assert_eq!(parsed.frame_rate, 15);
        assert_eq!(parsed.total_chunks, 12);
        assert_eq!(parsed.title_str().unwrap(), "Title");
        assert_eq!(parsed.relative_url_str().unwrap(), "video.bin");
    }

    #[test]
    fn rejects_bad_magic() {
        let mut bytes = sample_header().to_bytes();
        bytes[0] = b'X';
        assert_eq!(validate_header(&bytes), Err(CodecError::MalformedMagic));
    }

    #[test]
    fn rejects_unsupported_version() {
        let mut bytes = sample_header().to_bytes();
        bytes[FORMAT_VERSION_OFFSET..FORMAT_VERSION_OFFSET + 2].copy_from_slice(&99u16.to_be_bytes());
        assert_eq!(validate_header(&bytes), Err(CodecError::UnsupportedFormat));
    }

    #[test]
    fn rejects_missing_nul_terminator() {
        let mut header = sample_header();
        header.relative_url = [b'a'; RELATIVE_URL_LEN];
        assert_eq!(header.relative_url_str(), Err(CodecError::MissingNulTerminator));
    }
}
