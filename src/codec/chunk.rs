//! Per-chunk framing: a fixed 12-byte header followed by padded audio and frame
//! regions.
//!
//! Padding exists purely so the audio and frame regions land on the 256-byte
//! boundaries the SRAM bank writer and the console's DMA both expect; this
//! module only computes the resulting byte ranges, it doesn't enforce alignment
//! itself (that's a property the encoder upholds and tests in `tests/` verify).

use std::ops::Range;

use super::frame::FRAME_SIZE;
use super::CodecError;

pub const CHUNK_HEADER_LEN: usize = 12;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkHeader {
    pub audio_sample_count: u32,
    pub frame_count: u16,
    pub reserved: u16,
    pub pre_padding: u16,
    pub post_padding: u16,
}

impl ChunkHeader {
    pub fn parse(bytes: &[u8]) -> Result<Self, CodecError> {
        if bytes.len() < CHUNK_HEADER_LEN {
            return Err(CodecError::TooShort {
                needed: CHUNK_HEADER_LEN,
                got: bytes.len(),
            });
        }
        Ok(Self {
            audio_sample_count: u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]),
            frame_count: u16::from_be_bytes([bytes[4], bytes[5]]),
            reserved: u16::from_be_bytes([bytes[6], bytes[7]]),
            pre_padding: u16::from_be_bytes([bytes[8], bytes[9]]),
            post_padding: u16::from_be_bytes([bytes[10], bytes[11]]),
        })
    }

    pub fn to_bytes(&self) -> [u8; CHUNK_HEADER_LEN] {
        let mut out = [0u8; CHUNK_HEADER_LEN];
        out[0..4].copy_from_slice(&self.audio_sample_count.to_be_bytes());
        out[4..6].copy_from_slice(&self.frame_count.to_be_bytes());
        out[6..8].copy_from_slice(&self.reserved.to_be_bytes());
        out[8..10].copy_from_slice(&self.pre_padding.to_be_bytes());
        out[10..12].copy_from_slice(&self.post_padding.to_be_bytes());
        out
    }
}

/// A chunk header plus the byte ranges (relative to the start of the chunk) of
/// its audio and frame regions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkInfo {
    pub header: ChunkHeader,
    pub audio_range: Range<usize>,
    pub frame_range: Range<usize>,
    pub total_len: usize,
}

/// Parse a chunk header at the start of `bytes` and compute its region layout.
/// `bytes` need only cover the header; the regions it describes may extend past
/// what's been fetched so far.
pub fn parse_chunk(bytes: &[u8]) -> Result<ChunkInfo, CodecError> {
    let header = ChunkHeader::parse(bytes)?;
    let audio_start = CHUNK_HEADER_LEN + header.pre_padding as usize;
    let audio_end = audio_start + header.audio_sample_count as usize;
    let frame_start = audio_end;
    let frame_end = frame_start + header.frame_count as usize * FRAME_SIZE;
    let total_len = frame_end + header.post_padding as usize;
    Ok(ChunkInfo {
        header,
        audio_range: audio_start..audio_end,
        frame_range: frame_start..frame_end,
        total_len,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn computes_region_layout() {
        let header = ChunkHeader {
            audio_sample_count: 1000,
            frame_count: 2,
            reserved: 0,
            pre_padding: 244,
            post_padding: 12,
        };
        let mut bytes = header.to_bytes().to_vec();
        bytes.resize(CHUNK_HEADER_LEN + 4, 0);
        let info = parse_chunk(&bytes).expect("parse");
        assert_eq!(info.audio_range, 256..1256);
        assert_eq!(info.frame_range.start, 1256);
        assert_eq!(info.frame_range.end, 1256 + 2 * FRAME_SIZE);
        assert_eq!(info.total_len, info.frame_range.end + 12);
    }

    #[test]
    fn audio_start_can_land_on_a_256_byte_boundary() {
        let header = ChunkHeader {
            audio_sample_count: 4,
            frame_count: 0,
            reserved: 0,
            pre_padding: 244,
            post_padding: 0,
        };
        let info = parse_chunk(&header.to_bytes()).expect("parse");
        assert_eq!(info.audio_range.start % 256, 0);
    }
}
