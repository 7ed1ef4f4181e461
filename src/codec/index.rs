//! The fixed-size chunk index that follows the header in every catalog entry.
//!
//! The index is a flat table of big-endian byte offsets into the chunk payload
//! stream, one per chunk, terminated (and padded) with the sentinel value
//! [`INDEX_SENTINEL`] once the real entries run out.

use super::CodecError;

/// Total on-disk size of the index table.
pub const INDEX_SIZE: usize = 144_128;

/// Number of `u32` offset entries the table holds.
pub const INDEX_ENTRIES: usize = INDEX_SIZE / 4;

/// Marks an index slot as unused padding past the last real chunk.
pub const INDEX_SENTINEL: u32 = 0xFFFF_FFFF;

#[derive(Debug, Clone)]
pub struct VideoIndex {
    offsets: Vec<u32>,
}

impl VideoIndex {
    pub fn parse(bytes: &[u8]) -> Result<Self, CodecError> {
        if bytes.len() < INDEX_SIZE {
            return Err(CodecError::TooShort {
                needed: INDEX_SIZE,
                got: bytes.len(),
            });
        }
        let offsets = bytes[..INDEX_SIZE]
            .chunks_exact(4)
            .map(|c| u32::from_be_bytes([c[0], c[1], c[2], c[3]]))
            .collect();
        Ok(Self { offsets })
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(INDEX_SIZE);
        for &offset in &self.offsets {
            out.extend_from_slice(&offset.to_be_bytes());
        }
        out.resize(INDEX_SIZE, 0xFF);
        out
    }

    pub fn from_offsets(mut offsets: Vec<u32>) -> Self {
        offsets.resize(INDEX_ENTRIES, INDEX_SENTINEL);
        Self { offsets }
    }

    /// The byte offset of chunk `index` into the chunk payload stream, or `None`
    /// once `index` runs past the sentinel.
    pub fn chunk_offset(&self, index: usize) -> Option<u32> {
        let value = *self.offsets.get(index)?;
        (value != INDEX_SENTINEL).then_some(value)
    }

    /// How many real (non-sentinel) chunk entries the table carries.
    pub fn chunk_count(&self) -> usize {
        self.offsets.iter().take_while(|&&o| o != INDEX_SENTINEL).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_bytes() {
        let index = VideoIndex::from_offsets(vec![0, 4096, 9000]);
        let bytes = index.to_bytes();
        assert_eq!(bytes.len(), INDEX_SIZE);
        let parsed = VideoIndex::parse(&bytes).expect("parse");
        assert_eq!(parsed.chunk_count(), 3);
        assert_eq!(parsed.chunk_offset(0), Some(0));
        assert_eq!(parsed.chunk_offset(2), Some(9000));
        assert_eq!(parsed.chunk_offset(3), None);
    }

    #[test]
    fn rejects_short_buffers() {
        assert!(matches!(
            VideoIndex::parse(&[0u8; 16]),
            Err(CodecError::TooShort { .. })
        ));
    }
}
