//! crates/signature/src/chunk.rs
//!
//! Fingerprint of a single basis chunk.

use protocol::ChunkRecord;

/// Describes one chunk of the basis.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ChunkSignature {
    start_offset: u64,
    length: u16,
    rolling_checksum: u32,
    hash: Vec<u8>,
}

impl ChunkSignature {
    /// Creates a chunk descriptor from its components.
    #[must_use]
    pub const fn from_raw_parts(
        start_offset: u64,
        length: u16,
        rolling_checksum: u32,
        hash: Vec<u8>,
    ) -> Self {
        Self {
            start_offset,
            length,
            rolling_checksum,
            hash,
        }
    }

    pub(crate) fn from_record(start_offset: u64, record: ChunkRecord) -> Self {
        Self::from_raw_parts(start_offset, record.length, record.rolling_checksum, record.hash)
    }

    /// Offset of the first byte of the chunk in the basis.
    #[inline]
    #[must_use]
    pub const fn start_offset(&self) -> u64 {
        self.start_offset
    }

    /// Chunk length in bytes.
    #[inline]
    #[must_use]
    pub const fn length(&self) -> u16 {
        self.length
    }

    /// Offset one past the last byte of the chunk.
    #[inline]
    #[must_use]
    pub const fn end_offset(&self) -> u64 {
        self.start_offset + self.length as u64
    }

    /// Rolling checksum of the chunk.
    #[inline]
    #[must_use]
    pub const fn rolling_checksum(&self) -> u32 {
        self.rolling_checksum
    }

    /// Strong hash of the chunk.
    #[inline]
    #[must_use]
    pub fn hash(&self) -> &[u8] {
        &self.hash
    }

    /// Wire record for this chunk. The offset is implied by position.
    #[must_use]
    pub fn to_record(&self) -> ChunkRecord {
        ChunkRecord {
            length: self.length,
            rolling_checksum: self.rolling_checksum,
            hash: self.hash.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offsets_span_the_chunk() {
        let chunk = ChunkSignature::from_raw_parts(4096, 2048, 0x1234, vec![1, 2, 3]);
        assert_eq!(chunk.start_offset(), 4096);
        assert_eq!(chunk.end_offset(), 6144);
        assert_eq!(chunk.hash(), &[1, 2, 3]);
    }

    #[test]
    fn record_drops_the_offset() {
        let chunk = ChunkSignature::from_raw_parts(10, 5, 99, vec![9]);
        let record = chunk.to_record();
        assert_eq!(ChunkSignature::from_record(10, record), chunk);
    }
}
