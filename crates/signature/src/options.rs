//! crates/signature/src/options.rs
//!
//! Validated signature configuration.

use std::fmt;
use std::sync::Arc;

use checksums::{HashAlgorithm, RollingChecksumAlgorithm};

use crate::error::SignatureError;
use crate::progress::{ProgressSink, SharedProgress};

/// Smallest accepted chunk size.
pub const MIN_CHUNK_SIZE: usize = 128;
/// Largest accepted chunk size. Leaves headroom below the `i16` record field.
pub const MAX_CHUNK_SIZE: usize = 31 * 1024;
/// Chunk size used when none is configured.
pub const DEFAULT_CHUNK_SIZE: usize = 2048;
/// Buffer used when reading the basis.
pub const DEFAULT_READ_BUFFER_SIZE: usize = 64 * 1024;

/// A chunk size known to lie in `[MIN_CHUNK_SIZE, MAX_CHUNK_SIZE]`.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct ChunkSize(u16);

impl ChunkSize {
    /// Validates `size`.
    pub fn new(size: usize) -> Result<Self, SignatureError> {
        if (MIN_CHUNK_SIZE..=MAX_CHUNK_SIZE).contains(&size) {
            Ok(Self(size as u16))
        } else {
            Err(SignatureError::InvalidChunkSize {
                size,
                min: MIN_CHUNK_SIZE,
                max: MAX_CHUNK_SIZE,
            })
        }
    }

    /// Size in bytes.
    #[inline]
    #[must_use]
    pub const fn get(self) -> usize {
        self.0 as usize
    }
}

impl Default for ChunkSize {
    fn default() -> Self {
        Self(DEFAULT_CHUNK_SIZE as u16)
    }
}

impl fmt::Display for ChunkSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Configuration for [`SignatureBuilder`](crate::SignatureBuilder).
#[derive(Clone)]
pub struct SignatureOptions {
    chunk_size: ChunkSize,
    rolling_checksum_algorithm: RollingChecksumAlgorithm,
    chunk_hash_algorithm: HashAlgorithm,
    file_hash_algorithm: HashAlgorithm,
    read_buffer_size: usize,
    progress: Option<SharedProgress>,
}

impl Default for SignatureOptions {
    fn default() -> Self {
        Self {
            chunk_size: ChunkSize::default(),
            rolling_checksum_algorithm: RollingChecksumAlgorithm::default(),
            chunk_hash_algorithm: HashAlgorithm::Xxh64,
            file_hash_algorithm: HashAlgorithm::Md5,
            read_buffer_size: DEFAULT_READ_BUFFER_SIZE,
            progress: None,
        }
    }
}

impl SignatureOptions {
    /// Sets the chunk size, rejecting values outside the supported range.
    pub fn with_chunk_size(mut self, size: usize) -> Result<Self, SignatureError> {
        self.chunk_size = ChunkSize::new(size)?;
        Ok(self)
    }

    /// Sets the rolling checksum variant.
    #[must_use]
    pub fn with_rolling_checksum(mut self, algorithm: RollingChecksumAlgorithm) -> Self {
        self.rolling_checksum_algorithm = algorithm;
        self
    }

    /// Sets the strong hash stored per chunk.
    #[must_use]
    pub fn with_chunk_hash(mut self, algorithm: HashAlgorithm) -> Self {
        self.chunk_hash_algorithm = algorithm;
        self
    }

    /// Sets the whole-basis hash algorithm.
    #[must_use]
    pub fn with_file_hash(mut self, algorithm: HashAlgorithm) -> Self {
        self.file_hash_algorithm = algorithm;
        self
    }

    /// Sets the basis read buffer size. Values below one chunk are raised to
    /// one chunk.
    #[must_use]
    pub fn with_read_buffer_size(mut self, size: usize) -> Self {
        self.read_buffer_size = size;
        self
    }

    /// Installs a progress sink.
    #[must_use]
    pub fn with_progress(mut self, sink: impl ProgressSink + 'static) -> Self {
        self.progress = Some(Arc::new(sink));
        self
    }

    /// Configured chunk size.
    #[must_use]
    pub const fn chunk_size(&self) -> ChunkSize {
        self.chunk_size
    }

    /// Configured rolling checksum variant.
    #[must_use]
    pub const fn rolling_checksum_algorithm(&self) -> RollingChecksumAlgorithm {
        self.rolling_checksum_algorithm
    }

    /// Configured chunk hash.
    #[must_use]
    pub const fn chunk_hash_algorithm(&self) -> HashAlgorithm {
        self.chunk_hash_algorithm
    }

    /// Configured whole-basis hash.
    #[must_use]
    pub const fn file_hash_algorithm(&self) -> HashAlgorithm {
        self.file_hash_algorithm
    }

    /// Effective read buffer size.
    #[must_use]
    pub fn read_buffer_size(&self) -> usize {
        self.read_buffer_size.max(self.chunk_size.get())
    }

    /// Installed progress sink, if any.
    #[must_use]
    pub fn progress(&self) -> Option<&dyn ProgressSink> {
        self.progress.as_deref()
    }
}

impl fmt::Debug for SignatureOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignatureOptions")
            .field("chunk_size", &self.chunk_size)
            .field("rolling_checksum_algorithm", &self.rolling_checksum_algorithm)
            .field("chunk_hash_algorithm", &self.chunk_hash_algorithm)
            .field("file_hash_algorithm", &self.file_hash_algorithm)
            .field("read_buffer_size", &self.read_buffer_size)
            .field("progress", &self.progress.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounds_are_inclusive() {
        assert_eq!(ChunkSize::new(128).expect("min").get(), 128);
        assert_eq!(ChunkSize::new(31_744).expect("max").get(), 31_744);
    }

    #[test]
    fn out_of_range_sizes_are_rejected() {
        for size in [0, 127, 31_745, 65_536] {
            let err = ChunkSize::new(size).expect_err("out of range");
            assert!(matches!(err, SignatureError::InvalidChunkSize { size: s, .. } if s == size));
        }
    }

    #[test]
    fn defaults() {
        let options = SignatureOptions::default();
        assert_eq!(options.chunk_size().get(), 2048);
        assert_eq!(options.rolling_checksum_algorithm(), RollingChecksumAlgorithm::Adler32);
        assert_eq!(options.chunk_hash_algorithm(), HashAlgorithm::Xxh64);
        assert_eq!(options.file_hash_algorithm(), HashAlgorithm::Md5);
        assert!(options.progress().is_none());
    }

    #[test]
    fn read_buffer_never_smaller_than_a_chunk() {
        let options = SignatureOptions::default()
            .with_chunk_size(31_744)
            .expect("valid")
            .with_read_buffer_size(1024);
        assert_eq!(options.read_buffer_size(), 31_744);
    }
}
