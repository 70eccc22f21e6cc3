//! crates/checksums/src/strong/xxhash.rs
//!
//! Seedless xxHash wrappers. Both variants use seed 0 and emit the 64-bit
//! digest in big-endian order, the canonical xxHash byte representation.

/// Streaming XXH64 hasher.
///
/// ```
/// use checksums::strong::Xxh64;
///
/// let mut hasher = Xxh64::new();
/// hasher.update(b"chunk 1");
/// hasher.update(b"chunk 2");
/// assert_eq!(hasher.finalize(), Xxh64::digest(b"chunk 1chunk 2"));
/// ```
#[derive(Clone)]
pub struct Xxh64 {
    inner: xxhash_rust::xxh64::Xxh64,
}

impl Xxh64 {
    /// Digest length in bytes.
    pub const DIGEST_LEN: usize = 8;

    /// Creates a hasher with seed 0.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: xxhash_rust::xxh64::Xxh64::new(0),
        }
    }

    /// Feeds more input.
    pub fn update(&mut self, data: &[u8]) {
        self.inner.update(data);
    }

    /// Returns the big-endian digest.
    #[must_use]
    pub fn finalize(self) -> [u8; Self::DIGEST_LEN] {
        self.inner.digest().to_be_bytes()
    }

    /// One-shot digest of `data`.
    #[must_use]
    pub fn digest(data: &[u8]) -> [u8; Self::DIGEST_LEN] {
        xxhash_rust::xxh64::xxh64(data, 0).to_be_bytes()
    }
}

impl Default for Xxh64 {
    fn default() -> Self {
        Self::new()
    }
}

/// Streaming XXH3 (64-bit) hasher.
#[derive(Clone)]
pub struct Xxh3 {
    inner: xxhash_rust::xxh3::Xxh3,
}

impl Xxh3 {
    /// Digest length in bytes.
    pub const DIGEST_LEN: usize = 8;

    /// Creates a hasher with seed 0.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: xxhash_rust::xxh3::Xxh3::new(),
        }
    }

    /// Feeds more input.
    pub fn update(&mut self, data: &[u8]) {
        self.inner.update(data);
    }

    /// Returns the big-endian digest.
    #[must_use]
    pub fn finalize(self) -> [u8; Self::DIGEST_LEN] {
        self.inner.digest().to_be_bytes()
    }

    /// One-shot digest of `data`.
    #[must_use]
    pub fn digest(data: &[u8]) -> [u8; Self::DIGEST_LEN] {
        xxhash_rust::xxh3::xxh3_64(data).to_be_bytes()
    }
}

impl Default for Xxh3 {
    fn default() -> Self {
        Self::new()
    }
}
