//! crates/checksums/src/strong/mod.rs
//!
//! Strong hashes used to confirm chunk matches and to verify whole files.
//!
//! [`HashAlgorithm`] is the registry of hash names that may appear in a
//! signature or delta header. [`StrongHasher`] is its streaming counterpart,
//! used when the input arrives in pieces (a file read in blocks, or patch
//! output hashed while it is written).

mod xxhash;

use std::io::{self, Read};

use digest::Digest;

use crate::error::{AlgorithmKind, UnsupportedAlgorithm};

pub use xxhash::{Xxh3, Xxh64};

/// Block size used by [`HashAlgorithm::compute_reader`].
pub const READ_BLOCK_SIZE: usize = 64 * 1024;

/// Strong hash algorithms understood by signatures and deltas.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub enum HashAlgorithm {
    /// 64-bit xxHash, seed 0 (`"XXH64"`).
    #[default]
    Xxh64,
    /// 64-bit XXH3, seed 0 (`"XXH3"`).
    Xxh3,
    /// MD5 (`"MD5"`).
    Md5,
    /// SHA-1 (`"SHA1"`).
    Sha1,
}

impl HashAlgorithm {
    /// Every registered algorithm, in registry order.
    pub const ALL: [Self; 4] = [Self::Xxh64, Self::Xxh3, Self::Md5, Self::Sha1];

    /// Looks up an algorithm by its wire name.
    ///
    /// # Errors
    ///
    /// Returns [`UnsupportedAlgorithm`] for names outside the registry.
    pub fn from_name(name: &str) -> Result<Self, UnsupportedAlgorithm> {
        Self::ALL
            .into_iter()
            .find(|algorithm| algorithm.name() == name)
            .ok_or_else(|| UnsupportedAlgorithm::new(AlgorithmKind::Hash, name))
    }

    /// Returns the wire name recorded in headers.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Xxh64 => "XXH64",
            Self::Xxh3 => "XXH3",
            Self::Md5 => "MD5",
            Self::Sha1 => "SHA1",
        }
    }

    /// Digest length in bytes.
    #[must_use]
    pub const fn hash_len(self) -> usize {
        match self {
            Self::Xxh64 | Self::Xxh3 => 8,
            Self::Md5 => 16,
            Self::Sha1 => 20,
        }
    }

    /// Hashes `data` in one shot.
    #[must_use]
    pub fn compute(self, data: &[u8]) -> Vec<u8> {
        match self {
            Self::Xxh64 => Xxh64::digest(data).to_vec(),
            Self::Xxh3 => Xxh3::digest(data).to_vec(),
            Self::Md5 => md5::Md5::digest(data).to_vec(),
            Self::Sha1 => sha1::Sha1::digest(data).to_vec(),
        }
    }

    /// Starts a streaming hash.
    #[must_use]
    pub fn hasher(self) -> StrongHasher {
        match self {
            Self::Xxh64 => StrongHasher::Xxh64(Xxh64::new()),
            Self::Xxh3 => StrongHasher::Xxh3(Box::new(Xxh3::new())),
            Self::Md5 => StrongHasher::Md5(md5::Md5::new()),
            Self::Sha1 => StrongHasher::Sha1(sha1::Sha1::new()),
        }
    }

    /// Hashes everything `reader` yields until end of stream.
    ///
    /// `on_block` is invoked with the running byte count after every read,
    /// which lets callers report progress without wrapping the reader.
    pub fn compute_reader<R, F>(self, reader: &mut R, mut on_block: F) -> io::Result<Vec<u8>>
    where
        R: Read + ?Sized,
        F: FnMut(u64),
    {
        let mut hasher = self.hasher();
        let mut buffer = vec![0u8; READ_BLOCK_SIZE];
        let mut consumed = 0u64;
        loop {
            let read = match reader.read(&mut buffer) {
                Ok(0) => break,
                Ok(read) => read,
                Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
                Err(err) => return Err(err),
            };
            hasher.update(&buffer[..read]);
            consumed += read as u64;
            on_block(consumed);
        }
        Ok(hasher.finalize())
    }
}

impl std::fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl std::str::FromStr for HashAlgorithm {
    type Err = UnsupportedAlgorithm;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s)
    }
}

/// Streaming state for one [`HashAlgorithm`].
#[derive(Clone)]
pub enum StrongHasher {
    /// XXH64 state.
    Xxh64(Xxh64),
    /// XXH3 state (boxed, the streaming buffer is large).
    Xxh3(Box<Xxh3>),
    /// MD5 state.
    Md5(md5::Md5),
    /// SHA-1 state.
    Sha1(sha1::Sha1),
}

impl StrongHasher {
    /// Algorithm this state belongs to.
    #[must_use]
    pub const fn algorithm(&self) -> HashAlgorithm {
        match self {
            Self::Xxh64(_) => HashAlgorithm::Xxh64,
            Self::Xxh3(_) => HashAlgorithm::Xxh3,
            Self::Md5(_) => HashAlgorithm::Md5,
            Self::Sha1(_) => HashAlgorithm::Sha1,
        }
    }

    /// Feeds more input.
    pub fn update(&mut self, data: &[u8]) {
        match self {
            Self::Xxh64(state) => state.update(data),
            Self::Xxh3(state) => state.update(data),
            Self::Md5(state) => Digest::update(state, data),
            Self::Sha1(state) => Digest::update(state, data),
        }
    }

    /// Consumes the state and returns the digest.
    #[must_use]
    pub fn finalize(self) -> Vec<u8> {
        match self {
            Self::Xxh64(state) => state.finalize().to_vec(),
            Self::Xxh3(state) => state.finalize().to_vec(),
            Self::Md5(state) => state.finalize().to_vec(),
            Self::Sha1(state) => state.finalize().to_vec(),
        }
    }
}

impl std::fmt::Debug for StrongHasher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("StrongHasher").field(&self.algorithm()).finish()
    }
}

impl io::Write for StrongHasher {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.update(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
