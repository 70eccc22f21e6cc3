//! Rolling checksums for sliding-window chunk matching.
//!
//! The rolling checksum is a weak but fast checksum used to identify candidate
//! chunks during delta construction. Sliding the window by one byte costs
//! O(1) through [`RollingChecksumAlgorithm::rotate`] instead of recomputing the
//! whole window.
//!
//! # Algorithm
//!
//! Both variants keep two 16-bit components packed as `(b << 16) | a`, where
//! `a` starts at 1 and accumulates bytes and `b` accumulates the running
//! values of `a`:
//!
//! - [`Adler32`] truncates both components to 16 bits (wrapping arithmetic).
//!   It is cheap and is the variant written by default.
//! - [`Adler32V2`] reduces both components modulo 65521, which is the
//!   canonical Adler-32 definition.
//!
//! A checksum produced by one variant must only be rotated by the same
//! variant; the two are not interchangeable within one signature.
//!
//! # Example
//!
//! ```rust
//! use checksums::RollingChecksumAlgorithm;
//!
//! let algorithm = RollingChecksumAlgorithm::Adler32V2;
//! let data = b"Wikipedia!";
//! let window = 9;
//!
//! let first = algorithm.calculate(&data[..window]);
//! assert_eq!(first, 0x11E6_0398);
//!
//! let next = algorithm.rotate(first, data[0], data[window], window);
//! assert_eq!(next, algorithm.calculate(&data[1..=window]));
//! ```

mod adler;

pub use adler::{Adler32, Adler32V2};

use crate::error::{AlgorithmKind, UnsupportedAlgorithm};

/// Weak checksum variants understood by signatures and the delta builder.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub enum RollingChecksumAlgorithm {
    /// 16-bit wrapping Adler variant (`"Adler32"`).
    #[default]
    Adler32,
    /// Modulo-65521 Adler variant (`"Adler32V2"`).
    Adler32V2,
}

impl RollingChecksumAlgorithm {
    /// Every registered variant, in registry order.
    pub const ALL: [Self; 2] = [Self::Adler32, Self::Adler32V2];

    /// Looks up a variant by its wire name.
    ///
    /// # Errors
    ///
    /// Returns [`UnsupportedAlgorithm`] for names outside the registry.
    pub fn from_name(name: &str) -> Result<Self, UnsupportedAlgorithm> {
        Self::ALL
            .into_iter()
            .find(|algorithm| algorithm.name() == name)
            .ok_or_else(|| UnsupportedAlgorithm::new(AlgorithmKind::RollingChecksum, name))
    }

    /// Returns the wire name recorded in signature metadata.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Adler32 => Adler32::NAME,
            Self::Adler32V2 => Adler32V2::NAME,
        }
    }

    /// Computes the checksum of `window` from scratch.
    #[inline]
    #[must_use]
    pub fn calculate(self, window: &[u8]) -> u32 {
        match self {
            Self::Adler32 => Adler32::calculate(window),
            Self::Adler32V2 => Adler32V2::calculate(window),
        }
    }

    /// Slides a `window_len`-byte window forward by one byte.
    ///
    /// `outgoing` is the first byte of the old window and `incoming` the last
    /// byte of the new one. The result equals [`calculate`](Self::calculate)
    /// over the new window provided `checksum` came from this variant over a
    /// window of exactly `window_len` bytes.
    #[inline]
    #[must_use]
    pub fn rotate(self, checksum: u32, outgoing: u8, incoming: u8, window_len: usize) -> u32 {
        match self {
            Self::Adler32 => Adler32::rotate(checksum, outgoing, incoming, window_len),
            Self::Adler32V2 => Adler32V2::rotate(checksum, outgoing, incoming, window_len),
        }
    }
}

impl std::fmt::Display for RollingChecksumAlgorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl std::str::FromStr for RollingChecksumAlgorithm {
    type Err = UnsupportedAlgorithm;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s)
    }
}
