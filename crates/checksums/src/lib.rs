#![cfg_attr(docsrs, feature(doc_cfg))]
#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! # Overview
//!
//! `checksums` hosts the two checksum families used by rdelta:
//!
//! - [`RollingChecksumAlgorithm`]: the weak, O(1)-rotatable checksum used to
//!   find candidate chunks while sliding a window over the target file.
//! - [`HashAlgorithm`]: the strong hash used to confirm a candidate and to
//!   verify whole files.
//!
//! Both are closed enums. Algorithms are selected by their wire name exactly
//! once, when a signature or delta header is parsed or when a builder is
//! configured, and the resolved value travels with the operation from there.
//!
//! # Examples
//!
//! ```
//! use checksums::{HashAlgorithm, RollingChecksumAlgorithm};
//!
//! let rolling = RollingChecksumAlgorithm::from_name("Adler32").unwrap();
//! let strong = HashAlgorithm::from_name("XXH64").unwrap();
//!
//! let sum = rolling.calculate(b"abcd");
//! let rotated = rolling.rotate(sum, b'a', b'e', 4);
//! assert_eq!(rotated, rolling.calculate(b"bcde"));
//! assert_eq!(strong.compute(b"bcde").len(), strong.hash_len());
//! ```

mod error;
mod rolling;
pub mod strong;

pub use error::{AlgorithmKind, UnsupportedAlgorithm};
pub use rolling::{Adler32, Adler32V2, RollingChecksumAlgorithm};
pub use strong::{HashAlgorithm, StrongHasher};
