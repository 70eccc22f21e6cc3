#![cfg_attr(docsrs, feature(doc_cfg))]
#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! # Overview
//!
//! `protocol` owns the byte-exact encodings of rdelta signatures and deltas.
//! Both streams share one outline:
//!
//! ```text
//! [magic][version:1][metadata][record]*
//! ```
//!
//! and both exist in two dialects, told apart only by their magic:
//!
//! | stream    | current     | legacy      |
//! |-----------|-------------|-------------|
//! | signature | `FRSNCSG`   | `OCTOSIG`   |
//! | delta     | `FRSNCDLTA` | `OCTODELTA` |
//!
//! The current dialect stores metadata as a single length-prefixed JSON blob.
//! The legacy dialect stores a fixed sequence of length-prefixed strings and
//! closes it with the `>>>` marker.
//!
//! # Design
//!
//! - [`dialect`] holds the magic constants and the dispatch-on-magic entry
//!   points. Parsers for both dialects sit behind them.
//! - [`metadata`] holds the typed metadata. Algorithm names are resolved to
//!   [`checksums`] enums while parsing, so an unknown name fails before any
//!   record is read.
//! - [`wire::signature`] and [`wire::delta`] hold the record codecs together
//!   with streaming writers and readers. Encoders append to a `Vec<u8>` so
//!   that blocking and async drivers emit identical bytes.
//! - [`sink`] defines [`DeltaSink`], the seam between the delta builder and
//!   the encoder, and the [`AggregateCopies`] decorator.
//!
//! Writers default to the current dialect. Legacy writers exist so fixtures
//! and interoperability tests can produce legacy streams.
//!
//! # Examples
//!
//! ```
//! use checksums::HashAlgorithm;
//! use protocol::{DeltaCommand, DeltaMetadata, DeltaReader, DeltaSink, DeltaWriter, FileHash};
//!
//! let target = b"hello";
//! let metadata = DeltaMetadata {
//!     hash_algorithm: HashAlgorithm::Xxh64,
//!     expected_file_hash: FileHash::compute(HashAlgorithm::Md5, target),
//!     base_file_hash: None,
//! };
//!
//! let mut writer = DeltaWriter::new(Vec::new());
//! writer.write_metadata(&metadata).unwrap();
//! writer.write_data(target).unwrap();
//! writer.finish().unwrap();
//! let bytes = writer.into_inner();
//!
//! let mut reader = DeltaReader::new(bytes.as_slice()).unwrap();
//! assert_eq!(reader.metadata(), &metadata);
//! assert_eq!(reader.next_command().unwrap(), Some(DeltaCommand::Data { length: 5 }));
//! ```

pub mod dialect;
mod error;
pub mod metadata;
pub mod sink;
pub mod varint;
pub mod wire;

pub use dialect::{Dialect, StreamKind};
pub use error::FormatError;
pub use metadata::{DeltaMetadata, FileHash, SignatureMetadata};
pub use sink::{AggregateCopies, DeltaSink};
pub use wire::delta::{DeltaCommand, DeltaReader, DeltaWriter};
pub use wire::signature::{ChunkRecord, SignatureHeader, SignatureWriter};

#[cfg(feature = "async")]
#[cfg_attr(docsrs, doc(cfg(feature = "async")))]
pub use wire::delta::AsyncDeltaReader;
