#![cfg_attr(docsrs, feature(doc_cfg))]
#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! # Overview
//!
//! `signature` fingerprints a basis file so a delta can later be computed
//! against it without the basis itself. The basis is cut into consecutive,
//! non-overlapping chunks of a configured size; each chunk is described by a
//! [`ChunkSignature`] carrying its offset, length, rolling checksum and strong
//! hash. A [`Signature`] is the ordered list of chunks plus the metadata
//! needed to interpret them.
//!
//! # Design
//!
//! - [`SignatureOptions`] validates the configuration up front. A chunk size
//!   outside `[128, 31744]` is rejected before any byte is read.
//! - [`SignatureBuilder`] makes two passes over a seekable basis: the first
//!   hashes the whole file, the second emits chunk records through a
//!   [`protocol::SignatureWriter`] as they are produced.
//! - [`Signature::read_from`] parses either wire dialect and rebuilds chunk
//!   offsets as running sums of the record lengths.
//! - [`progress`] defines the best-effort progress sink shared with the delta
//!   engine. Reports never block the operation.
//!
//! # Examples
//!
//! ```
//! use std::io::Cursor;
//!
//! use protocol::SignatureWriter;
//! use signature::{Signature, SignatureBuilder, SignatureOptions};
//!
//! let basis = vec![7u8; 5000];
//! let options = SignatureOptions::default().with_chunk_size(2048).unwrap();
//!
//! let mut writer = SignatureWriter::new(Vec::new());
//! SignatureBuilder::new(options)
//!     .build(&mut Cursor::new(&basis), &mut writer)
//!     .unwrap();
//!
//! let signature = Signature::read_from(&mut Cursor::new(writer.into_inner())).unwrap();
//! let lengths: Vec<u16> = signature.chunks().iter().map(|c| c.length()).collect();
//! assert_eq!(lengths, [2048, 2048, 904]);
//! assert_eq!(signature.chunks()[2].start_offset(), 4096);
//! ```

#[cfg(feature = "async")]
mod async_io;
mod builder;
mod chunk;
mod error;
mod file;
mod options;
pub mod progress;

pub use builder::SignatureBuilder;
pub use chunk::ChunkSignature;
pub use error::SignatureError;
pub use file::Signature;
pub use options::{
    ChunkSize, DEFAULT_CHUNK_SIZE, DEFAULT_READ_BUFFER_SIZE, MAX_CHUNK_SIZE, MIN_CHUNK_SIZE,
    SignatureOptions,
};
pub use progress::{ProgressOperation, ProgressReport, ProgressSink};

#[cfg(feature = "async")]
#[cfg_attr(docsrs, doc(cfg(feature = "async")))]
pub use tokio_util::sync::CancellationToken;
