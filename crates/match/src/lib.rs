#![cfg_attr(docsrs, feature(doc_cfg))]
#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! # Overview
//!
//! `matching` computes and replays deltas. Given a target file and the
//! [`Signature`](signature::Signature) of a basis, [`DeltaBuilder`] emits the
//! copy and literal commands that rebuild the target from the basis.
//! [`DeltaApplier`] replays those commands against the basis and checks the
//! result against the whole-file hash carried in the delta header.
//!
//! # Design
//!
//! - [`ChunkMap`] buckets chunks by rolling checksum. Buckets keep signature
//!   order, so the earliest basis chunk wins a tie.
//! - The scanner slides a window the size of the longest chunk over the
//!   target one byte at a time, rotating the rolling checksum instead of
//!   recomputing it. A weak match is confirmed with the strong hash before
//!   a copy is emitted; unmatched bytes accumulate into literal runs.
//! - Commands go to any [`protocol::DeltaSink`]. With
//!   [`DeltaOptions::with_aggregate_copies`] adjacent copies are merged first.
//! - [`explain`] renders a delta for humans and [`DeltaSummary`] totals it.
//! - The `async` feature adds tokio drivers with cooperative cancellation.
//!   They share the scanner with the blocking path and produce the same
//!   bytes.
//!
//! # Examples
//!
//! ```
//! use std::io::Cursor;
//!
//! use matching::{DeltaApplier, DeltaBuilder};
//! use protocol::{DeltaReader, DeltaWriter, SignatureWriter};
//! use signature::{Signature, SignatureBuilder};
//!
//! let basis: Vec<u8> = (0..10_000u32).map(|i| (i * 7 % 253) as u8).collect();
//! let mut target = basis.clone();
//! target.splice(4000..4000, b"new bytes".iter().copied());
//!
//! let mut signature = SignatureWriter::new(Vec::new());
//! SignatureBuilder::default()
//!     .build(&mut Cursor::new(&basis), &mut signature)
//!     .unwrap();
//! let signature = Signature::from_bytes(signature.get_ref()).unwrap();
//!
//! let mut delta = DeltaWriter::new(Vec::new());
//! DeltaBuilder::default()
//!     .build_delta(&mut Cursor::new(&target), &signature, &mut delta)
//!     .unwrap();
//!
//! let mut reader = DeltaReader::new(Cursor::new(delta.into_inner())).unwrap();
//! let mut output = Vec::new();
//! let summary = DeltaApplier::default()
//!     .apply(&mut Cursor::new(&basis), &mut reader, &mut output)
//!     .unwrap();
//! assert_eq!(output, target);
//! assert_eq!(summary.target_len(), target.len() as u64);
//! ```

mod apply;
#[cfg(feature = "async")]
mod async_io;
mod builder;
mod error;
mod index;
mod options;
mod scan;
mod summary;
#[cfg(test)]
mod test_support;

pub use apply::DeltaApplier;
pub use builder::DeltaBuilder;
pub use error::DeltaError;
pub use index::ChunkMap;
pub use options::{ApplyOptions, DEFAULT_COPY_BUFFER_SIZE, DEFAULT_READ_BUFFER_SIZE, DeltaOptions};
pub use summary::{DeltaSummary, explain};

#[cfg(feature = "async")]
#[cfg_attr(docsrs, doc(cfg(feature = "async")))]
pub use tokio_util::sync::CancellationToken;
