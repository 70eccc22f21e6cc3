#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! # Overview
//!
//! `logging` gives every rdelta crate the same set of subsystem targets so
//! diagnostics can be filtered per stage (signature, delta, patch, protocol)
//! without each crate inventing its own naming scheme.
//!
//! # Design
//!
//! The crate is a thin layer over [`tracing`]. The macros in
//! [`tracing_macros`] attach a fixed `rdelta::<subsystem>` target to the
//! standard `tracing` macros; library crates only ever emit events. Installing
//! a subscriber is left to binaries and is available behind the `subscriber`
//! feature through [`init`].
//!
//! # Examples
//!
//! ```
//! logging::trace_delta!(chunks = 12, "chunk map ready");
//! ```

#[doc(hidden)]
pub use tracing;

pub mod tracing_macros;

#[cfg(feature = "subscriber")]
#[cfg_attr(docsrs, doc(cfg(feature = "subscriber")))]
mod subscriber;

#[cfg(feature = "subscriber")]
pub use subscriber::{LOG_ENV_VAR, filter_for_verbosity, init};

/// Target used for signature construction and parsing events.
pub const TARGET_SIGNATURE: &str = "rdelta::signature";
/// Target used for delta construction events.
pub const TARGET_DELTA: &str = "rdelta::delta";
/// Target used for delta application events.
pub const TARGET_PATCH: &str = "rdelta::patch";
/// Target used for wire-format events.
pub const TARGET_PROTOCOL: &str = "rdelta::protocol";
