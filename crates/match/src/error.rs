//! crates/match/src/error.rs

use std::io;

use checksums::HashAlgorithm;
use protocol::FormatError;
use thiserror::Error;

use crate::summary::hex;

/// Errors raised while building or applying deltas.
#[derive(Debug, Error)]
pub enum DeltaError {
    /// Reading an input or writing an output failed.
    #[error("delta I/O failed: {0}")]
    Io(#[from] io::Error),
    /// The delta stream is malformed.
    #[error("malformed delta: {0}")]
    Format(#[from] FormatError),
    /// The reconstructed output does not hash to the expected digest.
    ///
    /// Usually means the basis changed after its signature was taken.
    #[error(
        "output failed {algorithm} verification: expected {}, got {}",
        hex(.expected),
        hex(.actual)
    )]
    VerificationFailed {
        /// Algorithm named in the delta metadata.
        algorithm: HashAlgorithm,
        /// Digest stored in the delta.
        expected: Vec<u8>,
        /// Digest of the produced output.
        actual: Vec<u8>,
    },
    /// The operation was cancelled between two commands.
    #[error("delta operation cancelled")]
    Cancelled,
}
