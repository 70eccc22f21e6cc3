use std::io;

use protocol::FormatError;
use thiserror::Error;

/// Errors raised while building or parsing signatures.
#[derive(Debug, Error)]
pub enum SignatureError {
    /// Configured chunk size is outside the supported range.
    #[error("chunk size {size} is outside the supported range {min}..={max}")]
    InvalidChunkSize {
        /// Requested size.
        size: usize,
        /// Smallest supported size.
        min: usize,
        /// Largest supported size.
        max: usize,
    },
    /// The signature stream is malformed.
    #[error("malformed signature: {0}")]
    Format(#[from] FormatError),
    /// Reading the basis or writing the signature failed.
    #[error("signature I/O failed: {0}")]
    Io(#[from] io::Error),
    /// The operation was cancelled between two chunks.
    #[error("signature operation cancelled")]
    Cancelled,
}
