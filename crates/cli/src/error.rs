//! crates/cli/src/error.rs

use std::io;
use std::path::{Path, PathBuf};

use matching::DeltaError;
use protocol::FormatError;
use signature::SignatureError;
use thiserror::Error;

/// Exit status for a successful run.
pub const EXIT_SUCCESS: i32 = 0;
/// Exit status for usage, I/O and format failures.
pub const EXIT_FAILURE: i32 = 1;
/// Exit status when a patched file fails hash verification.
pub const EXIT_VERIFICATION_FAILED: i32 = 2;

/// Failures surfaced by a command.
#[derive(Debug, Error)]
pub enum CliError {
    /// A named file could not be opened or created.
    #[error("cannot open '{}': {source}", path.display())]
    Open {
        /// File involved.
        path: PathBuf,
        /// Underlying failure.
        #[source]
        source: io::Error,
    },
    /// Signature construction or parsing failed.
    #[error(transparent)]
    Signature(#[from] SignatureError),
    /// Delta construction or application failed.
    #[error(transparent)]
    Delta(#[from] DeltaError),
    /// A delta header could not be parsed.
    #[error(transparent)]
    Format(#[from] FormatError),
    /// Any other I/O failure.
    #[error(transparent)]
    Io(#[from] io::Error),
}

impl CliError {
    pub(crate) fn open(path: &Path) -> impl FnOnce(io::Error) -> Self + '_ {
        move |source| Self::Open {
            path: path.to_path_buf(),
            source,
        }
    }

    /// Process exit status for this failure.
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::Delta(DeltaError::VerificationFailed { .. }) => EXIT_VERIFICATION_FAILED,
            _ => EXIT_FAILURE,
        }
    }
}
