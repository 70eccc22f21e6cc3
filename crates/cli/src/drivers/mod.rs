//! crates/cli/src/drivers/mod.rs
//!
//! File-level drivers behind each subcommand.
//!
//! Outputs are written to a temporary file next to the destination and only
//! renamed into place once the operation succeeded, so a failed patch never
//! leaves a half-written or unverified file behind.

use std::fs::File;
use std::path::Path;

use signature::{ProgressSink, Signature};
use tempfile::NamedTempFile;

use crate::error::CliError;

pub(crate) mod blocking;
#[cfg(feature = "async")]
pub(crate) mod tokio_io;

#[cfg(not(feature = "async"))]
pub(crate) use blocking::{apply_delta, write_delta};
#[cfg(feature = "async")]
pub(crate) use tokio_io::{apply_delta, write_delta};

pub(crate) fn staged_output(path: &Path) -> Result<NamedTempFile, CliError> {
    let dir = path
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    tempfile::Builder::new()
        .prefix(".rdelta-")
        .tempfile_in(dir)
        .map_err(CliError::open(path))
}

pub(crate) fn persist(staged: NamedTempFile, path: &Path) -> Result<(), CliError> {
    staged
        .persist(path)
        .map_err(|err| CliError::open(path)(err.error))?;
    Ok(())
}

pub(crate) fn open(path: &Path) -> Result<File, CliError> {
    File::open(path).map_err(CliError::open(path))
}

pub(crate) fn read_signature(path: &Path, progress: Option<&dyn ProgressSink>) -> Result<Signature, CliError> {
    let mut file = open(path)?;
    let signature = Signature::read_with_progress(&mut file, progress)?;
    logging::trace_sig!(
        path = %path.display(),
        chunks = signature.chunks().len(),
        dialect = %signature.dialect(),
        "signature loaded"
    );
    Ok(signature)
}
