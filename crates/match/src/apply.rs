//! crates/match/src/apply.rs
//!
//! Delta application: basis plus commands in, reconstructed target out.

use std::io::{self, Read, Seek, SeekFrom, Write};

use checksums::StrongHasher;
use protocol::{DeltaCommand, DeltaMetadata, DeltaReader};
use signature::progress::ProgressTracker;
use signature::ProgressOperation;
#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::error::DeltaError;
use crate::options::ApplyOptions;
use crate::summary::DeltaSummary;

/// Replays deltas with a fixed configuration.
#[derive(Clone, Debug, Default)]
pub struct DeltaApplier {
    options: ApplyOptions,
}

impl DeltaApplier {
    /// Creates an applier.
    #[must_use]
    pub const fn new(options: ApplyOptions) -> Self {
        Self { options }
    }

    /// Configuration in use.
    #[must_use]
    pub const fn options(&self) -> &ApplyOptions {
        &self.options
    }

    /// Writes the file described by `delta` to `output`.
    ///
    /// Commands are replayed strictly in order. A copy reaching past the end
    /// of `basis` fails with [`io::ErrorKind::UnexpectedEof`]. Once every
    /// command has been written the output digest is compared with the one
    /// stored in the delta; a mismatch is reported as
    /// [`DeltaError::VerificationFailed`] after the output was written.
    #[cfg_attr(feature = "tracing", instrument(skip_all, name = "apply_delta"))]
    pub fn apply<B, R, W>(
        &self,
        basis: &mut B,
        delta: &mut DeltaReader<R>,
        output: &mut W,
    ) -> Result<DeltaSummary, DeltaError>
    where
        B: Read + Seek,
        R: Read,
        W: Write,
    {
        let mut output = VerifyingWriter::new(output, delta.metadata(), self.options.skip_hash_check());
        let mut buffer = vec![0u8; self.options.copy_buffer_size()];
        let mut summary = DeltaSummary::default();
        let mut progress = ProgressTracker::new(self.options.progress(), ProgressOperation::ApplyingDelta, 0);
        progress.update(0);

        while let Some(command) = delta.next_command()? {
            match command {
                DeltaCommand::Copy { start, length } => {
                    logging::trace_patch!(start, length, "copy");
                    copy_from_basis(basis, start, length, &mut buffer, &mut output)?;
                }
                DeltaCommand::Data { length } => {
                    logging::trace_patch!(length, "data");
                    loop {
                        let read = delta.read_data(&mut buffer)?;
                        if read == 0 {
                            break;
                        }
                        output.write_all(&buffer[..read])?;
                    }
                }
            }
            summary.record(&command);
            progress.update(summary.target_len());
        }
        output.flush()?;
        output.verify(delta.metadata())?;

        logging::trace_patch!(
            copies = summary.copy_commands,
            data_commands = summary.data_commands,
            bytes = summary.target_len(),
            "delta applied"
        );
        Ok(summary)
    }
}

fn copy_from_basis<B, W>(basis: &mut B, start: u64, length: u64, buffer: &mut [u8], output: &mut W) -> io::Result<()>
where
    B: Read + Seek + ?Sized,
    W: Write + ?Sized,
{
    basis.seek(SeekFrom::Start(start))?;
    let mut remaining = length;
    while remaining > 0 {
        let wanted = buffer.len().min(usize::try_from(remaining).unwrap_or(usize::MAX));
        basis
            .read_exact(&mut buffer[..wanted])
            .map_err(short_basis(start, length))?;
        output.write_all(&buffer[..wanted])?;
        remaining -= wanted as u64;
    }
    Ok(())
}

/// Names the copy when the basis runs out in the middle of it.
pub(crate) fn short_basis(start: u64, length: u64) -> impl FnOnce(io::Error) -> io::Error {
    move |err| {
        if err.kind() == io::ErrorKind::UnexpectedEof {
            io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("basis ends inside copy of {length} bytes at offset {start}"),
            )
        } else {
            err
        }
    }
}

/// Output wrapper that hashes everything written through it.
pub(crate) struct VerifyingWriter<W> {
    inner: W,
    hasher: Option<StrongHasher>,
}

impl<W> VerifyingWriter<W> {
    pub(crate) fn new(inner: W, metadata: &DeltaMetadata, skip_hash_check: bool) -> Self {
        let hasher = if skip_hash_check {
            logging::warn_at!(logging::TARGET_PATCH, "output verification disabled");
            None
        } else {
            Some(metadata.expected_file_hash.algorithm.hasher())
        };
        Self { inner, hasher }
    }

    pub(crate) fn observe(&mut self, bytes: &[u8]) {
        if let Some(hasher) = &mut self.hasher {
            hasher.update(bytes);
        }
    }

    pub(crate) fn get_mut(&mut self) -> &mut W {
        &mut self.inner
    }

    /// Compares the digest of everything observed with the expected one.
    pub(crate) fn verify(self, metadata: &DeltaMetadata) -> Result<(), DeltaError> {
        let Some(hasher) = self.hasher else {
            return Ok(());
        };
        let expected = &metadata.expected_file_hash;
        let actual = hasher.finalize();
        if actual == expected.digest {
            logging::trace_patch!(algorithm = %expected.algorithm, "output verified");
            Ok(())
        } else {
            Err(DeltaError::VerificationFailed {
                algorithm: expected.algorithm,
                expected: expected.digest.clone(),
                actual,
            })
        }
    }
}

impl<W: Write> Write for VerifyingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let written = self.inner.write(buf)?;
        self.observe(&buf[..written]);
        Ok(written)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}
