//! crates/match/src/async_io.rs
//!
//! Tokio drivers for delta build and apply.
//!
//! Both drivers reuse the blocking machinery: the build side feeds the same
//! [`Scanner`](crate::scan::Scanner) and encodes into an in-memory
//! [`DeltaWriter`] that is drained after every scan step, so whole commands
//! reach the async writer and the bytes match [`DeltaBuilder::build_delta`].

use std::io::{self, SeekFrom};

use protocol::{AggregateCopies, AsyncDeltaReader, DeltaCommand, DeltaMetadata, DeltaSink, DeltaWriter, FileHash};
use signature::progress::ProgressTracker;
use signature::{ProgressOperation, Signature};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncSeek, AsyncSeekExt, AsyncWrite, AsyncWriteExt};
use tokio_util::sync::CancellationToken;

use crate::apply::{DeltaApplier, VerifyingWriter, short_basis};
use crate::builder::DeltaBuilder;
use crate::error::DeltaError;
use crate::scan::ScanStatus;
use crate::summary::DeltaSummary;

fn check_cancelled(cancel: Option<&CancellationToken>) -> Result<(), DeltaError> {
    if cancel.is_some_and(CancellationToken::is_cancelled) {
        Err(DeltaError::Cancelled)
    } else {
        Ok(())
    }
}

/// Encoded delta waiting to be written out.
enum Stage {
    Plain(DeltaWriter<Vec<u8>>),
    Aggregated(AggregateCopies<DeltaWriter<Vec<u8>>>),
}

impl Stage {
    fn new(aggregate: bool) -> Self {
        let writer = DeltaWriter::new(Vec::new());
        if aggregate {
            Self::Aggregated(AggregateCopies::new(writer))
        } else {
            Self::Plain(writer)
        }
    }

    fn sink(&mut self) -> &mut dyn DeltaSink {
        match self {
            Self::Plain(writer) => writer,
            Self::Aggregated(aggregate) => aggregate,
        }
    }

    fn bytes(&mut self) -> &mut Vec<u8> {
        match self {
            Self::Plain(writer) => writer.get_mut(),
            Self::Aggregated(aggregate) => aggregate.get_mut().get_mut(),
        }
    }

    async fn drain<W: AsyncWrite + Unpin>(&mut self, output: &mut W) -> io::Result<()> {
        let bytes = self.bytes();
        if !bytes.is_empty() {
            output.write_all(bytes).await?;
            bytes.clear();
        }
        Ok(())
    }
}

impl DeltaBuilder {
    /// Async counterpart of [`DeltaBuilder::build_delta`], writing the
    /// current wire dialect to `output`.
    ///
    /// `cancel` is checked before every read. A cancelled build returns
    /// [`DeltaError::Cancelled`]; every command already written is complete.
    pub async fn build_delta_async<R, W>(
        &self,
        target: &mut R,
        signature: &Signature,
        output: &mut W,
        cancel: Option<&CancellationToken>,
    ) -> Result<(), DeltaError>
    where
        R: AsyncRead + AsyncSeek + Unpin,
        W: AsyncWrite + Unpin,
    {
        let options = self.options();
        let total = target.seek(SeekFrom::End(0)).await?;
        target.seek(SeekFrom::Start(0)).await?;

        let algorithm = options.file_hash_algorithm();
        let mut hasher = algorithm.hasher();
        let mut block = vec![0u8; checksums::strong::READ_BLOCK_SIZE];
        let mut hashing = ProgressTracker::new(options.progress(), ProgressOperation::HashingFile, total);
        hashing.update(0);
        let mut hashed = 0u64;
        loop {
            check_cancelled(cancel)?;
            let read = target.read(&mut block).await?;
            if read == 0 {
                break;
            }
            hasher.update(&block[..read]);
            hashed += read as u64;
            hashing.update(hashed);
        }
        drop(block);
        target.seek(SeekFrom::Start(0)).await?;

        let expected = FileHash {
            algorithm,
            digest: hasher.finalize(),
        };
        self.emit_async(target, total, &Self::metadata(expected, signature), signature, output, cancel)
            .await
    }

    /// Async counterpart of [`DeltaBuilder::build_delta_with_hash`].
    pub async fn build_delta_with_hash_async<R, W>(
        &self,
        target: &mut R,
        expected: FileHash,
        signature: &Signature,
        output: &mut W,
        cancel: Option<&CancellationToken>,
    ) -> Result<(), DeltaError>
    where
        R: AsyncRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        self.emit_async(target, 0, &Self::metadata(expected, signature), signature, output, cancel)
            .await
    }

    async fn emit_async<R, W>(
        &self,
        target: &mut R,
        total: u64,
        metadata: &DeltaMetadata,
        signature: &Signature,
        output: &mut W,
        cancel: Option<&CancellationToken>,
    ) -> Result<(), DeltaError>
    where
        R: AsyncRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut stage = Stage::new(self.options().aggregate_copies());
        stage.sink().write_metadata(metadata)?;
        stage.drain(output).await?;

        let mut scanner = self.scanner(signature);
        let mut scanning = ProgressTracker::new(self.options().progress(), ProgressOperation::BuildingDelta, total);
        scanning.update(0);
        loop {
            check_cancelled(cancel)?;
            if scanner.needs_input() {
                let read = target.read(scanner.input_buffer()).await?;
                scanner.commit_input(read);
            }
            let status = scanner.scan(stage.sink())?;
            stage.drain(output).await?;
            scanning.update(scanner.stats().scanned);
            if status == ScanStatus::Finished {
                break;
            }
        }
        stage.sink().finish()?;
        stage.drain(output).await?;
        output.flush().await?;

        let stats = scanner.stats();
        logging::trace_delta!(
            scanned = stats.scanned,
            copies = stats.copies,
            literal_bytes = stats.literal_bytes,
            "delta built"
        );
        Ok(())
    }
}

impl DeltaApplier {
    /// Async counterpart of [`DeltaApplier::apply`].
    ///
    /// `cancel` is checked between commands, never inside one.
    pub async fn apply_async<B, R, W>(
        &self,
        basis: &mut B,
        delta: &mut AsyncDeltaReader<R>,
        output: &mut W,
        cancel: Option<&CancellationToken>,
    ) -> Result<DeltaSummary, DeltaError>
    where
        B: AsyncRead + AsyncSeek + Unpin,
        R: AsyncRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let options = self.options();
        let mut output = VerifyingWriter::new(output, delta.metadata(), options.skip_hash_check());
        let mut buffer = vec![0u8; options.copy_buffer_size()];
        let mut summary = DeltaSummary::default();
        let mut progress = ProgressTracker::new(options.progress(), ProgressOperation::ApplyingDelta, 0);
        progress.update(0);

        loop {
            check_cancelled(cancel)?;
            let Some(command) = delta.next_command().await? else {
                break;
            };
            match command {
                DeltaCommand::Copy { start, length } => {
                    basis.seek(SeekFrom::Start(start)).await?;
                    let mut remaining = length;
                    while remaining > 0 {
                        let wanted = buffer.len().min(usize::try_from(remaining).unwrap_or(usize::MAX));
                        basis
                            .read_exact(&mut buffer[..wanted])
                            .await
                            .map_err(short_basis(start, length))?;
                        output.get_mut().write_all(&buffer[..wanted]).await?;
                        output.observe(&buffer[..wanted]);
                        remaining -= wanted as u64;
                    }
                }
                DeltaCommand::Data { .. } => loop {
                    let read = delta.read_data(&mut buffer).await?;
                    if read == 0 {
                        break;
                    }
                    output.get_mut().write_all(&buffer[..read]).await?;
                    output.observe(&buffer[..read]);
                },
            }
            summary.record(&command);
            progress.update(summary.target_len());
        }
        output.get_mut().flush().await?;
        output.verify(delta.metadata())?;
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use protocol::{DeltaReader, SignatureWriter};
    use signature::SignatureBuilder;

    use super::*;
    use crate::options::DeltaOptions;
    use crate::test_support::noise;

    fn signature_of(basis: &[u8]) -> Signature {
        let mut writer = SignatureWriter::new(Vec::new());
        SignatureBuilder::default()
            .build(&mut Cursor::new(basis), &mut writer)
            .expect("signature");
        Signature::from_bytes(&writer.into_inner()).expect("parse")
    }

    fn edited(basis: &[u8]) -> Vec<u8> {
        let mut target = basis[..7000].to_vec();
        target.extend_from_slice(&noise(300, 99));
        target.extend_from_slice(&basis[9000..]);
        target
    }

    #[tokio::test]
    async fn async_delta_matches_blocking_delta() {
        let basis = noise(40_000, 11);
        let target = edited(&basis);
        let signature = signature_of(&basis);

        for aggregate in [false, true] {
            let builder = DeltaBuilder::new(
                DeltaOptions::default()
                    .with_aggregate_copies(aggregate)
                    .with_read_buffer_size(8192),
            );
            let mut blocking = DeltaWriter::new(Vec::new());
            builder
                .build_delta(&mut Cursor::new(&target), &signature, &mut blocking)
                .expect("blocking");

            let mut output = Vec::new();
            builder
                .build_delta_async(&mut Cursor::new(&target), &signature, &mut output, None)
                .await
                .expect("async");
            assert_eq!(output, blocking.into_inner(), "aggregate = {aggregate}");
        }
    }

    #[tokio::test]
    async fn async_apply_reconstructs_target() {
        let basis = noise(40_000, 12);
        let target = edited(&basis);
        let signature = signature_of(&basis);

        let mut delta = Vec::new();
        DeltaBuilder::default()
            .build_delta_async(&mut Cursor::new(&target), &signature, &mut delta, None)
            .await
            .expect("delta");

        let mut reader = AsyncDeltaReader::new(delta.as_slice()).await.expect("header");
        let mut output = Vec::new();
        let summary = DeltaApplier::default()
            .apply_async(&mut Cursor::new(&basis), &mut reader, &mut output, None)
            .await
            .expect("apply");
        assert_eq!(output, target);

        let mut blocking_reader = DeltaReader::new(Cursor::new(&delta)).expect("header");
        let mut blocking_output = Vec::new();
        let blocking_summary = DeltaApplier::default()
            .apply(&mut Cursor::new(&basis), &mut blocking_reader, &mut blocking_output)
            .expect("blocking apply");
        assert_eq!(summary, blocking_summary);
    }

    #[tokio::test]
    async fn short_basis_fails_like_the_blocking_applier() {
        let mut writer = DeltaWriter::new(Vec::new());
        writer
            .write_metadata(&DeltaMetadata {
                hash_algorithm: checksums::HashAlgorithm::Xxh64,
                expected_file_hash: FileHash::compute(checksums::HashAlgorithm::Md5, b""),
                base_file_hash: None,
            })
            .expect("metadata");
        writer.write_copy(8, 16).expect("copy");
        let delta = writer.into_inner();
        let basis = b"0123456789";

        let mut reader = AsyncDeltaReader::new(delta.as_slice()).await.expect("header");
        let err = DeltaApplier::default()
            .apply_async(&mut Cursor::new(basis), &mut reader, &mut Vec::new(), None)
            .await
            .expect_err("short basis");

        let mut blocking_reader = DeltaReader::new(Cursor::new(&delta)).expect("header");
        let blocking = DeltaApplier::default()
            .apply(&mut Cursor::new(basis), &mut blocking_reader, &mut Vec::new())
            .expect_err("short basis");

        match (err, blocking) {
            (DeltaError::Io(err), DeltaError::Io(blocking)) => {
                assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
                assert_eq!(err.to_string(), blocking.to_string());
                assert!(err.to_string().contains("basis ends inside copy of 16 bytes at offset 8"));
            }
            other => panic!("expected two I/O errors, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn cancellation_stops_before_the_first_command() {
        let basis = noise(10_000, 13);
        let signature = signature_of(&basis);
        let token = CancellationToken::new();
        token.cancel();

        let mut output = Vec::new();
        let err = DeltaBuilder::default()
            .build_delta_async(&mut Cursor::new(&basis), &signature, &mut output, Some(&token))
            .await
            .expect_err("cancelled");
        assert!(matches!(err, DeltaError::Cancelled));
        assert!(output.is_empty());
    }
}
