//! crates/signature/src/async_io.rs
//!
//! Tokio drivers for signature build and parse.
//!
//! Records are encoded by the same [`SignatureWriter`] as the blocking path,
//! into an in-memory stage that is drained to the async writer. Output is
//! byte-identical to [`SignatureBuilder::build`].

use std::io::SeekFrom;

use protocol::{FileHash, SignatureWriter};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncSeek, AsyncSeekExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio_util::sync::CancellationToken;

use crate::builder::SignatureBuilder;
use crate::error::SignatureError;
use crate::file::Signature;
use crate::progress::{ProgressOperation, ProgressSink, ProgressTracker};

/// Staged bytes are drained once they reach this size.
const STAGE_LIMIT: usize = 64 * 1024;

fn check_cancelled(cancel: Option<&CancellationToken>) -> Result<(), SignatureError> {
    if cancel.is_some_and(CancellationToken::is_cancelled) {
        Err(SignatureError::Cancelled)
    } else {
        Ok(())
    }
}

async fn drain<W: AsyncWrite + Unpin>(
    staged: &mut SignatureWriter<Vec<u8>>,
    output: &mut W,
) -> Result<(), SignatureError> {
    if !staged.get_ref().is_empty() {
        output.write_all(staged.get_ref()).await?;
        staged.get_mut().clear();
    }
    Ok(())
}

async fn fill<R: AsyncRead + Unpin>(reader: &mut R, buf: &mut [u8]) -> std::io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        let read = reader.read(&mut buf[filled..]).await?;
        if read == 0 {
            break;
        }
        filled += read;
    }
    Ok(filled)
}

impl SignatureBuilder {
    /// Async counterpart of [`SignatureBuilder::build`].
    ///
    /// `cancel` is checked between read blocks and between chunks. A
    /// cancelled build returns [`SignatureError::Cancelled`]; records already
    /// written are complete.
    pub async fn build_async<R, W>(
        &self,
        basis: &mut R,
        output: &mut W,
        cancel: Option<&CancellationToken>,
    ) -> Result<(), SignatureError>
    where
        R: AsyncRead + AsyncSeek + Unpin,
        W: AsyncWrite + Unpin,
    {
        let options = self.options();
        let total = basis.seek(SeekFrom::End(0)).await?;
        basis.seek(SeekFrom::Start(0)).await?;
        let mut reader = BufReader::with_capacity(options.read_buffer_size(), basis);

        let file_hash_algorithm = options.file_hash_algorithm();
        let mut hasher = file_hash_algorithm.hasher();
        let mut block = vec![0u8; options.read_buffer_size()];
        let mut hashing = ProgressTracker::new(options.progress(), ProgressOperation::HashingFile, total);
        hashing.update(0);
        let mut hashed = 0u64;
        loop {
            check_cancelled(cancel)?;
            let read = reader.read(&mut block).await?;
            if read == 0 {
                break;
            }
            hasher.update(&block[..read]);
            hashed += read as u64;
            hashing.update(hashed);
        }

        let mut staged = SignatureWriter::new(Vec::with_capacity(STAGE_LIMIT));
        staged.write_metadata(&self.metadata(FileHash {
            algorithm: file_hash_algorithm,
            digest: hasher.finalize(),
        }))?;
        drain(&mut staged, output).await?;

        reader.seek(SeekFrom::Start(0)).await?;
        let mut chunking = ProgressTracker::new(
            options.progress(),
            ProgressOperation::BuildingSignatures,
            total,
        );
        chunking.update(0);
        let chunk_size = options.chunk_size().get();
        let mut position = 0u64;
        loop {
            check_cancelled(cancel)?;
            let filled = fill(&mut reader, &mut block[..chunk_size]).await?;
            if filled == 0 {
                break;
            }
            staged.write_chunk(&self.chunk_record(&block[..filled]))?;
            position += filled as u64;
            chunking.update(position);
            if staged.get_ref().len() >= STAGE_LIMIT {
                drain(&mut staged, output).await?;
            }
            if filled < chunk_size {
                break;
            }
        }
        drain(&mut staged, output).await?;
        output.flush().await?;

        logging::trace_sig!(chunks = staged.chunks_written(), bytes = position, "signature built");
        Ok(())
    }
}

impl Signature {
    /// Reads a signature from an async stream.
    ///
    /// The stream is buffered in memory and parsed with
    /// [`Signature::read_with_progress`].
    pub async fn read_async<R: AsyncRead + Unpin>(
        reader: &mut R,
        progress: Option<&dyn ProgressSink>,
    ) -> Result<Self, SignatureError> {
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes).await?;
        Self::read_with_progress(&mut std::io::Cursor::new(bytes), progress)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;
    use crate::options::SignatureOptions;

    fn basis() -> Vec<u8> {
        (0..20_000u32).map(|i| (i.wrapping_mul(31) >> 3) as u8).collect()
    }

    #[tokio::test]
    async fn async_build_matches_blocking_build() {
        let options = SignatureOptions::default().with_chunk_size(512).expect("valid");
        let builder = SignatureBuilder::new(options);

        let mut blocking = SignatureWriter::new(Vec::new());
        builder.build(&mut Cursor::new(basis()), &mut blocking).expect("blocking");

        let mut output = Vec::new();
        builder
            .build_async(&mut Cursor::new(basis()), &mut output, None)
            .await
            .expect("async");
        assert_eq!(output, blocking.into_inner());

        let parsed = Signature::read_async(&mut output.as_slice(), None).await.expect("parse");
        assert_eq!(parsed.basis_len(), 20_000);
    }

    #[tokio::test]
    async fn cancelled_build_stops() {
        let token = CancellationToken::new();
        token.cancel();
        let mut output = Vec::new();
        let err = SignatureBuilder::default()
            .build_async(&mut Cursor::new(basis()), &mut output, Some(&token))
            .await
            .expect_err("cancelled");
        assert!(matches!(err, SignatureError::Cancelled));
        assert!(output.is_empty());
    }
}
