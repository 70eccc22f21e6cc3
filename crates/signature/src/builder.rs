//! crates/signature/src/builder.rs
//!
//! Two-pass signature construction over a seekable basis.

use std::io::{self, BufReader, Read, Seek, SeekFrom, Write};

use protocol::{ChunkRecord, FileHash, SignatureMetadata, SignatureWriter};
#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::error::SignatureError;
use crate::options::SignatureOptions;
use crate::progress::{ProgressOperation, ProgressTracker};

/// Builds signatures with a fixed configuration.
#[derive(Clone, Debug, Default)]
pub struct SignatureBuilder {
    options: SignatureOptions,
}

impl SignatureBuilder {
    /// Creates a builder. The options were validated when they were built.
    #[must_use]
    pub const fn new(options: SignatureOptions) -> Self {
        Self { options }
    }

    /// Configuration in use.
    #[must_use]
    pub const fn options(&self) -> &SignatureOptions {
        &self.options
    }

    /// Writes the signature of `basis` to `writer`.
    ///
    /// The first pass hashes the whole basis and writes the metadata. The
    /// second pass rewinds and writes one record per chunk as it is hashed;
    /// only the final chunk may be shorter than the chunk size. An empty
    /// basis yields a header with no records.
    #[cfg_attr(
        feature = "tracing",
        instrument(skip_all, fields(chunk_size = %self.options.chunk_size()), name = "build_signature")
    )]
    pub fn build<R, W>(&self, basis: &mut R, writer: &mut SignatureWriter<W>) -> Result<(), SignatureError>
    where
        R: Read + Seek,
        W: Write,
    {
        let total = basis.seek(SeekFrom::End(0))?;
        basis.seek(SeekFrom::Start(0))?;
        let mut reader = BufReader::with_capacity(self.options.read_buffer_size(), basis);

        let file_hash_algorithm = self.options.file_hash_algorithm();
        let mut hashing = ProgressTracker::new(self.options.progress(), ProgressOperation::HashingFile, total);
        hashing.update(0);
        let digest = file_hash_algorithm.compute_reader(&mut reader, |position| hashing.update(position))?;
        writer.write_metadata(&self.metadata(FileHash {
            algorithm: file_hash_algorithm,
            digest,
        }))?;

        reader.seek(SeekFrom::Start(0))?;
        let mut chunking = ProgressTracker::new(
            self.options.progress(),
            ProgressOperation::BuildingSignatures,
            total,
        );
        chunking.update(0);
        let mut chunk = vec![0u8; self.options.chunk_size().get()];
        let mut position = 0u64;
        loop {
            let filled = read_full(&mut reader, &mut chunk)?;
            if filled == 0 {
                break;
            }
            writer.write_chunk(&self.chunk_record(&chunk[..filled]))?;
            position += filled as u64;
            chunking.update(position);
            if filled < chunk.len() {
                break;
            }
        }
        writer.flush()?;

        logging::trace_sig!(
            chunks = writer.chunks_written(),
            bytes = position,
            chunk_size = self.options.chunk_size().get(),
            "signature built"
        );
        Ok(())
    }

    pub(crate) fn metadata(&self, base_file_hash: FileHash) -> SignatureMetadata {
        SignatureMetadata {
            chunk_hash_algorithm: self.options.chunk_hash_algorithm(),
            rolling_checksum_algorithm: self.options.rolling_checksum_algorithm(),
            base_file_hash: Some(base_file_hash),
        }
    }

    pub(crate) fn chunk_record(&self, chunk: &[u8]) -> ChunkRecord {
        ChunkRecord {
            length: chunk.len() as u16,
            rolling_checksum: self.options.rolling_checksum_algorithm().calculate(chunk),
            hash: self.options.chunk_hash_algorithm().compute(chunk),
        }
    }
}

/// Fills `buf` unless the stream ends first. Returns the bytes read.
pub(crate) fn read_full<R: Read + ?Sized>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(read) => filled += read,
            Err(err) if err.kind() == io::ErrorKind::Interrupted => {}
            Err(err) => return Err(err),
        }
    }
    Ok(filled)
}
