//! crates/signature/src/file.rs
//!
//! Parsed signature container.

use std::io::{self, BufReader, Cursor, Read, Seek, SeekFrom, Write};

use checksums::{HashAlgorithm, RollingChecksumAlgorithm};
use protocol::{
    ChunkRecord, Dialect, FileHash, FormatError, SignatureHeader, SignatureMetadata, SignatureWriter,
    StreamKind,
};
#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::chunk::ChunkSignature;
use crate::error::SignatureError;
use crate::progress::{ProgressOperation, ProgressSink, ProgressTracker};

const RECORD_READ_BUFFER: usize = 64 * 1024;

/// A complete signature: metadata plus chunks in basis order.
///
/// Chunks tile the basis: each starts where the previous one ends and the
/// first starts at 0.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Signature {
    dialect: Dialect,
    metadata: SignatureMetadata,
    chunks: Vec<ChunkSignature>,
}

impl Signature {
    /// Assembles a signature from parts. Callers are responsible for the
    /// tiling of `chunks`.
    #[must_use]
    pub const fn from_raw_parts(
        dialect: Dialect,
        metadata: SignatureMetadata,
        chunks: Vec<ChunkSignature>,
    ) -> Self {
        Self {
            dialect,
            metadata,
            chunks,
        }
    }

    /// Parses a signature of either dialect.
    ///
    /// The stream must be seekable so the record area can be checked against
    /// the record size before any record is decoded.
    pub fn read_from<R: Read + Seek>(reader: &mut R) -> Result<Self, SignatureError> {
        Self::read_with_progress(reader, None)
    }

    /// Parses a signature, reporting [`ProgressOperation::ReadingSignature`].
    #[cfg_attr(feature = "tracing", instrument(skip_all, name = "read_signature"))]
    pub fn read_with_progress<R: Read + Seek>(
        reader: &mut R,
        progress: Option<&dyn ProgressSink>,
    ) -> Result<Self, SignatureError> {
        let header = SignatureHeader::read_from(reader)?;
        let body_start = reader.stream_position()?;
        let end = reader.seek(SeekFrom::End(0))?;
        reader.seek(SeekFrom::Start(body_start))?;

        let record_size = header.metadata.record_size();
        let remaining = end.saturating_sub(body_start);
        if remaining % record_size as u64 != 0 {
            return Err(FormatError::MisalignedRecords {
                remaining,
                record_size,
            }
            .into());
        }

        let count = remaining / record_size as u64;
        let mut tracker = ProgressTracker::new(progress, ProgressOperation::ReadingSignature, remaining);
        tracker.update(0);
        let mut records = BufReader::with_capacity(RECORD_READ_BUFFER, reader);
        let mut chunks = Vec::with_capacity(usize::try_from(count).unwrap_or(0).min(1 << 20));
        let mut raw = vec![0u8; record_size];
        let mut offset = 0u64;
        for index in 0..count {
            records.read_exact(&mut raw).map_err(|err| {
                if err.kind() == io::ErrorKind::UnexpectedEof {
                    SignatureError::Format(FormatError::Truncated(StreamKind::Signature))
                } else {
                    SignatureError::Io(err)
                }
            })?;
            let record = ChunkRecord::decode(&raw)?;
            let length = u64::from(record.length);
            chunks.push(ChunkSignature::from_record(offset, record));
            offset += length;
            tracker.update((index + 1) * record_size as u64);
        }

        logging::trace_sig!(
            dialect = %header.dialect,
            chunks = chunks.len(),
            basis_len = offset,
            "signature parsed"
        );
        Ok(Self::from_raw_parts(header.dialect, header.metadata, chunks))
    }

    /// Parses a signature held in memory.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, SignatureError> {
        Self::read_from(&mut Cursor::new(bytes))
    }

    /// Re-encodes the signature through `writer`, which chooses the dialect.
    pub fn write_to<W: Write>(&self, writer: &mut SignatureWriter<W>) -> io::Result<()> {
        writer.write_metadata(&self.metadata)?;
        for chunk in &self.chunks {
            writer.write_chunk(&chunk.to_record())?;
        }
        writer.flush()
    }

    /// Dialect the signature was read in, or [`Dialect::Current`] if built.
    #[must_use]
    pub const fn dialect(&self) -> Dialect {
        self.dialect
    }

    /// Header metadata.
    #[must_use]
    pub const fn metadata(&self) -> &SignatureMetadata {
        &self.metadata
    }

    /// Chunks in basis order.
    #[must_use]
    pub fn chunks(&self) -> &[ChunkSignature] {
        &self.chunks
    }

    /// Reports whether the basis was empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Strong hash used for every chunk.
    #[must_use]
    pub const fn chunk_hash_algorithm(&self) -> HashAlgorithm {
        self.metadata.chunk_hash_algorithm
    }

    /// Rolling checksum used for every chunk.
    #[must_use]
    pub const fn rolling_checksum_algorithm(&self) -> RollingChecksumAlgorithm {
        self.metadata.rolling_checksum_algorithm
    }

    /// Whole-basis digest, absent for legacy signatures.
    #[must_use]
    pub const fn base_file_hash(&self) -> Option<&FileHash> {
        self.metadata.base_file_hash.as_ref()
    }

    /// Length of the basis the signature describes.
    #[must_use]
    pub fn basis_len(&self) -> u64 {
        self.chunks.last().map_or(0, ChunkSignature::end_offset)
    }
}
