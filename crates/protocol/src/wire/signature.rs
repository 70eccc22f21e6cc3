//! crates/protocol/src/wire/signature.rs
//!
//! Signature header and chunk record encoding.
//!
//! ```text
//! current: FRSNCSG 0x01 <string: metadata json>
//! legacy:  OCTOSIG 0x01 <string: hash name> <string: rolling name> ">>>"
//! record:  [length: i16 LE][rolling checksum: u32 LE][hash: N bytes]
//! ```
//!
//! Chunk offsets are not stored. Readers rebuild them as running sums of the
//! record lengths.

use std::io::{self, Read, Write};

use crate::dialect::{Dialect, END_OF_METADATA, FORMAT_VERSION, StreamKind};
use crate::error::FormatError;
use crate::metadata::SignatureMetadata;
use crate::varint::{encode_string, read_string};

const KIND: StreamKind = StreamKind::Signature;

/// Size of one record for a hash of `hash_len` bytes.
#[must_use]
pub const fn record_size(hash_len: usize) -> usize {
    2 + 4 + hash_len
}

/// One decoded chunk record.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ChunkRecord {
    /// Chunk length in bytes, at least 1.
    pub length: u16,
    /// Rolling checksum of the chunk.
    pub rolling_checksum: u32,
    /// Strong hash of the chunk.
    pub hash: Vec<u8>,
}

impl ChunkRecord {
    /// Appends the record encoding.
    ///
    /// Fails when the length does not fit the signed 16-bit field or the
    /// hash is not `hash_len` bytes.
    pub fn encode(&self, out: &mut Vec<u8>, hash_len: usize) -> io::Result<()> {
        let length = i16::try_from(self.length)
            .ok()
            .filter(|length| *length > 0)
            .ok_or_else(|| {
                io::Error::new(
                    io::ErrorKind::InvalidInput,
                    format!("chunk length {} does not fit a signature record", self.length),
                )
            })?;
        if self.hash.len() != hash_len {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("chunk hash is {} bytes, expected {hash_len}", self.hash.len()),
            ));
        }
        out.extend_from_slice(&length.to_le_bytes());
        out.extend_from_slice(&self.rolling_checksum.to_le_bytes());
        out.extend_from_slice(&self.hash);
        Ok(())
    }

    /// Decodes one record from exactly [`record_size`] bytes.
    ///
    /// Everything after the six fixed bytes is the hash, so a slice that
    /// stops at or before them is truncated.
    pub fn decode(bytes: &[u8]) -> Result<Self, FormatError> {
        if bytes.len() <= record_size(0) {
            return Err(FormatError::Truncated(KIND));
        }
        let length = i16::from_le_bytes([bytes[0], bytes[1]]);
        if length < 1 {
            return Err(FormatError::InvalidChunkLength(length));
        }
        Ok(Self {
            length: length as u16,
            rolling_checksum: u32::from_le_bytes([bytes[2], bytes[3], bytes[4], bytes[5]]),
            hash: bytes[6..].to_vec(),
        })
    }
}

/// Parsed signature header.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SignatureHeader {
    /// Dialect the header was written in.
    pub dialect: Dialect,
    /// Decoded metadata.
    pub metadata: SignatureMetadata,
}

impl SignatureHeader {
    /// Reads a header of either dialect, leaving `reader` at the first record.
    pub fn read_from<R: Read + ?Sized>(reader: &mut R) -> Result<Self, FormatError> {
        let dialect = Dialect::detect(reader, KIND)?;
        let mut version = [0u8; 1];
        reader
            .read_exact(&mut version)
            .map_err(|err| FormatError::from_read(KIND, err))?;
        Dialect::check_version(KIND, version[0])?;

        let metadata = match dialect {
            Dialect::Current => SignatureMetadata::from_json(&read_string(reader, KIND)?)?,
            Dialect::Legacy => {
                let chunk_hash_algorithm = read_string(reader, KIND)?;
                let rolling_checksum_algorithm = read_string(reader, KIND)?;
                let mut marker = [0u8; END_OF_METADATA.len()];
                reader
                    .read_exact(&mut marker)
                    .map_err(|err| FormatError::from_read(KIND, err))?;
                if &marker != END_OF_METADATA {
                    return Err(FormatError::corrupt(KIND, "missing end-of-metadata marker"));
                }
                SignatureMetadata {
                    chunk_hash_algorithm: chunk_hash_algorithm.parse()?,
                    rolling_checksum_algorithm: rolling_checksum_algorithm.parse()?,
                    base_file_hash: None,
                }
            }
        };
        logging::trace_proto!(
            %dialect,
            hash = %metadata.chunk_hash_algorithm,
            rolling = %metadata.rolling_checksum_algorithm,
            "parsed signature header"
        );
        Ok(Self { dialect, metadata })
    }

    /// Encodes the header in its dialect.
    ///
    /// The legacy dialect has no room for the basis hash, which is dropped.
    pub fn encode(&self) -> io::Result<Vec<u8>> {
        let mut out = Vec::with_capacity(128);
        out.extend_from_slice(self.dialect.magic(KIND));
        out.push(FORMAT_VERSION);
        match self.dialect {
            Dialect::Current => encode_string(&mut out, &self.metadata.to_json()?),
            Dialect::Legacy => {
                encode_string(&mut out, self.metadata.chunk_hash_algorithm.name());
                encode_string(&mut out, self.metadata.rolling_checksum_algorithm.name());
                out.extend_from_slice(END_OF_METADATA);
            }
        }
        Ok(out)
    }
}

/// Streaming signature encoder.
///
/// The header is written by [`write_metadata`](Self::write_metadata), then
/// each chunk by [`write_chunk`](Self::write_chunk) as it is produced.
#[derive(Debug)]
pub struct SignatureWriter<W> {
    inner: W,
    dialect: Dialect,
    hash_len: Option<usize>,
    scratch: Vec<u8>,
    chunks: u64,
}

impl<W: Write> SignatureWriter<W> {
    /// Creates a current-dialect writer.
    pub fn new(inner: W) -> Self {
        Self::with_dialect(inner, Dialect::Current)
    }

    /// Creates a legacy-dialect writer, for fixtures and interop tests.
    pub fn legacy(inner: W) -> Self {
        Self::with_dialect(inner, Dialect::Legacy)
    }

    fn with_dialect(inner: W, dialect: Dialect) -> Self {
        Self {
            inner,
            dialect,
            hash_len: None,
            scratch: Vec::new(),
            chunks: 0,
        }
    }

    /// Writes the header. Must be called once, before any chunk.
    pub fn write_metadata(&mut self, metadata: &SignatureMetadata) -> io::Result<()> {
        if self.hash_len.is_some() {
            return Err(io::Error::other("signature metadata already written"));
        }
        let header = SignatureHeader {
            dialect: self.dialect,
            metadata: metadata.clone(),
        };
        self.inner.write_all(&header.encode()?)?;
        self.hash_len = Some(metadata.chunk_hash_algorithm.hash_len());
        Ok(())
    }

    /// Writes one chunk record.
    pub fn write_chunk(&mut self, record: &ChunkRecord) -> io::Result<()> {
        let hash_len = self
            .hash_len
            .ok_or_else(|| io::Error::other("signature metadata must precede chunk records"))?;
        self.scratch.clear();
        record.encode(&mut self.scratch, hash_len)?;
        self.inner.write_all(&self.scratch)?;
        self.chunks += 1;
        Ok(())
    }

    /// Number of chunk records written so far.
    #[must_use]
    pub const fn chunks_written(&self) -> u64 {
        self.chunks
    }

    /// Dialect being written.
    #[must_use]
    pub const fn dialect(&self) -> Dialect {
        self.dialect
    }

    /// Flushes the underlying writer.
    pub fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }

    /// Returns a reference to the underlying writer.
    pub const fn get_ref(&self) -> &W {
        &self.inner
    }

    /// Returns a mutable reference to the underlying writer.
    pub fn get_mut(&mut self) -> &mut W {
        &mut self.inner
    }

    /// Unwraps the underlying writer.
    pub fn into_inner(self) -> W {
        self.inner
    }
}
