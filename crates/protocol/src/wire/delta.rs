//! crates/protocol/src/wire/delta.rs
//!
//! Delta header and command encoding.
//!
//! ```text
//! current: FRSNCDLTA 0x01 <string: metadata json>
//! legacy:  OCTODELTA 0x01 <string: hash name> [hash_len: i32 LE] <hash> ">>>"
//! copy:    0x60 [start: i64 LE][length: i64 LE]
//! data:    0x80 [length: i64 LE] <payload>
//! ```
//!
//! Legacy deltas carry a single hash name: it is both the chunk hash and the
//! algorithm of the expected output digest.

use std::io::{self, Read, Write};

use crate::dialect::{Dialect, END_OF_METADATA, FORMAT_VERSION, StreamKind};
use crate::error::FormatError;
use crate::metadata::{DeltaMetadata, FileHash};
use crate::sink::DeltaSink;
use crate::varint::{encode_string, read_string};

const KIND: StreamKind = StreamKind::Delta;

/// Tag of a copy command.
pub const COPY_COMMAND: u8 = 0x60;
/// Tag of a data command.
pub const DATA_COMMAND: u8 = 0x80;

/// Size of a copy command including its tag.
pub const COPY_COMMAND_LEN: usize = 1 + 8 + 8;
/// Size of a data command header including its tag.
pub const DATA_HEADER_LEN: usize = 1 + 8;

/// A decoded delta command.
///
/// Data payloads are not carried here; they are streamed from the reader.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum DeltaCommand {
    /// Copy `length` bytes of the basis starting at `start`.
    Copy {
        /// Basis offset.
        start: u64,
        /// Bytes to copy.
        length: u64,
    },
    /// `length` literal bytes follow in the stream.
    Data {
        /// Payload size.
        length: u64,
    },
}

/// Appends a copy command.
pub fn encode_copy(out: &mut Vec<u8>, start: u64, length: u64) -> io::Result<()> {
    out.push(COPY_COMMAND);
    out.extend_from_slice(&to_wire_i64(start)?.to_le_bytes());
    out.extend_from_slice(&to_wire_i64(length)?.to_le_bytes());
    Ok(())
}

/// Appends a data command header. The payload follows it verbatim.
pub fn encode_data_header(out: &mut Vec<u8>, length: u64) -> io::Result<()> {
    out.push(DATA_COMMAND);
    out.extend_from_slice(&to_wire_i64(length)?.to_le_bytes());
    Ok(())
}

fn to_wire_i64(value: u64) -> io::Result<i64> {
    i64::try_from(value).map_err(|_| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("{value} does not fit a signed 64-bit delta field"),
        )
    })
}

/// Encodes a delta header in `dialect`.
///
/// The legacy dialect can only express an expected hash computed with the
/// chunk hash algorithm and has no room for the basis hash.
pub fn encode_header(dialect: Dialect, metadata: &DeltaMetadata) -> io::Result<Vec<u8>> {
    let mut out = Vec::with_capacity(160);
    out.extend_from_slice(dialect.magic(KIND));
    out.push(FORMAT_VERSION);
    match dialect {
        Dialect::Current => encode_string(&mut out, &metadata.to_json()?),
        Dialect::Legacy => {
            let expected = &metadata.expected_file_hash;
            if expected.algorithm != metadata.hash_algorithm {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidInput,
                    format!(
                        "legacy deltas need the expected hash in {}, got {}",
                        metadata.hash_algorithm, expected.algorithm
                    ),
                ));
            }
            encode_string(&mut out, metadata.hash_algorithm.name());
            out.extend_from_slice(&(expected.digest.len() as i32).to_le_bytes());
            out.extend_from_slice(&expected.digest);
            out.extend_from_slice(END_OF_METADATA);
        }
    }
    Ok(out)
}

/// Streaming delta encoder.
#[derive(Debug)]
pub struct DeltaWriter<W> {
    inner: W,
    dialect: Dialect,
    header_written: bool,
    scratch: Vec<u8>,
}

impl<W: Write> DeltaWriter<W> {
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
            header_written: false,
            scratch: Vec::with_capacity(COPY_COMMAND_LEN),
        }
    }

    /// Dialect being written.
    #[must_use]
    pub const fn dialect(&self) -> Dialect {
        self.dialect
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

    fn ensure_header(&self) -> io::Result<()> {
        if self.header_written {
            Ok(())
        } else {
            Err(io::Error::other("delta metadata must precede commands"))
        }
    }
}

impl<W: Write> DeltaSink for DeltaWriter<W> {
    fn write_metadata(&mut self, metadata: &DeltaMetadata) -> io::Result<()> {
        if self.header_written {
            return Err(io::Error::other("delta metadata already written"));
        }
        self.inner.write_all(&encode_header(self.dialect, metadata)?)?;
        self.header_written = true;
        Ok(())
    }

    fn write_copy(&mut self, start: u64, length: u64) -> io::Result<()> {
        self.ensure_header()?;
        self.scratch.clear();
        encode_copy(&mut self.scratch, start, length)?;
        self.inner.write_all(&self.scratch)
    }

    fn write_data(&mut self, payload: &[u8]) -> io::Result<()> {
        self.ensure_header()?;
        self.scratch.clear();
        encode_data_header(&mut self.scratch, payload.len() as u64)?;
        self.inner.write_all(&self.scratch)?;
        self.inner.write_all(payload)
    }

    fn finish(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

fn decode_command(tag: u8, fields: [u8; 16]) -> Result<DeltaCommand, FormatError> {
    let field = |name: &'static str, bytes: &[u8]| -> Result<u64, FormatError> {
        let mut raw = [0u8; 8];
        raw.copy_from_slice(bytes);
        let value = i64::from_le_bytes(raw);
        u64::try_from(value).map_err(|_| FormatError::NegativeField { field: name, value })
    };
    match tag {
        COPY_COMMAND => Ok(DeltaCommand::Copy {
            start: field("start offset", &fields[..8])?,
            length: field("length", &fields[8..])?,
        }),
        DATA_COMMAND => Ok(DeltaCommand::Data {
            length: field("length", &fields[..8])?,
        }),
        other => Err(FormatError::UnknownCommand(other)),
    }
}

const fn command_body_len(tag: u8) -> usize {
    match tag {
        COPY_COMMAND => 16,
        _ => 8,
    }
}

fn legacy_metadata(hash_name: &str, digest: Vec<u8>) -> Result<DeltaMetadata, FormatError> {
    let hash_algorithm: checksums::HashAlgorithm = hash_name.parse()?;
    if digest.len() != hash_algorithm.hash_len() {
        return Err(FormatError::corrupt(
            KIND,
            format!(
                "expected hash is {} bytes but {hash_algorithm} digests are {}",
                digest.len(),
                hash_algorithm.hash_len()
            ),
        ));
    }
    Ok(DeltaMetadata {
        hash_algorithm,
        expected_file_hash: FileHash {
            algorithm: hash_algorithm,
            digest,
        },
        base_file_hash: None,
    })
}

fn legacy_hash_len(raw: [u8; 4]) -> Result<usize, FormatError> {
    let len = i32::from_le_bytes(raw);
    usize::try_from(len)
        .ok()
        .filter(|len| *len <= 64)
        .ok_or_else(|| FormatError::corrupt(KIND, format!("invalid expected hash length {len}")))
}

/// Pull-based delta decoder.
///
/// [`next_command`](Self::next_command) yields commands in stream order. After
/// a [`DeltaCommand::Data`] the payload is available through
/// [`read_data`](Self::read_data); whatever is left unread is skipped by the
/// next call to `next_command`.
#[derive(Debug)]
pub struct DeltaReader<R> {
    inner: R,
    dialect: Dialect,
    metadata: DeltaMetadata,
    payload_remaining: u64,
}

impl<R: Read> DeltaReader<R> {
    /// Parses the header of either dialect.
    pub fn new(mut inner: R) -> Result<Self, FormatError> {
        let dialect = Dialect::detect(&mut inner, KIND)?;
        let mut version = [0u8; 1];
        read_exact(&mut inner, &mut version)?;
        Dialect::check_version(KIND, version[0])?;

        let metadata = match dialect {
            Dialect::Current => DeltaMetadata::from_json(&read_string(&mut inner, KIND)?)?,
            Dialect::Legacy => {
                let hash_name = read_string(&mut inner, KIND)?;
                let mut raw_len = [0u8; 4];
                read_exact(&mut inner, &mut raw_len)?;
                let mut digest = vec![0u8; legacy_hash_len(raw_len)?];
                read_exact(&mut inner, &mut digest)?;
                let mut marker = [0u8; END_OF_METADATA.len()];
                read_exact(&mut inner, &mut marker)?;
                if &marker != END_OF_METADATA {
                    return Err(FormatError::corrupt(KIND, "missing end-of-metadata marker"));
                }
                legacy_metadata(&hash_name, digest)?
            }
        };
        logging::trace_proto!(%dialect, hash = %metadata.hash_algorithm, "parsed delta header");
        Ok(Self {
            inner,
            dialect,
            metadata,
            payload_remaining: 0,
        })
    }

    /// Header metadata.
    #[must_use]
    pub const fn metadata(&self) -> &DeltaMetadata {
        &self.metadata
    }

    /// Dialect the delta was written in.
    #[must_use]
    pub const fn dialect(&self) -> Dialect {
        self.dialect
    }

    /// Payload bytes of the current data command not yet read.
    #[must_use]
    pub const fn payload_remaining(&self) -> u64 {
        self.payload_remaining
    }

    /// Returns the next command, or `None` at a clean end of stream.
    pub fn next_command(&mut self) -> Result<Option<DeltaCommand>, FormatError> {
        self.skip_payload()?;
        let mut tag = [0u8; 1];
        loop {
            match self.inner.read(&mut tag) {
                Ok(0) => return Ok(None),
                Ok(_) => break,
                Err(err) if err.kind() == io::ErrorKind::Interrupted => {}
                Err(err) => return Err(FormatError::Io(err)),
            }
        }
        if tag[0] != COPY_COMMAND && tag[0] != DATA_COMMAND {
            return Err(FormatError::UnknownCommand(tag[0]));
        }
        let mut fields = [0u8; 16];
        read_exact(&mut self.inner, &mut fields[..command_body_len(tag[0])])?;
        let command = decode_command(tag[0], fields)?;
        if let DeltaCommand::Data { length } = command {
            self.payload_remaining = length;
        }
        Ok(Some(command))
    }

    /// Reads payload of the current data command into `buf`.
    ///
    /// Returns 0 once the payload is exhausted. A stream that ends early is
    /// reported as [`FormatError::Truncated`].
    pub fn read_data(&mut self, buf: &mut [u8]) -> Result<usize, FormatError> {
        let wanted = buf.len().min(usize::try_from(self.payload_remaining).unwrap_or(usize::MAX));
        if wanted == 0 {
            return Ok(0);
        }
        let read = loop {
            match self.inner.read(&mut buf[..wanted]) {
                Ok(0) => return Err(FormatError::Truncated(KIND)),
                Ok(read) => break read,
                Err(err) if err.kind() == io::ErrorKind::Interrupted => {}
                Err(err) => return Err(FormatError::Io(err)),
            }
        };
        self.payload_remaining -= read as u64;
        Ok(read)
    }

    fn skip_payload(&mut self) -> Result<(), FormatError> {
        if self.payload_remaining == 0 {
            return Ok(());
        }
        let skipped = io::copy(
            &mut (&mut self.inner).take(self.payload_remaining),
            &mut io::sink(),
        )?;
        if skipped != self.payload_remaining {
            return Err(FormatError::Truncated(KIND));
        }
        self.payload_remaining = 0;
        Ok(())
    }

    /// Unwraps the underlying reader.
    pub fn into_inner(self) -> R {
        self.inner
    }
}

fn read_exact<R: Read + ?Sized>(reader: &mut R, buf: &mut [u8]) -> Result<(), FormatError> {
    reader
        .read_exact(buf)
        .map_err(|err| FormatError::from_read(KIND, err))
}

#[cfg(feature = "async")]
mod async_reader {
    use tokio::io::{AsyncRead, AsyncReadExt};

    use super::{
        COPY_COMMAND, DATA_COMMAND, DeltaCommand, Dialect, END_OF_METADATA, KIND,
        command_body_len, decode_command, legacy_hash_len, legacy_metadata,
    };
    use crate::error::FormatError;
    use crate::metadata::DeltaMetadata;
    use crate::varint::{VarintDecoder, checked_string_len, string_from_bytes};

    /// Async counterpart of [`DeltaReader`](super::DeltaReader).
    #[derive(Debug)]
    pub struct AsyncDeltaReader<R> {
        inner: R,
        dialect: Dialect,
        metadata: DeltaMetadata,
        payload_remaining: u64,
    }

    impl<R: AsyncRead + Unpin> AsyncDeltaReader<R> {
        /// Parses the header of either dialect.
        pub async fn new(mut inner: R) -> Result<Self, FormatError> {
            let dialect = Dialect::detect_async(&mut inner, KIND).await?;
            let mut version = [0u8; 1];
            read_exact(&mut inner, &mut version).await?;
            Dialect::check_version(KIND, version[0])?;

            let metadata = match dialect {
                Dialect::Current => {
                    DeltaMetadata::from_json(&read_string(&mut inner).await?)?
                }
                Dialect::Legacy => {
                    let hash_name = read_string(&mut inner).await?;
                    let mut raw_len = [0u8; 4];
                    read_exact(&mut inner, &mut raw_len).await?;
                    let mut digest = vec![0u8; legacy_hash_len(raw_len)?];
                    read_exact(&mut inner, &mut digest).await?;
                    let mut marker = [0u8; END_OF_METADATA.len()];
                    read_exact(&mut inner, &mut marker).await?;
                    if &marker != END_OF_METADATA {
                        return Err(FormatError::corrupt(KIND, "missing end-of-metadata marker"));
                    }
                    legacy_metadata(&hash_name, digest)?
                }
            };
            Ok(Self {
                inner,
                dialect,
                metadata,
                payload_remaining: 0,
            })
        }

        /// Header metadata.
        #[must_use]
        pub const fn metadata(&self) -> &DeltaMetadata {
            &self.metadata
        }

        /// Dialect the delta was written in.
        #[must_use]
        pub const fn dialect(&self) -> Dialect {
            self.dialect
        }

        /// Returns the next command, or `None` at a clean end of stream.
        pub async fn next_command(&mut self) -> Result<Option<DeltaCommand>, FormatError> {
            self.skip_payload().await?;
            let mut tag = [0u8; 1];
            if self.inner.read(&mut tag).await? == 0 {
                return Ok(None);
            }
            if tag[0] != COPY_COMMAND && tag[0] != DATA_COMMAND {
                return Err(FormatError::UnknownCommand(tag[0]));
            }
            let mut fields = [0u8; 16];
            read_exact(&mut self.inner, &mut fields[..command_body_len(tag[0])]).await?;
            let command = decode_command(tag[0], fields)?;
            if let DeltaCommand::Data { length } = command {
                self.payload_remaining = length;
            }
            Ok(Some(command))
        }

        /// Reads payload of the current data command into `buf`.
        pub async fn read_data(&mut self, buf: &mut [u8]) -> Result<usize, FormatError> {
            let wanted = buf
                .len()
                .min(usize::try_from(self.payload_remaining).unwrap_or(usize::MAX));
            if wanted == 0 {
                return Ok(0);
            }
            let read = self.inner.read(&mut buf[..wanted]).await?;
            if read == 0 {
                return Err(FormatError::Truncated(KIND));
            }
            self.payload_remaining -= read as u64;
            Ok(read)
        }

        async fn skip_payload(&mut self) -> Result<(), FormatError> {
            if self.payload_remaining == 0 {
                return Ok(());
            }
            let skipped = tokio::io::copy(
                &mut (&mut self.inner).take(self.payload_remaining),
                &mut tokio::io::sink(),
            )
            .await?;
            if skipped != self.payload_remaining {
                return Err(FormatError::Truncated(KIND));
            }
            self.payload_remaining = 0;
            Ok(())
        }
    }

    async fn read_exact<R: AsyncRead + Unpin>(reader: &mut R, buf: &mut [u8]) -> Result<(), FormatError> {
        reader
            .read_exact(buf)
            .await
            .map(|_| ())
            .map_err(|err| FormatError::from_read(KIND, err))
    }

    async fn read_string<R: AsyncRead + Unpin>(reader: &mut R) -> Result<String, FormatError> {
        let mut decoder = VarintDecoder::default();
        let len = loop {
            let mut byte = [0u8; 1];
            read_exact(reader, &mut byte).await?;
            if let Some(len) = decoder.push(byte[0], KIND)? {
                break checked_string_len(len, KIND)?;
            }
        };
        let mut bytes = vec![0u8; len];
        read_exact(reader, &mut bytes).await?;
        string_from_bytes(bytes, KIND)
    }
}

#[cfg(feature = "async")]
pub use async_reader::AsyncDeltaReader;

#[cfg(test)]
mod tests {
    use checksums::HashAlgorithm;

    use super::*;

    fn metadata() -> DeltaMetadata {
        DeltaMetadata {
            hash_algorithm: HashAlgorithm::Sha1,
            expected_file_hash: FileHash::compute(HashAlgorithm::Sha1, b"target"),
            base_file_hash: None,
        }
    }

    fn encoded(dialect: Dialect) -> Vec<u8> {
        let mut writer = DeltaWriter::with_dialect(Vec::new(), dialect);
        writer.write_metadata(&metadata()).expect("header");
        writer.write_copy(4096, 2048).expect("copy");
        writer.write_data(b"literal").expect("data");
        writer.write_copy(0, 10).expect("copy");
        writer.finish().expect("finish");
        writer.into_inner()
    }

    #[test]
    fn copy_command_layout() {
        let mut out = Vec::new();
        encode_copy(&mut out, 1, 2).expect("encode");
        assert_eq!(out.len(), COPY_COMMAND_LEN);
        assert_eq!(out[0], 0x60);
        assert_eq!(&out[1..9], &1i64.to_le_bytes());
        assert_eq!(&out[9..], &2i64.to_le_bytes());
    }

    #[test]
    fn data_header_layout() {
        let mut out = Vec::new();
        encode_data_header(&mut out, 7).expect("encode");
        assert_eq!(out, [0x80, 7, 0, 0, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn both_dialects_decode_to_the_same_commands() {
        for dialect in [Dialect::Current, Dialect::Legacy] {
            let bytes = encoded(dialect);
            let mut reader = DeltaReader::new(bytes.as_slice()).expect("header");
            assert_eq!(reader.dialect(), dialect);
            assert_eq!(reader.metadata(), &metadata());
            assert_eq!(
                reader.next_command().expect("copy"),
                Some(DeltaCommand::Copy { start: 4096, length: 2048 })
            );
            assert_eq!(reader.next_command().expect("data"), Some(DeltaCommand::Data { length: 7 }));
            let mut payload = [0u8; 16];
            let read = reader.read_data(&mut payload).expect("payload");
            assert_eq!(&payload[..read], b"literal");
            assert_eq!(reader.read_data(&mut payload).expect("exhausted"), 0);
            assert_eq!(
                reader.next_command().expect("copy"),
                Some(DeltaCommand::Copy { start: 0, length: 10 })
            );
            assert_eq!(reader.next_command().expect("end"), None);
        }
    }

    #[test]
    fn unread_payload_is_skipped() {
        let bytes = encoded(Dialect::Current);
        let mut reader = DeltaReader::new(bytes.as_slice()).expect("header");
        reader.next_command().expect("copy");
        reader.next_command().expect("data");
        assert_eq!(reader.payload_remaining(), 7);
        assert_eq!(
            reader.next_command().expect("copy after skip"),
            Some(DeltaCommand::Copy { start: 0, length: 10 })
        );
    }

    #[test]
    fn legacy_header_layout() {
        let bytes = encoded(Dialect::Legacy);
        assert!(bytes.starts_with(b"OCTODELTA\x01\x04SHA1\x14\x00\x00\x00"));
        let digest_end = 9 + 1 + 5 + 4 + 20;
        assert_eq!(&bytes[digest_end..digest_end + 3], b">>>");
    }

    #[test]
    fn legacy_writer_refuses_mismatched_expected_hash() {
        let mut metadata = metadata();
        metadata.expected_file_hash = FileHash::compute(HashAlgorithm::Md5, b"target");
        let mut writer = DeltaWriter::legacy(Vec::new());
        let err = writer.write_metadata(&metadata).expect_err("mismatch");
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
    }

    #[test]
    fn unknown_tag_is_rejected() {
        let mut bytes = encoded(Dialect::Current);
        let header_len = bytes.len() - (COPY_COMMAND_LEN * 2 + DATA_HEADER_LEN + 7);
        bytes[header_len] = 0x42;
        let mut reader = DeltaReader::new(bytes.as_slice()).expect("header");
        assert!(matches!(reader.next_command(), Err(FormatError::UnknownCommand(0x42))));
    }

    #[test]
    fn negative_length_is_rejected() {
        let mut writer = DeltaWriter::new(Vec::new());
        writer.write_metadata(&metadata()).expect("header");
        let mut bytes = writer.into_inner();
        bytes.push(COPY_COMMAND);
        bytes.extend_from_slice(&0i64.to_le_bytes());
        bytes.extend_from_slice(&(-1i64).to_le_bytes());
        let mut reader = DeltaReader::new(bytes.as_slice()).expect("header");
        assert!(matches!(
            reader.next_command(),
            Err(FormatError::NegativeField { value: -1, .. })
        ));
    }

    #[test]
    fn truncated_payload_is_reported() {
        let mut bytes = encoded(Dialect::Current);
        bytes.truncate(bytes.len() - COPY_COMMAND_LEN - 3);
        let mut reader = DeltaReader::new(bytes.as_slice()).expect("header");
        reader.next_command().expect("copy");
        reader.next_command().expect("data");
        assert!(matches!(reader.next_command(), Err(FormatError::Truncated(StreamKind::Delta))));
    }

    #[test]
    fn commands_require_metadata_first() {
        let mut writer = DeltaWriter::new(Vec::new());
        assert!(writer.write_copy(0, 1).is_err());
        assert!(writer.write_data(b"x").is_err());
    }

    #[cfg(feature = "async")]
    #[tokio::test]
    async fn async_reader_matches_blocking_reader() {
        for dialect in [Dialect::Current, Dialect::Legacy] {
            let bytes = encoded(dialect);
            let mut blocking = DeltaReader::new(bytes.as_slice()).expect("header");
            let mut reader = AsyncDeltaReader::new(bytes.as_slice()).await.expect("header");
            assert_eq!(reader.metadata(), blocking.metadata());
            loop {
                let expected = blocking.next_command().expect("blocking");
                let actual = reader.next_command().await.expect("async");
                assert_eq!(actual, expected);
                if actual.is_none() {
                    break;
                }
            }
        }
    }
}
