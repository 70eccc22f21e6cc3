use std::io;

use checksums::UnsupportedAlgorithm;
use thiserror::Error;

use crate::dialect::StreamKind;

/// Errors raised while decoding signature or delta streams.
#[derive(Debug, Error)]
pub enum FormatError {
    /// The stream does not start with a known magic for its kind.
    #[error("unrecognised {kind} header {found:02x?}")]
    BadMagic {
        /// Stream being parsed.
        kind: StreamKind,
        /// Bytes found where the magic was expected.
        found: Vec<u8>,
    },
    /// The version byte after the magic is not supported.
    #[error("unsupported {kind} format version {version}")]
    BadVersion {
        /// Stream being parsed.
        kind: StreamKind,
        /// Version byte found.
        version: u8,
    },
    /// The metadata block could not be decoded.
    #[error("corrupt {kind} metadata: {reason}")]
    CorruptMetadata {
        /// Stream being parsed.
        kind: StreamKind,
        /// What was wrong with it.
        reason: String,
    },
    /// The bytes following the signature metadata do not divide into records.
    #[error(
        "signature body of {remaining} bytes is not a multiple of the {record_size}-byte record size"
    )]
    MisalignedRecords {
        /// Bytes between the end of the metadata and the end of the stream.
        remaining: u64,
        /// Size of one chunk record.
        record_size: usize,
    },
    /// A signature record carries a chunk length below 1.
    #[error("invalid chunk length {0} in signature record")]
    InvalidChunkLength(i16),
    /// A delta command tag is neither copy nor data.
    #[error("unknown delta command 0x{0:02x}")]
    UnknownCommand(u8),
    /// A delta command carries a negative offset or length.
    #[error("negative {field} {value} in delta command")]
    NegativeField {
        /// Name of the offending field.
        field: &'static str,
        /// Value read from the stream.
        value: i64,
    },
    /// The stream ended in the middle of a header or record.
    #[error("{0} stream ended unexpectedly")]
    Truncated(StreamKind),
    /// Metadata names an algorithm outside the registry.
    #[error(transparent)]
    Algorithm(#[from] UnsupportedAlgorithm),
    /// Underlying reader failed.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl FormatError {
    pub(crate) fn corrupt(kind: StreamKind, reason: impl Into<String>) -> Self {
        Self::CorruptMetadata {
            kind,
            reason: reason.into(),
        }
    }

    /// Maps an end-of-stream read failure to [`FormatError::Truncated`].
    pub(crate) fn from_read(kind: StreamKind, err: io::Error) -> Self {
        if err.kind() == io::ErrorKind::UnexpectedEof {
            Self::Truncated(kind)
        } else {
            Self::Io(err)
        }
    }
}

impl From<FormatError> for io::Error {
    fn from(err: FormatError) -> Self {
        match err {
            FormatError::Io(inner) => inner,
            other => Self::new(io::ErrorKind::InvalidData, other),
        }
    }
}
