//! crates/protocol/src/dialect.rs
//!
//! Magic headers and dialect detection.
//!
//! Dialects are told apart by magic alone. Both magics of a stream kind have
//! the same length, so detection is a single fixed-size read. The version
//! byte is checked only after the dialect is known and never used to choose
//! between them.

use std::fmt;
use std::io::Read;

use crate::error::FormatError;

/// Magic of a current-dialect signature.
pub const SIGNATURE_MAGIC: &[u8; 7] = b"FRSNCSG";
/// Magic of a legacy-dialect signature.
pub const LEGACY_SIGNATURE_MAGIC: &[u8; 7] = b"OCTOSIG";
/// Magic of a current-dialect delta.
pub const DELTA_MAGIC: &[u8; 9] = b"FRSNCDLTA";
/// Magic of a legacy-dialect delta.
pub const LEGACY_DELTA_MAGIC: &[u8; 9] = b"OCTODELTA";
/// Version byte written after every magic.
pub const FORMAT_VERSION: u8 = 0x01;
/// Marker closing legacy metadata.
pub const END_OF_METADATA: &[u8; 3] = b">>>";

/// Which of the two stream kinds is being parsed.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum StreamKind {
    /// A signature stream.
    Signature,
    /// A delta stream.
    Delta,
}

impl fmt::Display for StreamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Signature => f.write_str("signature"),
            Self::Delta => f.write_str("delta"),
        }
    }
}

/// Wire dialect of a signature or delta.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum Dialect {
    /// JSON metadata blob, `FRSNC*` magic.
    #[default]
    Current,
    /// String-field metadata with end marker, `OCTO*` magic.
    Legacy,
}

impl Dialect {
    /// Magic written at the start of a stream of `kind` in this dialect.
    #[must_use]
    pub const fn magic(self, kind: StreamKind) -> &'static [u8] {
        match (self, kind) {
            (Self::Current, StreamKind::Signature) => SIGNATURE_MAGIC,
            (Self::Legacy, StreamKind::Signature) => LEGACY_SIGNATURE_MAGIC,
            (Self::Current, StreamKind::Delta) => DELTA_MAGIC,
            (Self::Legacy, StreamKind::Delta) => LEGACY_DELTA_MAGIC,
        }
    }

    /// Reads the magic of a stream of `kind` and returns its dialect.
    ///
    /// Exactly [`magic_len`] bytes are consumed.
    pub fn detect<R: Read + ?Sized>(reader: &mut R, kind: StreamKind) -> Result<Self, FormatError> {
        let mut buf = [0u8; MAX_MAGIC_LEN];
        let magic = &mut buf[..magic_len(kind)];
        reader
            .read_exact(magic)
            .map_err(|err| FormatError::from_read(kind, err))?;
        Self::from_magic(kind, magic)
    }

    /// Async counterpart of [`Dialect::detect`].
    #[cfg(feature = "async")]
    pub async fn detect_async<R>(reader: &mut R, kind: StreamKind) -> Result<Self, FormatError>
    where
        R: tokio::io::AsyncRead + Unpin + ?Sized,
    {
        use tokio::io::AsyncReadExt;

        let mut buf = [0u8; MAX_MAGIC_LEN];
        let magic = &mut buf[..magic_len(kind)];
        reader
            .read_exact(magic)
            .await
            .map_err(|err| FormatError::from_read(kind, err))?;
        Self::from_magic(kind, magic)
    }

    fn from_magic(kind: StreamKind, magic: &[u8]) -> Result<Self, FormatError> {
        [Self::Current, Self::Legacy]
            .into_iter()
            .find(|dialect| dialect.magic(kind) == magic)
            .ok_or_else(|| FormatError::BadMagic {
                kind,
                found: magic.to_vec(),
            })
    }

    /// Reads and checks the version byte that follows the magic.
    pub(crate) fn check_version(kind: StreamKind, version: u8) -> Result<(), FormatError> {
        if version == FORMAT_VERSION {
            Ok(())
        } else {
            Err(FormatError::BadVersion { kind, version })
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Current => f.write_str("current"),
            Self::Legacy => f.write_str("legacy"),
        }
    }
}

const MAX_MAGIC_LEN: usize = 9;

/// Length of the magic opening every stream of `kind`, in either dialect.
#[must_use]
pub const fn magic_len(kind: StreamKind) -> usize {
    match kind {
        StreamKind::Signature => SIGNATURE_MAGIC.len(),
        StreamKind::Delta => DELTA_MAGIC.len(),
    }
}
