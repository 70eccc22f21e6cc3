//! crates/protocol/src/varint.rs
//!
//! Length-prefixed strings as they appear in both metadata dialects.
//!
//! A string is its UTF-8 byte length encoded as a 7-bit varint (low group
//! first, high bit set on every byte except the last) followed by the bytes.
//! The length is a signed 32-bit quantity on the wire, so at most five
//! groups are accepted.

use std::io::Read;

use crate::dialect::StreamKind;
use crate::error::FormatError;

/// Upper bound on an accepted metadata string, in bytes.
pub const MAX_STRING_LEN: usize = 1 << 20;

const MAX_VARINT_BYTES: usize = 5;

/// Appends the varint encoding of `value`.
pub fn encode_varint(out: &mut Vec<u8>, mut value: u32) {
    while value >= 0x80 {
        out.push((value as u8) | 0x80);
        value >>= 7;
    }
    out.push(value as u8);
}

/// Appends a length-prefixed string.
pub fn encode_string(out: &mut Vec<u8>, value: &str) {
    encode_varint(out, value.len() as u32);
    out.extend_from_slice(value.as_bytes());
}

/// Incremental varint decoder fed one byte at a time.
///
/// Keeps the blocking and async readers on the same decoding rules.
#[derive(Debug, Default)]
pub struct VarintDecoder {
    value: u32,
    consumed: usize,
}

impl VarintDecoder {
    /// Feeds the next byte. Returns the decoded value once the final group
    /// has been seen.
    pub fn push(&mut self, byte: u8, kind: StreamKind) -> Result<Option<u32>, FormatError> {
        if self.consumed == MAX_VARINT_BYTES {
            return Err(FormatError::corrupt(kind, "string length varint is too long"));
        }
        self.value |= u32::from(byte & 0x7f) << (7 * self.consumed);
        self.consumed += 1;
        if byte & 0x80 == 0 {
            Ok(Some(self.value))
        } else {
            Ok(None)
        }
    }
}

/// Validates a decoded string length against [`MAX_STRING_LEN`].
pub fn checked_string_len(len: u32, kind: StreamKind) -> Result<usize, FormatError> {
    let len = len as usize;
    if len > MAX_STRING_LEN {
        return Err(FormatError::corrupt(
            kind,
            format!("string of {len} bytes exceeds the {MAX_STRING_LEN}-byte limit"),
        ));
    }
    Ok(len)
}

/// Decodes UTF-8 string bytes.
pub fn string_from_bytes(bytes: Vec<u8>, kind: StreamKind) -> Result<String, FormatError> {
    String::from_utf8(bytes).map_err(|_| FormatError::corrupt(kind, "string is not valid UTF-8"))
}

/// Reads a varint from a blocking reader.
pub fn read_varint<R: Read + ?Sized>(reader: &mut R, kind: StreamKind) -> Result<u32, FormatError> {
    let mut decoder = VarintDecoder::default();
    loop {
        let mut byte = [0u8; 1];
        reader
            .read_exact(&mut byte)
            .map_err(|err| FormatError::from_read(kind, err))?;
        if let Some(value) = decoder.push(byte[0], kind)? {
            return Ok(value);
        }
    }
}

/// Reads a length-prefixed string from a blocking reader.
pub fn read_string<R: Read + ?Sized>(reader: &mut R, kind: StreamKind) -> Result<String, FormatError> {
    let len = checked_string_len(read_varint(reader, kind)?, kind)?;
    let mut bytes = vec![0u8; len];
    reader
        .read_exact(&mut bytes)
        .map_err(|err| FormatError::from_read(kind, err))?;
    string_from_bytes(bytes, kind)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_byte_lengths() {
        let mut out = Vec::new();
        encode_varint(&mut out, 0x7f);
        assert_eq!(out, [0x7f]);
    }

    #[test]
    fn multi_byte_lengths_are_low_group_first() {
        let mut out = Vec::new();
        encode_varint(&mut out, 300);
        assert_eq!(out, [0xac, 0x02]);
        assert_eq!(read_varint(&mut out.as_slice(), StreamKind::Delta).expect("decode"), 300);
    }

    #[test]
    fn strings_round_trip() {
        let mut out = Vec::new();
        encode_string(&mut out, "Adler32");
        assert_eq!(out[0], 7);
        let decoded = read_string(&mut out.as_slice(), StreamKind::Signature).expect("decode");
        assert_eq!(decoded, "Adler32");
    }

    #[test]
    fn overlong_varint_is_rejected() {
        let bytes = [0x80u8, 0x80, 0x80, 0x80, 0x80, 0x01];
        let err = read_varint(&mut bytes.as_slice(), StreamKind::Signature).expect_err("too long");
        assert!(matches!(err, FormatError::CorruptMetadata { .. }));
    }

    #[test]
    fn short_string_body_is_truncation() {
        let bytes = [5u8, b'a', b'b'];
        let err = read_string(&mut bytes.as_slice(), StreamKind::Delta).expect_err("short");
        assert!(matches!(err, FormatError::Truncated(StreamKind::Delta)));
    }

    #[test]
    fn oversized_string_is_rejected_before_allocation() {
        let mut bytes = Vec::new();
        encode_varint(&mut bytes, (MAX_STRING_LEN + 1) as u32);
        let err = read_string(&mut bytes.as_slice(), StreamKind::Delta).expect_err("too large");
        assert!(matches!(err, FormatError::CorruptMetadata { .. }));
    }
}
