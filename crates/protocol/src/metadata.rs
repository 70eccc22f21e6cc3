//! crates/protocol/src/metadata.rs
//!
//! Typed signature and delta metadata plus their current-dialect JSON form.
//!
//! The JSON blob uses camelCase keys and base64 for digests:
//!
//! ```text
//! {"chunkHashAlgorithm":"XXH64","rollingChecksumAlgorithm":"Adler32",
//!  "baseFileHashAlgorithm":"MD5","baseFileHash":"1B2M2Y8AsgTpgAmY7PhCfg=="}
//! ```
//!
//! Algorithm names are resolved while parsing, so metadata naming an unknown
//! algorithm is rejected before any record is read.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use checksums::{HashAlgorithm, RollingChecksumAlgorithm};
use serde::{Deserialize, Serialize};

use crate::dialect::StreamKind;
use crate::error::FormatError;

/// A whole-file digest together with the algorithm that produced it.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FileHash {
    /// Algorithm used.
    pub algorithm: HashAlgorithm,
    /// Digest bytes.
    pub digest: Vec<u8>,
}

impl FileHash {
    /// Hashes an in-memory buffer.
    #[must_use]
    pub fn compute(algorithm: HashAlgorithm, data: &[u8]) -> Self {
        Self {
            algorithm,
            digest: algorithm.compute(data),
        }
    }

    fn from_wire(
        kind: StreamKind,
        field: &str,
        algorithm: Option<&str>,
        digest: Option<&str>,
    ) -> Result<Option<Self>, FormatError> {
        let (algorithm, digest) = match (algorithm, digest) {
            (None, None) => return Ok(None),
            (Some(algorithm), Some(digest)) => (algorithm, digest),
            _ => {
                return Err(FormatError::corrupt(
                    kind,
                    format!("{field} and its algorithm must appear together"),
                ));
            }
        };
        let algorithm = HashAlgorithm::from_name(algorithm)?;
        let digest = STANDARD
            .decode(digest)
            .map_err(|err| FormatError::corrupt(kind, format!("{field} is not base64: {err}")))?;
        if digest.len() != algorithm.hash_len() {
            return Err(FormatError::corrupt(
                kind,
                format!(
                    "{field} is {} bytes but {algorithm} digests are {}",
                    digest.len(),
                    algorithm.hash_len()
                ),
            ));
        }
        Ok(Some(Self { algorithm, digest }))
    }

    fn to_wire(hash: Option<&Self>) -> (Option<String>, Option<String>) {
        hash.map_or((None, None), |hash| {
            (
                Some(hash.algorithm.name().to_owned()),
                Some(STANDARD.encode(&hash.digest)),
            )
        })
    }
}

/// Metadata carried in a signature header.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SignatureMetadata {
    /// Strong hash stored in every chunk record.
    pub chunk_hash_algorithm: HashAlgorithm,
    /// Rolling checksum stored in every chunk record.
    pub rolling_checksum_algorithm: RollingChecksumAlgorithm,
    /// Digest of the whole basis. Absent in legacy signatures.
    pub base_file_hash: Option<FileHash>,
}

impl SignatureMetadata {
    /// Encodes the current-dialect JSON blob.
    pub fn to_json(&self) -> serde_json::Result<String> {
        let (base_file_hash_algorithm, base_file_hash) = FileHash::to_wire(self.base_file_hash.as_ref());
        let wire = SignatureMetadataWire {
            chunk_hash_algorithm: self.chunk_hash_algorithm.name().to_owned(),
            rolling_checksum_algorithm: self.rolling_checksum_algorithm.name().to_owned(),
            base_file_hash_algorithm,
            base_file_hash,
        };
        serde_json::to_string(&wire)
    }

    /// Decodes the current-dialect JSON blob.
    pub fn from_json(json: &str) -> Result<Self, FormatError> {
        let kind = StreamKind::Signature;
        let wire: SignatureMetadataWire = serde_json::from_str(json)
            .map_err(|err| FormatError::corrupt(kind, err.to_string()))?;
        Ok(Self {
            chunk_hash_algorithm: HashAlgorithm::from_name(&wire.chunk_hash_algorithm)?,
            rolling_checksum_algorithm: RollingChecksumAlgorithm::from_name(
                &wire.rolling_checksum_algorithm,
            )?,
            base_file_hash: FileHash::from_wire(
                kind,
                "baseFileHash",
                wire.base_file_hash_algorithm.as_deref(),
                wire.base_file_hash.as_deref(),
            )?,
        })
    }

    /// Size in bytes of one chunk record under this metadata.
    #[must_use]
    pub const fn record_size(&self) -> usize {
        crate::wire::signature::record_size(self.chunk_hash_algorithm.hash_len())
    }
}

/// Metadata carried in a delta header.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DeltaMetadata {
    /// Chunk hash algorithm of the signature the delta was built against.
    pub hash_algorithm: HashAlgorithm,
    /// Digest the reconstructed output must match.
    pub expected_file_hash: FileHash,
    /// Basis digest copied from the signature, when it had one.
    pub base_file_hash: Option<FileHash>,
}

impl DeltaMetadata {
    /// Encodes the current-dialect JSON blob.
    pub fn to_json(&self) -> serde_json::Result<String> {
        let (base_file_hash_algorithm, base_file_hash) = FileHash::to_wire(self.base_file_hash.as_ref());
        let wire = DeltaMetadataWire {
            hash_algorithm: self.hash_algorithm.name().to_owned(),
            expected_file_hash_algorithm: Some(self.expected_file_hash.algorithm.name().to_owned()),
            expected_file_hash: Some(STANDARD.encode(&self.expected_file_hash.digest)),
            base_file_hash_algorithm,
            base_file_hash,
        };
        serde_json::to_string(&wire)
    }

    /// Decodes the current-dialect JSON blob.
    pub fn from_json(json: &str) -> Result<Self, FormatError> {
        let kind = StreamKind::Delta;
        let wire: DeltaMetadataWire = serde_json::from_str(json)
            .map_err(|err| FormatError::corrupt(kind, err.to_string()))?;
        let expected_file_hash = FileHash::from_wire(
            kind,
            "expectedFileHash",
            wire.expected_file_hash_algorithm.as_deref(),
            wire.expected_file_hash.as_deref(),
        )?
        .ok_or_else(|| FormatError::corrupt(kind, "expectedFileHash is missing"))?;
        Ok(Self {
            hash_algorithm: HashAlgorithm::from_name(&wire.hash_algorithm)?,
            expected_file_hash,
            base_file_hash: FileHash::from_wire(
                kind,
                "baseFileHash",
                wire.base_file_hash_algorithm.as_deref(),
                wire.base_file_hash.as_deref(),
            )?,
        })
    }
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SignatureMetadataWire {
    chunk_hash_algorithm: String,
    rolling_checksum_algorithm: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    base_file_hash_algorithm: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    base_file_hash: Option<String>,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DeltaMetadataWire {
    hash_algorithm: String,
    #[serde(default)]
    expected_file_hash_algorithm: Option<String>,
    #[serde(default)]
    expected_file_hash: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    base_file_hash_algorithm: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    base_file_hash: Option<String>,
}
