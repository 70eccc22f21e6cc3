use std::fmt;

use thiserror::Error;

/// Family an algorithm name was looked up in.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum AlgorithmKind {
    /// Weak rolling checksum (`Adler32`, `Adler32V2`).
    RollingChecksum,
    /// Strong hash (`XXH64`, `XXH3`, `MD5`, `SHA1`).
    Hash,
}

impl fmt::Display for AlgorithmKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RollingChecksum => f.write_str("rolling checksum"),
            Self::Hash => f.write_str("hash"),
        }
    }
}

/// Error returned when an algorithm name is not in the registry.
#[derive(Clone, Debug, Eq, PartialEq, Error)]
#[error("unsupported {kind} algorithm '{name}'")]
pub struct UnsupportedAlgorithm {
    kind: AlgorithmKind,
    name: String,
}

impl UnsupportedAlgorithm {
    pub(crate) fn new(kind: AlgorithmKind, name: &str) -> Self {
        Self {
            kind,
            name: name.to_owned(),
        }
    }

    /// Returns the family the name was looked up in.
    #[must_use]
    pub const fn kind(&self) -> AlgorithmKind {
        self.kind
    }

    /// Returns the rejected name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}
