//! crates/match/src/summary.rs
//!
//! Command totals and a human-readable dump of a delta stream.

use std::fmt;
use std::io::{Read, Write};

use protocol::{DeltaCommand, DeltaReader};

use crate::error::DeltaError;

/// Totals over the commands of one delta.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct DeltaSummary {
    /// Number of copy commands.
    pub copy_commands: u64,
    /// Basis bytes referenced by copies.
    pub copy_bytes: u64,
    /// Number of data commands.
    pub data_commands: u64,
    /// Literal bytes carried in the delta.
    pub data_bytes: u64,
}

impl DeltaSummary {
    /// Length of the file the delta reconstructs.
    #[must_use]
    pub const fn target_len(&self) -> u64 {
        self.copy_bytes + self.data_bytes
    }

    pub(crate) fn record(&mut self, command: &DeltaCommand) {
        match *command {
            DeltaCommand::Copy { length, .. } => {
                self.copy_commands += 1;
                self.copy_bytes += length;
            }
            DeltaCommand::Data { length } => {
                self.data_commands += 1;
                self.data_bytes += length;
            }
        }
    }
}

impl fmt::Display for DeltaSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} copies ({} bytes), {} data commands ({} bytes), {} bytes total",
            self.copy_commands,
            self.copy_bytes,
            self.data_commands,
            self.data_bytes,
            self.target_len()
        )
    }
}

/// Writes the header and one line per command of `delta` to `out`.
///
/// Payloads are skipped, not printed.
pub fn explain<R: Read, W: Write>(delta: &mut DeltaReader<R>, out: &mut W) -> Result<DeltaSummary, DeltaError> {
    let metadata = delta.metadata().clone();
    writeln!(out, "dialect: {}", delta.dialect())?;
    writeln!(out, "hash algorithm: {}", metadata.hash_algorithm)?;
    writeln!(
        out,
        "expected file hash: {} {}",
        metadata.expected_file_hash.algorithm,
        hex(&metadata.expected_file_hash.digest)
    )?;
    if let Some(base) = &metadata.base_file_hash {
        writeln!(out, "base file hash: {} {}", base.algorithm, hex(&base.digest))?;
    }

    let mut summary = DeltaSummary::default();
    let mut position = 0u64;
    while let Some(command) = delta.next_command()? {
        match command {
            DeltaCommand::Copy { start, length } => {
                writeln!(out, "{position:>12}  copy {length} bytes from basis offset {start}")?;
            }
            DeltaCommand::Data { length } => writeln!(out, "{position:>12}  data {length} bytes")?,
        }
        summary.record(&command);
        position = summary.target_len();
    }
    writeln!(out, "{summary}")?;
    Ok(summary)
}

pub(crate) fn hex(bytes: &[u8]) -> String {
    use fmt::Write as _;
    bytes.iter().fold(String::with_capacity(bytes.len() * 2), |mut out, byte| {
        let _ = write!(out, "{byte:02x}");
        out
    })
}
