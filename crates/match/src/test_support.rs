//! crates/match/src/test_support.rs
//!
//! Shared fixtures for unit tests.

use std::io;

use protocol::{DeltaMetadata, DeltaSink};

#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) enum Command {
    Copy(u64, u64),
    Data(Vec<u8>),
}

/// Sink that keeps everything it receives.
#[derive(Debug, Default)]
pub(crate) struct Recorder {
    pub(crate) metadata: Option<DeltaMetadata>,
    pub(crate) commands: Vec<Command>,
    pub(crate) finished: bool,
}

impl DeltaSink for Recorder {
    fn write_metadata(&mut self, metadata: &DeltaMetadata) -> io::Result<()> {
        self.metadata = Some(metadata.clone());
        Ok(())
    }

    fn write_copy(&mut self, start: u64, length: u64) -> io::Result<()> {
        self.commands.push(Command::Copy(start, length));
        Ok(())
    }

    fn write_data(&mut self, payload: &[u8]) -> io::Result<()> {
        self.commands.push(Command::Data(payload.to_vec()));
        Ok(())
    }

    fn finish(&mut self) -> io::Result<()> {
        self.finished = true;
        Ok(())
    }
}

/// Deterministic pseudo-random bytes.
pub(crate) fn noise(len: usize, seed: u64) -> Vec<u8> {
    let mut state = seed.wrapping_mul(0x9E37_79B9_7F4A_7C15) | 1;
    (0..len)
        .map(|_| {
            state ^= state << 13;
            state ^= state >> 7;
            state ^= state << 17;
            (state >> 24) as u8
        })
        .collect()
}
