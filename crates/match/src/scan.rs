//! crates/match/src/scan.rs
//!
//! The sliding-window matcher, independent of how input arrives.
//!
//! [`Scanner`] owns the read buffer. Drivers alternate between filling it
//! (`needs_input` / `input_buffer` / `commit_input`) and letting it emit
//! commands (`scan`). The blocking and async drivers share this type, so
//! both produce the same command sequence for the same input.
//!
//! Window rules:
//!
//! - The window at scan position `i` covers `min(remaining, max_chunk_len)`
//!   bytes. It is only shorter than the longest chunk at end of stream.
//! - Its rolling checksum is computed from scratch at the start, after a
//!   match, and whenever the window length changes. Otherwise it is rotated
//!   from the previous window by one byte.
//! - Candidates sharing the checksum are tried in signature order. Each is
//!   confirmed by hashing the window truncated to the candidate's length.
//!   The first confirmed candidate wins.

use std::io;

use checksums::{HashAlgorithm, RollingChecksumAlgorithm};
use protocol::DeltaSink;
use signature::{ChunkSignature, Signature};

use crate::index::ChunkMap;

/// Outcome of one [`Scanner::scan`] call.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum ScanStatus {
    /// The buffer must be refilled before scanning can continue.
    NeedInput,
    /// End of input reached and every command emitted.
    Finished,
}

/// Counters kept while scanning.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub(crate) struct ScanStats {
    pub(crate) scanned: u64,
    pub(crate) copies: u64,
    pub(crate) copied_bytes: u64,
    pub(crate) literal_bytes: u64,
}

/// Sliding-window matcher over a caller-filled buffer.
///
/// Pending literals are flushed once they reach the buffer capacity, so a
/// literal run longer than the buffer becomes several consecutive `Data`
/// commands. The delta still reconstructs the same target, but it is not
/// command-for-command identical to one that emits each run whole.
pub(crate) struct Scanner<'a> {
    map: ChunkMap<'a>,
    rolling_algorithm: RollingChecksumAlgorithm,
    hash_algorithm: HashAlgorithm,
    buffer: Vec<u8>,
    start: usize,
    end: usize,
    eof: bool,
    /// Checksum, first byte and length of the window before the last
    /// one-byte advance, for rotation into the current window.
    rolling: Option<(u32, u8, usize)>,
    pending: Vec<u8>,
    flush_threshold: usize,
    stats: ScanStats,
}

impl<'a> Scanner<'a> {
    pub(crate) fn new(signature: &'a Signature, read_buffer_size: impl FnOnce(usize) -> usize) -> Self {
        let map = ChunkMap::new(signature);
        let capacity = read_buffer_size(map.max_chunk_len());
        Self {
            rolling_algorithm: signature.rolling_checksum_algorithm(),
            hash_algorithm: signature.chunk_hash_algorithm(),
            map,
            buffer: vec![0u8; capacity],
            start: 0,
            end: 0,
            eof: false,
            rolling: None,
            pending: Vec::new(),
            flush_threshold: capacity,
            stats: ScanStats::default(),
        }
    }

    fn window_target(&self) -> usize {
        self.map.max_chunk_len().max(1)
    }

    /// Whether `scan` would stop for lack of input.
    pub(crate) fn needs_input(&self) -> bool {
        !self.eof && self.end - self.start < self.window_target()
    }

    /// Moves unconsumed bytes to the front and returns the free tail.
    pub(crate) fn input_buffer(&mut self) -> &mut [u8] {
        if self.start > 0 {
            self.buffer.copy_within(self.start..self.end, 0);
            self.end -= self.start;
            self.start = 0;
        }
        &mut self.buffer[self.end..]
    }

    /// Records `read` bytes written into the slice from `input_buffer`.
    /// Zero marks end of input.
    pub(crate) fn commit_input(&mut self, read: usize) {
        if read == 0 {
            self.eof = true;
        } else {
            self.end += read;
        }
    }

    pub(crate) const fn stats(&self) -> ScanStats {
        self.stats
    }

    /// Emits commands for everything the loaded buffer allows.
    pub(crate) fn scan<S: DeltaSink + ?Sized>(&mut self, sink: &mut S) -> io::Result<ScanStatus> {
        loop {
            if self.needs_input() {
                return Ok(ScanStatus::NeedInput);
            }
            let available = self.end - self.start;
            if available == 0 {
                self.flush_pending(sink)?;
                return Ok(ScanStatus::Finished);
            }

            let window_len = available.min(self.map.max_chunk_len());
            if window_len < self.map.min_chunk_len() || self.map.is_empty() {
                // Nothing can match any more: the rest is literal.
                self.push_literal(self.start..self.end, sink)?;
                continue;
            }

            let window = &self.buffer[self.start..self.start + window_len];
            let checksum = match self.rolling {
                Some((previous, outgoing, len)) if len == window_len => {
                    self.rolling_algorithm
                        .rotate(previous, outgoing, window[window_len - 1], window_len)
                }
                _ => self.rolling_algorithm.calculate(window),
            };

            if let Some(chunk) = self.find_match(checksum, window) {
                let length = usize::from(chunk.length());
                self.flush_pending(sink)?;
                sink.write_copy(chunk.start_offset(), length as u64)?;
                self.stats.copies += 1;
                self.stats.copied_bytes += length as u64;
                self.stats.scanned += length as u64;
                self.start += length;
                self.rolling = None;
                continue;
            }

            self.rolling = Some((checksum, window[0], window_len));
            self.push_literal(self.start..self.start + 1, sink)?;
        }
    }

    fn find_match(&self, checksum: u32, window: &[u8]) -> Option<&'a ChunkSignature> {
        let mut cached: Option<(usize, Vec<u8>)> = None;
        for chunk in self.map.candidates(checksum) {
            let len = usize::from(chunk.length());
            if len > window.len() {
                continue;
            }
            if cached.as_ref().is_none_or(|(cached_len, _)| *cached_len != len) {
                cached = Some((len, self.hash_algorithm.compute(&window[..len])));
            }
            if let Some((_, hash)) = &cached {
                if hash.as_slice() == chunk.hash() {
                    return Some(chunk);
                }
            }
            logging::trace_proto!(
                offset = chunk.start_offset(),
                checksum,
                "rolling checksum collision rejected by strong hash"
            );
        }
        None
    }

    fn push_literal<S: DeltaSink + ?Sized>(
        &mut self,
        range: std::ops::Range<usize>,
        sink: &mut S,
    ) -> io::Result<()> {
        let consumed = range.len();
        if self.pending.len() + consumed > self.flush_threshold {
            self.flush_pending(sink)?;
        }
        self.pending.extend_from_slice(&self.buffer[range]);
        self.start += consumed;
        self.stats.scanned += consumed as u64;
        if self.pending.len() >= self.flush_threshold {
            self.flush_pending(sink)?;
        }
        Ok(())
    }

    fn flush_pending<S: DeltaSink + ?Sized>(&mut self, sink: &mut S) -> io::Result<()> {
        if !self.pending.is_empty() {
            sink.write_data(&self.pending)?;
            self.stats.literal_bytes += self.pending.len() as u64;
            self.pending.clear();
        }
        Ok(())
    }
}
