//! crates/protocol/src/sink.rs
//!
//! The seam between delta construction and delta encoding.

use std::io;

use crate::metadata::DeltaMetadata;

/// Receives a delta as it is produced.
///
/// Calls arrive in stream order: metadata exactly once, then any number of
/// commands, then [`finish`](Self::finish).
pub trait DeltaSink {
    /// Receives the delta header.
    fn write_metadata(&mut self, metadata: &DeltaMetadata) -> io::Result<()>;

    /// Receives a copy of `length` basis bytes starting at `start`.
    fn write_copy(&mut self, start: u64, length: u64) -> io::Result<()>;

    /// Receives literal target bytes.
    fn write_data(&mut self, payload: &[u8]) -> io::Result<()>;

    /// Called once after the last command.
    fn finish(&mut self) -> io::Result<()>;
}

impl<S: DeltaSink + ?Sized> DeltaSink for &mut S {
    fn write_metadata(&mut self, metadata: &DeltaMetadata) -> io::Result<()> {
        (**self).write_metadata(metadata)
    }

    fn write_copy(&mut self, start: u64, length: u64) -> io::Result<()> {
        (**self).write_copy(start, length)
    }

    fn write_data(&mut self, payload: &[u8]) -> io::Result<()> {
        (**self).write_data(payload)
    }

    fn finish(&mut self) -> io::Result<()> {
        (**self).finish()
    }
}

/// Sink decorator that merges copies of contiguous basis ranges.
///
/// A run of matched chunks that were adjacent in the basis reaches the inner
/// sink as one copy. Ordering is preserved: a pending copy is flushed before
/// any data command and at [`finish`](DeltaSink::finish).
#[derive(Debug)]
pub struct AggregateCopies<S> {
    inner: S,
    pending: Option<(u64, u64)>,
}

impl<S: DeltaSink> AggregateCopies<S> {
    /// Wraps `inner`.
    pub const fn new(inner: S) -> Self {
        Self {
            inner,
            pending: None,
        }
    }

    /// Returns a reference to the wrapped sink.
    pub const fn get_ref(&self) -> &S {
        &self.inner
    }

    /// Returns a mutable reference to the wrapped sink.
    ///
    /// Bytes already handed to the inner sink are final; a pending copy is
    /// not visible through it until the next data command or `finish`.
    pub fn get_mut(&mut self) -> &mut S {
        &mut self.inner
    }

    /// Unwraps the inner sink. Call [`finish`](DeltaSink::finish) first or a
    /// pending copy is lost.
    pub fn into_inner(self) -> S {
        self.inner
    }

    fn flush_pending(&mut self) -> io::Result<()> {
        if let Some((start, length)) = self.pending.take() {
            self.inner.write_copy(start, length)?;
        }
        Ok(())
    }
}

impl<S: DeltaSink> DeltaSink for AggregateCopies<S> {
    fn write_metadata(&mut self, metadata: &DeltaMetadata) -> io::Result<()> {
        self.inner.write_metadata(metadata)
    }

    fn write_copy(&mut self, start: u64, length: u64) -> io::Result<()> {
        if let Some((pending_start, pending_length)) = &mut self.pending {
            if pending_start.checked_add(*pending_length) == Some(start) {
                *pending_length += length;
                return Ok(());
            }
        }
        self.flush_pending()?;
        self.pending = Some((start, length));
        Ok(())
    }

    fn write_data(&mut self, payload: &[u8]) -> io::Result<()> {
        self.flush_pending()?;
        self.inner.write_data(payload)
    }

    fn finish(&mut self) -> io::Result<()> {
        self.flush_pending()?;
        self.inner.finish()
    }
}
