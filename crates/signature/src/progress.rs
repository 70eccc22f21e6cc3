//! crates/signature/src/progress.rs
//!
//! Best-effort progress reporting.
//!
//! Every long-running operation (hashing a file, building or reading a
//! signature, building or applying a delta) can report its position to a
//! [`ProgressSink`]. Sinks are observers: they cannot fail the operation and
//! must not block it. The channel implementation therefore uses `try_send`
//! and drops reports when the receiver lags behind.

use std::fmt;
use std::sync::Arc;

use crossbeam_channel::Sender;

/// Stage an operation is in.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum ProgressOperation {
    /// Hashing a whole file.
    HashingFile,
    /// Emitting chunk records.
    BuildingSignatures,
    /// Parsing chunk records.
    ReadingSignature,
    /// Scanning the target for matches.
    BuildingDelta,
    /// Replaying delta commands.
    ApplyingDelta,
}

impl fmt::Display for ProgressOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::HashingFile => "hashing file",
            Self::BuildingSignatures => "building signatures",
            Self::ReadingSignature => "reading signature",
            Self::BuildingDelta => "building delta",
            Self::ApplyingDelta => "applying delta",
        })
    }
}

/// One progress observation.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ProgressReport {
    /// Stage being reported.
    pub operation: ProgressOperation,
    /// Bytes processed so far.
    pub current_position: u64,
    /// Bytes expected in total, 0 when unknown.
    pub total: u64,
}

impl ProgressReport {
    /// Completed fraction in `[0, 1]`, or `None` when the total is unknown.
    #[must_use]
    pub fn fraction(&self) -> Option<f64> {
        (self.total > 0).then(|| (self.current_position as f64 / self.total as f64).min(1.0))
    }
}

impl fmt::Display for ProgressReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.fraction() {
            Some(fraction) => write!(
                f,
                "{}: {}/{} bytes ({:.1}%)",
                self.operation,
                self.current_position,
                self.total,
                fraction * 100.0
            ),
            None => write!(f, "{}: {} bytes", self.operation, self.current_position),
        }
    }
}

/// Receiver of progress reports.
pub trait ProgressSink: Send + Sync {
    /// Observes one report. Must return promptly.
    fn report(&self, report: ProgressReport);
}

impl<F> ProgressSink for F
where
    F: Fn(ProgressReport) + Send + Sync,
{
    fn report(&self, report: ProgressReport) {
        self(report);
    }
}

impl ProgressSink for Sender<ProgressReport> {
    fn report(&self, report: ProgressReport) {
        // A full or disconnected channel only loses the observation.
        let _ = self.try_send(report);
    }
}

/// Shared handle to a progress sink, as stored in option structs.
pub type SharedProgress = Arc<dyn ProgressSink>;

/// Reports one operation's position, keeping positions monotonic.
pub struct ProgressTracker<'a> {
    sink: Option<&'a dyn ProgressSink>,
    operation: ProgressOperation,
    total: u64,
    last: Option<u64>,
}

impl<'a> ProgressTracker<'a> {
    /// Starts tracking `operation` over `total` bytes.
    #[must_use]
    pub fn new(sink: Option<&'a dyn ProgressSink>, operation: ProgressOperation, total: u64) -> Self {
        Self {
            sink,
            operation,
            total,
            last: None,
        }
    }

    /// Reports `position` unless it would move backwards or repeat.
    pub fn update(&mut self, position: u64) {
        let Some(sink) = self.sink else {
            return;
        };
        if self.last.is_some_and(|last| position <= last) {
            return;
        }
        self.last = Some(position);
        sink.report(ProgressReport {
            operation: self.operation,
            current_position: position,
            total: self.total,
        });
    }
}

impl fmt::Debug for ProgressTracker<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProgressTracker")
            .field("operation", &self.operation)
            .field("total", &self.total)
            .field("last", &self.last)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    #[test]
    fn tracker_suppresses_backwards_positions() {
        let seen = Mutex::new(Vec::new());
        let sink = |report: ProgressReport| seen.lock().expect("lock").push(report.current_position);
        let mut tracker = ProgressTracker::new(Some(&sink), ProgressOperation::HashingFile, 100);
        for position in [0, 10, 10, 5, 50, 100] {
            tracker.update(position);
        }
        assert_eq!(*seen.lock().expect("lock"), [0, 10, 50, 100]);
    }

    #[test]
    fn channel_sink_never_blocks() {
        let (tx, rx) = crossbeam_channel::bounded(1);
        for position in 0..10 {
            tx.report(ProgressReport {
                operation: ProgressOperation::BuildingDelta,
                current_position: position,
                total: 10,
            });
        }
        assert_eq!(rx.try_iter().count(), 1);
    }

    #[test]
    fn disconnected_channel_is_ignored() {
        let (tx, rx) = crossbeam_channel::unbounded::<ProgressReport>();
        drop(rx);
        tx.report(ProgressReport {
            operation: ProgressOperation::ApplyingDelta,
            current_position: 1,
            total: 0,
        });
    }

    #[test]
    fn display_includes_percentage_when_total_known() {
        let report = ProgressReport {
            operation: ProgressOperation::BuildingSignatures,
            current_position: 512,
            total: 1024,
        };
        assert_eq!(report.to_string(), "building signatures: 512/1024 bytes (50.0%)");
        assert_eq!(
            ProgressReport { total: 0, ..report }.to_string(),
            "building signatures: 512 bytes"
        );
    }
}
