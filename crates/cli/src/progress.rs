//! crates/cli/src/progress.rs
//!
//! Progress rendering for `--progress`.
//!
//! The operation runs on a scoped worker thread and reports through a
//! bounded channel; the calling thread renders reports to the error stream
//! until the worker drops its sender.

use std::io::Write;
use std::thread;

use crossbeam_channel::{Receiver, Sender, bounded};
use signature::{ProgressOperation, ProgressReport};

/// Reports queued before new ones are dropped.
const CHANNEL_CAPACITY: usize = 256;

/// Renders one line per operation and whole percent.
#[derive(Debug, Default)]
pub(crate) struct ProgressPrinter {
    last: Option<(ProgressOperation, u64)>,
}

impl ProgressPrinter {
    /// Returns the line to print for `report`, if it moved the display.
    pub(crate) fn line(&mut self, report: &ProgressReport) -> Option<String> {
        let step = report
            .fraction()
            .map_or(report.current_position >> 20, |fraction| (fraction * 100.0) as u64);
        let key = (report.operation, step);
        if self.last == Some(key) {
            return None;
        }
        self.last = Some(key);
        Some(report.to_string())
    }
}

fn render<E: Write>(receiver: &Receiver<ProgressReport>, stderr: &mut E) {
    let mut printer = ProgressPrinter::default();
    for report in receiver {
        if let Some(line) = printer.line(&report) {
            let _ = writeln!(stderr, "{line}");
        }
    }
}

/// Runs `operation` with a progress sender when `enabled`.
pub(crate) fn with_progress<T, E, F>(enabled: bool, stderr: &mut E, operation: F) -> T
where
    T: Send,
    E: Write,
    F: FnOnce(Option<Sender<ProgressReport>>) -> T + Send,
{
    if !enabled {
        return operation(None);
    }
    let (sender, receiver) = bounded(CHANNEL_CAPACITY);
    thread::scope(|scope| {
        let worker = scope.spawn(move || operation(Some(sender)));
        render(&receiver, stderr);
        match worker.join() {
            Ok(result) => result,
            Err(panic) => std::panic::resume_unwind(panic),
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(operation: ProgressOperation, current_position: u64, total: u64) -> ProgressReport {
        ProgressReport {
            operation,
            current_position,
            total,
        }
    }

    #[test]
    fn printer_skips_reports_within_the_same_percent() {
        let mut printer = ProgressPrinter::default();
        assert!(printer.line(&report(ProgressOperation::HashingFile, 0, 1000)).is_some());
        assert!(printer.line(&report(ProgressOperation::HashingFile, 5, 1000)).is_none());
        assert!(printer.line(&report(ProgressOperation::HashingFile, 10, 1000)).is_some());
        assert!(
            printer
                .line(&report(ProgressOperation::BuildingSignatures, 10, 1000))
                .is_some()
        );
    }

    #[test]
    fn reports_from_the_worker_reach_the_error_stream() {
        let mut stderr = Vec::new();
        let answer = with_progress(true, &mut stderr, |sender| {
            let sender = sender.expect("sender");
            sender
                .send(report(ProgressOperation::ApplyingDelta, 50, 100))
                .expect("send");
            42
        });
        assert_eq!(answer, 42);
        let text = String::from_utf8(stderr).expect("utf8");
        assert_eq!(text, "applying delta: 50/100 bytes (50.0%)\n");
    }

    #[test]
    fn disabled_progress_runs_inline() {
        let mut stderr = Vec::new();
        let answer = with_progress(false, &mut stderr, |sender| sender.is_none());
        assert!(answer);
        assert!(stderr.is_empty());
    }
}
