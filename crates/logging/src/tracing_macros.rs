//! crates/logging/src/tracing_macros.rs
//! Convenience macros for rdelta-specific tracing.
//!
//! These macros provide ergonomic wrappers around standard tracing macros
//! with appropriate targets for rdelta subsystems.

/// Emit a signature construction or parsing trace.
///
/// # Example
/// ```ignore
/// trace_sig!("wrote {} chunk records", count);
/// ```
#[macro_export]
macro_rules! trace_sig {
    ($($arg:tt)*) => {
        $crate::tracing::debug!(target: "rdelta::signature", $($arg)*)
    };
}

/// Emit a delta computation trace.
///
/// # Example
/// ```ignore
/// trace_delta!("computed delta: {} commands", count);
/// ```
#[macro_export]
macro_rules! trace_delta {
    ($($arg:tt)*) => {
        $crate::tracing::debug!(target: "rdelta::delta", $($arg)*)
    };
}

/// Emit a delta application trace.
///
/// # Example
/// ```ignore
/// trace_patch!("copying {} bytes from offset {}", len, offset);
/// ```
#[macro_export]
macro_rules! trace_patch {
    ($($arg:tt)*) => {
        $crate::tracing::debug!(target: "rdelta::patch", $($arg)*)
    };
}

/// Emit a wire-format trace.
///
/// # Example
/// ```ignore
/// trace_proto!("detected {} dialect", dialect);
/// ```
#[macro_export]
macro_rules! trace_proto {
    ($($arg:tt)*) => {
        $crate::tracing::trace!(target: "rdelta::protocol", $($arg)*)
    };
}

/// Emit a warning under the given subsystem target.
///
/// # Example
/// ```ignore
/// warn_at!(logging::TARGET_PATCH, "verification skipped");
/// ```
#[macro_export]
macro_rules! warn_at {
    ($target:expr, $($arg:tt)*) => {
        $crate::tracing::warn!(target: $target, $($arg)*)
    };
}

#[cfg(test)]
mod tests {
    #[test]
    fn macros_expand_without_subscriber() {
        let chunks = 3usize;
        crate::trace_sig!(chunks, "signature ready");
        crate::trace_delta!("delta ready: {chunks}");
        crate::trace_patch!(offset = 10u64, "copy");
        crate::trace_proto!("header parsed");
        crate::warn_at!(crate::TARGET_PATCH, "warning {}", chunks);
    }
}
