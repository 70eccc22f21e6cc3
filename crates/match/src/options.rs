//! crates/match/src/options.rs
//!
//! Delta build and apply configuration.

use std::fmt;
use std::sync::Arc;

use checksums::HashAlgorithm;
use signature::ProgressSink;
use signature::progress::SharedProgress;

/// Target read buffer used when none is configured.
pub const DEFAULT_READ_BUFFER_SIZE: usize = 4 * 1024 * 1024;
/// Copy buffer used by the applier when none is configured.
pub const DEFAULT_COPY_BUFFER_SIZE: usize = 64 * 1024;

/// Configuration for [`DeltaBuilder`](crate::DeltaBuilder).
#[derive(Clone)]
pub struct DeltaOptions {
    read_buffer_size: usize,
    file_hash_algorithm: HashAlgorithm,
    aggregate_copies: bool,
    progress: Option<SharedProgress>,
}

impl Default for DeltaOptions {
    fn default() -> Self {
        Self {
            read_buffer_size: DEFAULT_READ_BUFFER_SIZE,
            file_hash_algorithm: HashAlgorithm::Md5,
            aggregate_copies: false,
            progress: None,
        }
    }
}

impl DeltaOptions {
    /// Sets the target read buffer size. The effective size is never below
    /// twice the longest chunk of the signature in use.
    #[must_use]
    pub fn with_read_buffer_size(mut self, size: usize) -> Self {
        self.read_buffer_size = size;
        self
    }

    /// Sets the algorithm of the expected-output digest.
    #[must_use]
    pub fn with_file_hash(mut self, algorithm: HashAlgorithm) -> Self {
        self.file_hash_algorithm = algorithm;
        self
    }

    /// Merges copies of contiguous basis ranges before they reach the sink.
    #[must_use]
    pub fn with_aggregate_copies(mut self, aggregate: bool) -> Self {
        self.aggregate_copies = aggregate;
        self
    }

    /// Installs a progress sink.
    #[must_use]
    pub fn with_progress(mut self, sink: impl ProgressSink + 'static) -> Self {
        self.progress = Some(Arc::new(sink));
        self
    }

    /// Read buffer size for a signature whose longest chunk is `max_chunk_len`.
    #[must_use]
    pub fn read_buffer_size_for(&self, max_chunk_len: usize) -> usize {
        self.read_buffer_size.max(2 * max_chunk_len).max(1)
    }

    /// Algorithm of the expected-output digest.
    #[must_use]
    pub const fn file_hash_algorithm(&self) -> HashAlgorithm {
        self.file_hash_algorithm
    }

    /// Whether adjacent copies are merged.
    #[must_use]
    pub const fn aggregate_copies(&self) -> bool {
        self.aggregate_copies
    }

    /// Installed progress sink, if any.
    #[must_use]
    pub fn progress(&self) -> Option<&dyn ProgressSink> {
        self.progress.as_deref()
    }
}

impl fmt::Debug for DeltaOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeltaOptions")
            .field("read_buffer_size", &self.read_buffer_size)
            .field("file_hash_algorithm", &self.file_hash_algorithm)
            .field("aggregate_copies", &self.aggregate_copies)
            .field("progress", &self.progress.is_some())
            .finish()
    }
}

/// Configuration for [`DeltaApplier`](crate::DeltaApplier).
#[derive(Clone)]
pub struct ApplyOptions {
    skip_hash_check: bool,
    copy_buffer_size: usize,
    progress: Option<SharedProgress>,
}

impl Default for ApplyOptions {
    fn default() -> Self {
        Self {
            skip_hash_check: false,
            copy_buffer_size: DEFAULT_COPY_BUFFER_SIZE,
            progress: None,
        }
    }
}

impl ApplyOptions {
    /// Disables the final output hash comparison.
    #[must_use]
    pub fn with_skip_hash_check(mut self, skip: bool) -> Self {
        self.skip_hash_check = skip;
        self
    }

    /// Sets the buffer used for copies and payloads.
    #[must_use]
    pub fn with_copy_buffer_size(mut self, size: usize) -> Self {
        self.copy_buffer_size = size.max(1);
        self
    }

    /// Installs a progress sink.
    #[must_use]
    pub fn with_progress(mut self, sink: impl ProgressSink + 'static) -> Self {
        self.progress = Some(Arc::new(sink));
        self
    }

    /// Whether the output hash comparison is skipped.
    #[must_use]
    pub const fn skip_hash_check(&self) -> bool {
        self.skip_hash_check
    }

    /// Copy buffer size.
    #[must_use]
    pub const fn copy_buffer_size(&self) -> usize {
        self.copy_buffer_size
    }

    /// Installed progress sink, if any.
    #[must_use]
    pub fn progress(&self) -> Option<&dyn ProgressSink> {
        self.progress.as_deref()
    }
}

impl fmt::Debug for ApplyOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApplyOptions")
            .field("skip_hash_check", &self.skip_hash_check)
            .field("copy_buffer_size", &self.copy_buffer_size)
            .field("progress", &self.progress.is_some())
            .finish()
    }
}
