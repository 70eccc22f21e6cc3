//! crates/match/src/index.rs
//!
//! Chunk map: rolling checksum to the chunks sharing it.

use rustc_hash::FxHashMap;
use signature::{ChunkSignature, Signature};

/// Build-scoped index over a signature's chunks.
///
/// Buckets hold chunk indices in signature order, so iterating a bucket
/// visits colliding chunks from the earliest basis offset onwards.
#[derive(Debug)]
pub struct ChunkMap<'a> {
    chunks: &'a [ChunkSignature],
    buckets: FxHashMap<u32, Vec<usize>>,
    min_chunk_len: usize,
    max_chunk_len: usize,
}

impl<'a> ChunkMap<'a> {
    /// Indexes every chunk of `signature`.
    #[must_use]
    pub fn new(signature: &'a Signature) -> Self {
        let chunks = signature.chunks();
        let mut buckets: FxHashMap<u32, Vec<usize>> = FxHashMap::default();
        buckets.reserve(chunks.len());
        let mut min_chunk_len = usize::MAX;
        let mut max_chunk_len = 0;
        for (index, chunk) in chunks.iter().enumerate() {
            buckets.entry(chunk.rolling_checksum()).or_default().push(index);
            let len = usize::from(chunk.length());
            min_chunk_len = min_chunk_len.min(len);
            max_chunk_len = max_chunk_len.max(len);
        }
        if chunks.is_empty() {
            min_chunk_len = 0;
        }
        logging::trace_delta!(
            chunks = chunks.len(),
            distinct_checksums = buckets.len(),
            min_chunk_len,
            max_chunk_len,
            "chunk map built"
        );
        Self {
            chunks,
            buckets,
            min_chunk_len,
            max_chunk_len,
        }
    }

    /// Chunks whose rolling checksum equals `checksum`, in signature order.
    #[must_use]
    pub fn candidates(&self, checksum: u32) -> impl Iterator<Item = &'a ChunkSignature> + '_ {
        let chunks = self.chunks;
        self.buckets
            .get(&checksum)
            .map(Vec::as_slice)
            .unwrap_or_default()
            .iter()
            .map(move |&index| &chunks[index])
    }

    /// Length of the shortest chunk, 0 for an empty signature.
    #[must_use]
    pub const fn min_chunk_len(&self) -> usize {
        self.min_chunk_len
    }

    /// Length of the longest chunk, 0 for an empty signature.
    #[must_use]
    pub const fn max_chunk_len(&self) -> usize {
        self.max_chunk_len
    }

    /// Reports whether there is nothing to match against.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }
}
