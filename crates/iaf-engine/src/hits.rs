//! The hit-count accumulator written by the parallel base cases and read
//! back out by [`crate::engine::IafEngine`] once recursion completes.

use std::sync::atomic::{AtomicU64, Ordering};

use iaf_core::{ReqCount, SuccessVector};

/// `hits[k]` is the number of requests that hit an LRU cache of size `k`,
/// accumulated concurrently across every base case in the recursion tree.
/// Atomic because sibling partitions run on separate rayon tasks but can
/// still freeze the same cache size.
pub struct HitsVector {
    counts: Vec<AtomicU64>,
}

impl HitsVector {
    /// An all-zero vector with room for `len` cache sizes (`0..len`).
    #[must_use]
    pub fn zeroed(len: usize) -> Self {
        let mut counts = Vec::with_capacity(len);
        counts.resize_with(len, || AtomicU64::new(0));
        Self { counts }
    }

    /// Seed a vector from previously-accumulated counts, growing it to at
    /// least `len` entries. Used by chunked processing, where hit counts
    /// accumulate across every chunk processed so far rather than resetting
    /// per call: the vector is resized but never zeroed between
    /// `process_chunk` calls.
    #[must_use]
    pub fn from_accumulated(existing: &SuccessVector, len: usize) -> Self {
        let mut counts: Vec<AtomicU64> = existing.iter().map(|&v| AtomicU64::new(v)).collect();
        if counts.len() < len {
            counts.resize_with(len, || AtomicU64::new(0));
        }
        Self { counts }
    }

    /// Grow the vector (preserving existing counts) if it's shorter than `len`.
    pub fn ensure_len(&mut self, len: usize) {
        if self.counts.len() < len {
            self.counts.resize_with(len, || AtomicU64::new(0));
        }
    }

    /// Number of cache sizes tracked.
    #[must_use]
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    /// `true` if no cache sizes are tracked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Increment the hit count for cache size `k` by one.
    pub fn incr(&self, k: usize) {
        debug_assert!(k < self.counts.len(), "hit index out of bounds");
        self.counts[k].fetch_add(1, Ordering::Relaxed);
    }

    /// Snapshot the accumulated counts as a plain [`SuccessVector`].
    #[must_use]
    pub fn into_success_vector(self) -> SuccessVector {
        self.counts
            .into_iter()
            .map(|c| c.into_inner() as ReqCount)
            .collect()
    }
}
