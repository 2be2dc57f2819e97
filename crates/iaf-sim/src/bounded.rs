//! Adaptive-chunk streaming wrapper around [`IafEngine`]: feeds it
//! fixed-ish-size windows of the trace, carries living requests (addresses
//! that might still recur) across chunk boundaries, and caps the reported
//! cache-size range so memory stays bounded regardless of trace length.
//!
//! Grounded in `bounded_iaf.{h,cc}`'s `BoundedIAF`: `cur_u`/`max_living_req`,
//! the `min_u_mult = 3` / `max_u_mult = 4` hysteresis, and the
//! `process_requests` reshuffle (truncate the hits vector, evict the oldest
//! living requests past the cap, renumber the survivors, reseed the chunk
//! buffer) are carried over field-for-field.

use iaf_core::{CacheSim, ReqCount, Request, SuccessVector};
use iaf_engine::IafEngine;
use tracing::{debug, trace};

use crate::sampling::SamplingAdapter;

/// `cur_u` is raised to `max_u_mult * living_count` once the living
/// population reaches `min_u_mult * living_count >= cur_u` — matches
/// `bounded_iaf.h`'s `update_u`.
const MIN_U_MULT: usize = 3;
const MAX_U_MULT: usize = 4;

/// Chunk size below which we never shrink `u` — the `min_chunk_size`
/// floor/default.
pub const DEFAULT_U_MIN: usize = 65536;

/// Streams a trace through [`IafEngine`] in adaptively-sized chunks so peak
/// memory stays bounded by `max_living_req` rather than by trace length.
pub struct BoundedStreamer {
    engine: IafEngine,
    sampling: SamplingAdapter,

    /// The chunk currently being assembled: a living prefix (carried over
    /// from the previous chunk, access numbers already renumbered `1..=L`)
    /// followed by freshly recorded requests.
    requests: Vec<Request>,
    /// How many of `requests` are the living prefix; anything beyond this
    /// is new and still needs to be folded into the hits accumulator.
    living_len: usize,

    /// Raw per-depth hit counts, accumulated (and periodically truncated)
    /// across every chunk processed so far. Not yet integrated into a
    /// running success curve — that happens at
    /// [`Self::get_success_function`] time, together with sampling expansion.
    hits_accum: SuccessVector,

    u: usize,
    u_min: usize,
    max_living_req: usize,

    num_duplicates: u64,
    total_requests: u64,
}

impl BoundedStreamer {
    /// `min_chunk_size` is the starting (and floor) value of the adaptive
    /// chunk size `u`; bigger values trade memory for parallelism. `max_cache_size`
    /// bounds how many cache sizes are reported, capping peak memory.
    #[must_use]
    pub fn new(min_chunk_size: usize, max_cache_size: usize) -> Self {
        Self {
            engine: IafEngine::new(),
            sampling: SamplingAdapter::disabled(),
            requests: Vec::with_capacity(min_chunk_size),
            living_len: 0,
            hits_accum: Vec::new(),
            u: min_chunk_size.max(1),
            u_min: min_chunk_size.max(1),
            max_living_req: max_cache_size,
            num_duplicates: 0,
            total_requests: 0,
        }
    }

    /// As [`Self::new`] but with request sampling enabled up front.
    #[must_use]
    pub fn with_sampling(min_chunk_size: usize, max_cache_size: usize, sampling: SamplingAdapter) -> Self {
        Self {
            sampling,
            ..Self::new(min_chunk_size, max_cache_size)
        }
    }

    /// The adaptive chunk size currently in effect.
    #[must_use]
    pub const fn current_u(&self) -> usize {
        self.u
    }

    /// The cache-size reporting cap this streamer was built with.
    #[must_use]
    pub const fn max_cache_size(&self) -> usize {
        self.max_living_req
    }

    fn update_u(&mut self, num_living: usize) {
        if num_living * MIN_U_MULT >= self.u {
            self.u = (num_living * MAX_U_MULT).max(self.u_min);
        }
    }

    /// Hand the current chunk (living prefix plus everything recorded since
    /// the last flush) to the engine, then reshuffle for the next chunk.
    fn process_requests(&mut self) {
        let chunk = std::mem::take(&mut self.requests);
        trace!(chunk_len = chunk.len(), u = self.u, "flushing chunk to engine");

        let mut living = self.engine.process_chunk(chunk, &mut self.hits_accum);

        let report_len = 1 + living.len().min(self.max_living_req);
        self.hits_accum.resize(report_len, 0);

        if living.len() > self.max_living_req {
            let drop_count = living.len() - self.max_living_req;
            living.drain(0..drop_count);
        }

        for (i, req) in living.iter_mut().enumerate() {
            req.access_number = (i + 1) as ReqCount;
        }

        debug!(
            living = living.len(),
            hits_len = self.hits_accum.len(),
            "chunk processed"
        );

        self.update_u(living.len());
        self.living_len = living.len();
        self.requests = Vec::with_capacity(self.u);
        self.requests.extend(living);
    }
}

impl CacheSim for BoundedStreamer {
    fn memory_access(&mut self, addr: u64) {
        self.total_requests += 1;

        if self.sampling.is_enabled() && !self.sampling.admit(addr) {
            return;
        }

        if self.requests.last().is_some_and(|r| r.addr == addr) {
            self.num_duplicates += 1;
            return;
        }

        let access_number = (self.requests.len() + 1) as ReqCount;
        self.requests.push(Request::new(addr, access_number));

        if self.requests.len() >= self.u {
            self.process_requests();
        }
    }

    fn get_success_function(&mut self) -> SuccessVector {
        if self.requests.len() > self.living_len {
            self.process_requests();
        }
        self.sampling
            .expand_success(&self.hits_accum, self.num_duplicates, self.total_requests)
    }

    fn total_requests(&self) -> u64 {
        self.total_requests
    }

    fn memory_usage(&self) -> f64 {
        let request_bytes = self.requests.capacity() * std::mem::size_of::<Request>();
        let hits_bytes = self.hits_accum.capacity() * std::mem::size_of::<ReqCount>();
        (request_bytes + hits_bytes) as f64 / (1024.0 * 1024.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reference_success(trace: &[u64]) -> SuccessVector {
        let mut engine = IafEngine::new();
        for &addr in trace {
            engine.memory_access(addr);
        }
        CacheSim::get_success_function(&mut engine)
    }

    #[test]
    fn small_trace_never_triggers_a_chunk_flush_until_queried() {
        let mut streamer = BoundedStreamer::new(DEFAULT_U_MIN, usize::MAX / 4);
        for &addr in &[1u64, 2, 1, 1] {
            streamer.memory_access(addr);
        }
        let success = streamer.get_success_function();
        assert_eq!(success[1], 1);
        for &h in &success[2..] {
            assert_eq!(h, 2);
        }
    }

    #[test]
    fn small_chunk_size_forces_multiple_flushes_but_matches_unbounded_curve() {
        let trace: Vec<u64> = (0..500)
            .map(|i| (i % 40) as u64)
            .collect();

        let mut streamer = BoundedStreamer::new(32, usize::MAX / 4);
        for &addr in &trace {
            streamer.memory_access(addr);
        }
        let bounded = streamer.get_success_function();
        let unbounded = reference_success(&trace);

        let common_len = bounded.len().min(unbounded.len());
        assert_eq!(bounded[..common_len], unbounded[..common_len]);
    }

    #[test]
    fn max_cache_size_caps_the_reported_curve_length() {
        let trace: Vec<u64> = (0..300).collect();
        let mut streamer = BoundedStreamer::new(16, 10);
        for &addr in &trace {
            streamer.memory_access(addr);
        }
        let success = streamer.get_success_function();
        assert!(success.len() <= 11 * (1 + streamer.sampling.sample_rate() as usize));
    }

    #[test]
    fn repeated_calls_without_new_accesses_are_idempotent() {
        let mut streamer = BoundedStreamer::new(8, usize::MAX / 4);
        for &addr in &[1u64, 2, 3, 1, 2, 1] {
            streamer.memory_access(addr);
        }
        let first = streamer.get_success_function();
        let second = streamer.get_success_function();
        assert_eq!(first, second);
    }

    #[test]
    fn immediate_duplicate_requests_are_not_recorded_as_separate_accesses() {
        let mut streamer = BoundedStreamer::new(DEFAULT_U_MIN, usize::MAX / 4);
        streamer.memory_access(1);
        streamer.memory_access(1);
        streamer.memory_access(1);
        assert_eq!(streamer.num_duplicates, 2);
        assert_eq!(streamer.total_requests(), 3);
    }

    #[test]
    fn sampling_keeps_every_success_entry_below_total_requests() {
        let sampling = SamplingAdapter::new(3, 11);
        let mut streamer = BoundedStreamer::with_sampling(16, usize::MAX / 4, sampling);
        for addr in 0..400u64 {
            streamer.memory_access(addr % 30);
        }
        let success = streamer.get_success_function();
        let total = streamer.total_requests();
        assert!(success.iter().all(|&h| h < total));
    }
}
