//! The `IafEngine`: builds the packed operation array for a chunk of
//! requests and drives the recursive partitioning that turns it into a
//! hit-count vector.
//!
//! Each split peels off a sub-range and fires it as a fork-join task via
//! [`rayon::scope`] + `scope.spawn`, while the calling thread keeps peeling
//! the remainder. Below `INLINE_THRESHOLD` ops, split branches run inline
//! instead of spawning, since task overhead would dwarf the work on small
//! subproblems.

use iaf_core::{CacheSim, Op, OpKind, PartitionState, ProjSequence, ReqCount, Request, SuccessVector, BRANCHING};
use tracing::{debug, instrument};

use crate::hits::HitsVector;

/// Problems with fewer than this many requests in range are solved by the
/// `O(w^2)` brute-force sweep instead of recursing further.
pub const BASE_CASE: usize = 256;

/// Splits at or below this operation count run both children on the calling
/// thread instead of spawning a rayon task, since the task overhead would
/// dwarf the work being parallelized.
pub const INLINE_THRESHOLD: ReqCount = 8192;

/// Accumulates requests for one chunk and computes their LRU hit-rate curve
/// via Increment-and-Freeze.
#[derive(Default)]
pub struct IafEngine {
    requests: Vec<Request>,
    operations: Vec<Op>,
    /// Every [`CacheSim::memory_access`] call ever made, never reset by a
    /// `get_success_function`/`process_chunk` call — the denominator for
    /// hit-rate percentages.
    total_requests: u64,
}

impl IafEngine {
    /// A fresh engine with no recorded requests.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of requests recorded since the last [`Self::get_success_function`]
    /// (or since construction, if none has run yet).
    #[must_use]
    pub fn pending_requests(&self) -> usize {
        self.requests.len()
    }

    /// Replace the pending request buffer, e.g. to seed the next chunk with
    /// the living requests carried over from the previous one.
    pub fn set_requests(&mut self, requests: Vec<Request>) {
        self.requests = requests;
    }

    /// Sort `reqs` and rebuild `self.operations` from it, returning the
    /// number of unique addresses seen and, if `collect_living` is set, the
    /// sorted-by-access-number list of requests whose address recurs later
    /// than the chunk boundary (plus the chunk's final request, which always
    /// survives).
    ///
    /// `reqs` is left sorted by `(addr, access_number)`.
    fn populate_operations(
        &mut self,
        reqs: &mut [Request],
        collect_living: bool,
    ) -> (ReqCount, Vec<Request>) {
        reqs.sort_unstable();

        self.operations.clear();
        self.operations.resize(2 * reqs.len(), Op::null());

        let mut unique_ids: ReqCount = 0;
        let mut living = Vec::new();

        for i in 0..reqs.len() {
            let cur = reqs[i];
            let prev = if i == 0 { None } else { Some(reqs[i - 1]) };

            let access_num = cur.access_number as usize;
            if let Some(prev) = prev.filter(|p| p.addr == cur.addr) {
                self.operations[2 * access_num - 2] = Op::prefix(cur.access_number - 1, -1);
                self.operations[2 * access_num - 1] = Op::postfix(prev.access_number);
            } else {
                self.operations[2 * access_num - 2] = Op::prefix(cur.access_number - 1, 0);
                unique_ids += 1;
                if collect_living && i > 0 {
                    living.push(reqs[i - 1]);
                }
            }
        }

        let mut place_idx = 1usize;
        for cur_idx in 1..self.operations.len() {
            if !self.operations[cur_idx].is_null() {
                self.operations[place_idx] = self.operations[cur_idx];
                place_idx += 1;
            }
        }
        self.operations.truncate(place_idx);

        if collect_living {
            if let Some(&last) = reqs.last() {
                living.push(last);
            }
            living.sort_unstable_by_key(|r| r.access_number);
        }

        (unique_ids, living)
    }

    /// Core driver shared by [`Self::get_success_function`] and
    /// [`Self::process_chunk`]: rebuild the op array, size the hits vector,
    /// and recurse. `accum`, when given, seeds the hits vector with
    /// previously-accumulated counts instead of starting from zero — the
    /// chunked driver's hit counts accumulate across every chunk processed so
    /// far, never resetting between calls.
    #[instrument(level = "debug", skip(self, accum), fields(requests = reqs.len()))]
    fn update_hits_vector(
        &mut self,
        reqs: &mut [Request],
        collect_living: bool,
        accum: Option<&SuccessVector>,
    ) -> (HitsVector, Vec<Request>) {
        let (unique_ids, living) = self.populate_operations(reqs, collect_living);
        let needed_len = unique_ids as usize + 1;

        let mut hits = match accum {
            Some(existing) => HitsVector::from_accumulated(existing, needed_len.max(existing.len())),
            None => HitsVector::zeroed(needed_len),
        };
        debug!(unique_ids, ops = self.operations.len(), "built operation array");

        if !reqs.is_empty() {
            let seq = ProjSequence::new(1, reqs.len() as ReqCount, &mut self.operations);
            rayon::scope(|scope| do_projections(scope, &hits, seq));
        }
        hits.ensure_len(needed_len);

        (hits, living)
    }

    /// Return the hit-rate curve `H` over every request recorded so far,
    /// where `H[k]` is the number of requests that would hit in an LRU cache
    /// of capacity `k`. Recomputes from scratch each call (over a clone of
    /// the recorded requests) rather than draining them, so repeated calls —
    /// interleaved with further [`CacheSim::memory_access`] calls or not —
    /// each see the complete history up to that point.
    pub fn get_success_function(&mut self) -> SuccessVector {
        let mut reqs = self.requests.clone();
        let (hits, _living) = self.update_hits_vector(&mut reqs, false, None);

        let mut success = hits.into_success_vector();
        let mut running = 0;
        for slot in success.iter_mut().skip(1) {
            running += *slot;
            *slot = running;
        }
        success
    }

    /// Process one chunk of (fresh plus carried-over) requests, adding this
    /// chunk's hit counts into `hits_accum` (grown, never reset — so repeated
    /// calls build up the distribution over the whole trace processed so
    /// far) and returning the requests that survive into the next chunk.
    pub fn process_chunk(
        &mut self,
        mut requests: Vec<Request>,
        hits_accum: &mut SuccessVector,
    ) -> Vec<Request> {
        let (hits, living) = self.update_hits_vector(&mut requests, true, Some(hits_accum));
        *hits_accum = hits.into_success_vector();
        living
    }
}

impl CacheSim for IafEngine {
    fn memory_access(&mut self, addr: u64) {
        let access_number = self.requests.len() as ReqCount + 1;
        self.requests.push(Request::new(addr, access_number));
        self.total_requests += 1;
    }

    fn get_success_function(&mut self) -> SuccessVector {
        Self::get_success_function(self)
    }

    fn total_requests(&self) -> u64 {
        self.total_requests
    }
}

/// Recursively (and, above [`INLINE_THRESHOLD`], in parallel) solve `cur`,
/// freezing hits into `hits` as postfix ops resolve.
fn do_projections<'scope>(scope: &rayon::Scope<'scope>, hits: &'scope HitsVector, cur: ProjSequence<'scope>) {
    let dist = cur.end - cur.start + 1;
    if dist < BASE_CASE as ReqCount {
        do_base_case(hits, &cur);
        return;
    }

    let num_partitions = dist.min(BRANCHING as ReqCount) as usize;
    let split_amount = dist as f64 / num_partitions as f64;

    let mut state = PartitionState::new(cur.num_ops(), num_partitions, split_amount);
    let mut fractional_end = cur.end as f64;
    let mut remaining = cur;

    for i in (1..num_partitions).rev() {
        fractional_end -= split_amount;
        let left_end = fractional_end as ReqCount;
        debug_assert!(left_end >= remaining.start);

        let (left, right) = remaining.partition(left_end, i, &mut state);
        remaining = left;

        if dist <= INLINE_THRESHOLD {
            do_projections(scope, hits, right);
        } else {
            scope.spawn(move |s| do_projections(s, hits, right));
        }
    }

    do_projections(scope, hits, remaining);
}

/// Brute-force `O(w^2)` sweep for a projection narrow enough (`< BASE_CASE`
/// requests) that the divide-and-conquer overhead isn't worth it: walk the
/// ops left to right, maintaining each position's running stack distance in
/// `local_distances`, and freeze a hit whenever a postfix op resolves.
fn do_base_case(hits: &HitsVector, cur: &ProjSequence<'_>) {
    let mut full_amt: i64 = 0;
    let mut local_distances = [0i64; BASE_CASE];

    for &op in cur.ops.iter() {
        match op.kind() {
            OpKind::Prefix => {
                let target = op.target();
                for j in cur.start..=target {
                    local_distances[(j - cur.start) as usize] += op.inc_amt();
                }
            }
            OpKind::Postfix => {
                let from = op.target().max(cur.start);
                for j in from..=cur.end {
                    local_distances[(j - cur.start) as usize] += op.inc_amt();
                }
                if op.target() != 0 {
                    let hit = local_distances[(op.target() - cur.start) as usize] + full_amt;
                    debug_assert!(hit > 0);
                    hits.incr(hit as usize);
                }
            }
            OpKind::Null => {}
        }
        full_amt += op.full_amt();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn success_function_of(trace: &[u64]) -> SuccessVector {
        let mut engine = IafEngine::new();
        for &addr in trace {
            engine.memory_access(addr);
        }
        CacheSim::get_success_function(&mut engine)
    }

    #[test]
    fn empty_trace_has_empty_success_function() {
        assert_eq!(success_function_of(&[]), Vec::<ReqCount>::new());
    }

    #[test]
    fn all_unique_addresses_never_hit() {
        let success = success_function_of(&[1, 2, 3, 4]);
        assert!(success.iter().all(|&h| h == 0));
    }

    #[test]
    fn immediate_repeat_hits_at_cache_size_one() {
        // Access 1, then 1 again: distance 1, hits at every cache size >= 1.
        let success = success_function_of(&[1, 1]);
        assert_eq!(success[1], 1);
    }

    #[test]
    fn classic_four_block_trace_matches_known_curve() {
        // A single repeated pair interleaved with a distractor: distance-2 reuse.
        let success = success_function_of(&[1, 2, 1, 1]);
        assert_eq!(success.last().copied().unwrap_or(0), 2);
        assert_eq!(success[1], 1);
        assert!(success[2] >= success[1]);
    }

    #[test]
    fn success_function_is_monotone_nondecreasing_in_cache_size() {
        let success = success_function_of(&[1, 2, 3, 1, 2, 3, 4, 5, 1, 6, 7, 8, 1]);
        for w in success.windows(2) {
            assert!(w[1] >= w[0]);
        }
    }

    #[test]
    fn base_case_and_recursive_path_agree_on_a_trace_larger_than_one_partition() {
        // A repeating cycle long enough to force real recursion (dist >= BASE_CASE)
        // should still show every cycle-length repeat hitting at that cache size.
        let cycle: Vec<u64> = (0..40).collect();
        let mut trace = Vec::new();
        for _ in 0..20 {
            trace.extend_from_slice(&cycle);
        }
        let success = success_function_of(&trace);
        assert_eq!(success.last().copied().unwrap_or(0), (trace.len() - 40) as ReqCount);
    }

    #[test]
    fn canonical_repeated_block_matches_documented_curve() {
        let block: [u64; 12] = [1, 2, 3, 4, 1, 2, 3, 4, 5, 4, 6, 5];
        let trace: Vec<u64> = block.iter().copied().cycle().take(block.len() * 20).collect();
        let success = success_function_of(&trace);
        assert_eq!(success[1], 0);
        assert_eq!(success[2], 20);
        assert_eq!(success[3], 40);
        assert_eq!(success[4], 120);
        assert_eq!(success[5], 139);
        assert_eq!(success[6], 234);
        assert_eq!(success.last().copied().unwrap_or(0), 234);
    }

    #[test]
    fn repeated_calls_without_new_accesses_are_idempotent() {
        let mut engine = IafEngine::new();
        for &addr in &[1u64, 2, 1, 1] {
            engine.memory_access(addr);
        }
        let first = CacheSim::get_success_function(&mut engine);
        let second = CacheSim::get_success_function(&mut engine);
        assert_eq!(first, second);
    }

    #[test]
    fn interleaved_calls_match_single_shot_prefixes() {
        let trace = [1u64, 2, 3, 1, 2, 3, 4, 5, 1, 6, 7, 8, 1];

        let mut incremental = IafEngine::new();
        let mut snapshots = Vec::new();
        for &addr in &trace {
            incremental.memory_access(addr);
            snapshots.push(CacheSim::get_success_function(&mut incremental));
        }

        for (i, snapshot) in snapshots.iter().enumerate() {
            let prefix_only = success_function_of(&trace[..=i]);
            assert_eq!(snapshot, &prefix_only, "mismatch at prefix length {}", i + 1);
        }
    }

    #[test]
    fn process_chunk_accumulates_hits_across_calls() {
        let mut engine = IafEngine::new();
        let mut hits_accum: SuccessVector = Vec::new();

        let first_chunk = vec![
            Request::new(1, 1),
            Request::new(2, 2),
            Request::new(1, 3),
        ];
        let living = engine.process_chunk(first_chunk, &mut hits_accum);
        // addr 2 never recurs within the chunk, so it survives as living.
        assert!(living.iter().any(|r| r.addr == 2));

        let mut next_chunk = living;
        next_chunk.push(Request::new(2, next_chunk.len() as ReqCount + 1));
        let _ = engine.process_chunk(next_chunk, &mut hits_accum);

        // The distance-1 hit from the first chunk must still be counted
        // after the second chunk's hits are folded in.
        assert!(hits_accum[1] >= 1);
    }
}
