//! State shared across the `B - 1` splits performed at a single recursion
//! node: the right-to-left sweep cursor, the merge target, the per-partition
//! scratch stacks that absorb postfix ops crossing a split boundary, and the
//! implicit segment tree (`incr_array`) used to query/update how many
//! partitions to the right of a given one have already been finalized.
//!
//! Ported from `partition.h`/`projection.cc`'s `PartitionState`.

use crate::op::{FullAmt, Op};

/// Number of children a recursion node splits into. Matches `kIafBranching`.
pub const BRANCHING: usize = 16;

/// `ceil(log2(BRANCHING))`, i.e. the depth of the implicit segment tree over
/// `BRANCHING - 1` internal split points.
const INCR_TREE_DEPTH: u32 = BRANCHING.trailing_zeros();

/// `ceil(num / denom)` for a `ReqCount` numerator divided by a fractional
/// partition width, returned as a plain `u64` index.
#[must_use]
pub fn div_ceil_f64(num: u64, denom: f64) -> u64 {
    #[allow(clippy::cast_precision_loss)]
    let q = (num as f64 / denom).ceil();
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    {
        q as u64
    }
}

/// Shared bookkeeping for one level of recursive partitioning. A fresh
/// `PartitionState` is built once per recursion node and threaded through
/// all `BRANCHING - 1` calls to [`crate::projection::ProjSequence::partition`]
/// at that node.
pub struct PartitionState {
    /// `1 / B` of the node's request-range width, as a float so partition
    /// boundaries can be computed without accumulating integer rounding
    /// bias across repeated divisions.
    pub div_factor: f64,
    /// Right-to-left sweep cursor into the node's op array. Signed so it can
    /// go to `-1` once the sweep is exhausted.
    pub cur_idx: isize,
    /// Index below which all ops are confirmed to belong to the partition(s)
    /// already carved off; also signed for the same reason as `cur_idx`.
    pub merge_into_idx: isize,
    /// Running full-increment total contributed by ops that have already
    /// been folded into some left partition.
    pub all_partitions_full_incr: FullAmt,
    /// One scratch stack per internal split point (`BRANCHING - 1` of them
    /// at most; sized to `num_partitions - 1` for the node's actual
    /// branching factor). Each starts with a single `Null` placeholder.
    pub scratch_spaces: Vec<Vec<Op>>,
    /// Implicit segment tree over the scratch spaces, used to query/update
    /// how many full-increments have accrued to the right of a partition
    /// boundary without storing by all pairs explicitly.
    incr_array: [u64; BRANCHING],
}

impl PartitionState {
    /// Build a fresh state for a node covering `num_ops` operations, to be
    /// split into `num_partitions` children each of fractional width
    /// `1 / div_factor`.
    #[must_use]
    pub fn new(num_ops: usize, num_partitions: usize, div_factor: f64) -> Self {
        debug_assert!(num_partitions >= 2 && num_partitions <= BRANCHING);
        let mut scratch_spaces = Vec::with_capacity(num_partitions - 1);
        for _ in 0..num_partitions - 1 {
            scratch_spaces.push(vec![Op::null()]);
        }
        Self {
            div_factor,
            cur_idx: num_ops as isize - 1,
            merge_into_idx: num_ops as isize - 1,
            all_partitions_full_incr: 0,
            scratch_spaces,
            incr_array: [0; BRANCHING],
        }
    }

    /// Query the accumulated full-increment to the right of `partition_target`
    /// and record that this target has now been visited, via an implicit
    /// binary-indexed walk over `incr_array`, using plain shift/compare
    /// bookkeeping rather than an XOR/mask trick.
    #[must_use]
    pub fn qry_and_upd_partition_incr(&mut self, partition_target: usize) -> u64 {
        debug_assert!(partition_target < BRANCHING - 1);
        let mut depth_shift = INCR_TREE_DEPTH - 1;
        let mut idx = 0usize;
        let mut sum = 0u64;

        for _ in 0..INCR_TREE_DEPTH {
            debug_assert!(idx < BRANCHING);
            let go_right = (partition_target >> depth_shift) & 1 == 1;
            if go_right {
                sum += self.incr_array[idx];
            } else {
                self.incr_array[idx] += 1;
            }
            idx = 2 * idx + usize::from(go_right) + 1;
            if depth_shift > 0 {
                depth_shift -= 1;
            }
        }
        sum
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn div_ceil_f64_matches_integer_ceil_division() {
        assert_eq!(div_ceil_f64(10, 4.0), 3);
        assert_eq!(div_ceil_f64(8, 4.0), 2);
        assert_eq!(div_ceil_f64(1, 4.0), 1);
        assert_eq!(div_ceil_f64(0, 4.0), 0);
    }

    #[test]
    fn fresh_state_has_empty_scratch_stacks_seeded_with_null() {
        let state = PartitionState::new(100, 4, 25.0);
        assert_eq!(state.scratch_spaces.len(), 3);
        for s in &state.scratch_spaces {
            assert_eq!(s.len(), 1);
            assert!(s[0].is_null());
        }
        assert_eq!(state.cur_idx, 99);
        assert_eq!(state.merge_into_idx, 99);
    }

    #[test]
    fn incr_query_is_monotone_nondecreasing_as_more_lefts_are_recorded() {
        let mut state = PartitionState::new(16, BRANCHING, 1.0);
        let first = state.qry_and_upd_partition_incr(14);
        state.qry_and_upd_partition_incr(0);
        let second = state.qry_and_upd_partition_incr(14);
        assert!(second >= first);
    }
}
