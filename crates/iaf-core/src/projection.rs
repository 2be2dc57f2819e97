//! A projected sub-sequence of requests together with the slice of the
//! operation array that applies to it.
//!
//! Mirrors `projection.h`/`projection.cc`: a [`ProjSequence`] owns a disjoint
//! mutable slice of a larger operation array, plus the inclusive
//! `[start, end]` request-index range it's restricted to. Partitioning
//! (`ProjSequence::partition`) splits both the range and the backing slice
//! in place, so no operation is ever copied out of the arena it was
//! allocated in.

use crate::op::{Op, ReqCount};
use crate::partition::PartitionState;

/// A contiguous slice of the op array, restricted to request range
/// `[start, end]`. `ops[0]` is always a `Null(0)` sentinel used as a merge
/// target during partitioning.
pub struct ProjSequence<'a> {
    pub start: ReqCount,
    pub end: ReqCount,
    pub ops: &'a mut [Op],
}

impl<'a> ProjSequence<'a> {
    #[must_use]
    pub fn new(start: ReqCount, end: ReqCount, ops: &'a mut [Op]) -> Self {
        debug_assert!(!ops.is_empty() && ops[0].is_null(), "seq must open on a Null sentinel");
        Self { start, end, ops }
    }

    #[must_use]
    pub fn num_ops(&self) -> usize {
        self.ops.len()
    }

    /// Split this projection at `left_end` into a left part `[start, left_end]`
    /// and a right part `[left_end + 1, end]`, migrating any postfix ops that
    /// cross the boundary into `state`'s scratch spaces and folding their
    /// full-increment contribution into the left partitions via the running
    /// `all_partitions_full_incr`/`incr_array` bookkeeping.
    ///
    /// `split_off_idx` identifies which of the `B` equal-width partitions is
    /// being carved off by this call (`B-1` calls total per recursion node,
    /// called with decreasing `split_off_idx` so the scratch space for the
    /// finished partition can be drained once no more postfixes can still
    /// target it).
    #[must_use]
    pub fn partition(
        mut self,
        left_end: ReqCount,
        split_off_idx: usize,
        state: &mut PartitionState,
    ) -> (ProjSequence<'a>, ProjSequence<'a>) {
        let seq_start = self.start;
        let seq_end = self.end;
        let right_start = left_end + 1;
        debug_assert!(seq_start <= left_end);
        debug_assert!(right_start <= seq_end);
        debug_assert!(!self.ops[0].is_null());

        // Sweep right-to-left, continuing the cursor left over from the
        // previous split at this recursion node.
        while state.cur_idx >= 0 {
            let cur_idx = state.cur_idx as usize;
            let op = self.ops[cur_idx];
            debug_assert!(
                op.kind() != crate::op::OpKind::Prefix || op.target() >= left_end,
                "prefix op with target left of the current left boundary"
            );

            if op.is_boundary_op(left_end) {
                // Fold this boundary prefix's +1 over [start, left_end] into
                // the op immediately to its left (which belongs to the left
                // child) as a full increment, then stop: everything left of
                // here belongs entirely to the left child.
                let prev = &mut self.ops[cur_idx - 1];
                prev.add_full(op.full_amt() + op.inc_amt());

                if state.merge_into_idx == state.cur_idx {
                    self.ops[cur_idx].make_null();
                } else {
                    debug_assert!(self.ops[state.merge_into_idx as usize].is_null());
                    let full = op.full_amt();
                    self.ops[state.merge_into_idx as usize].add_full(full);
                    self.ops[cur_idx] = Op::null();
                }
                state.cur_idx -= 1;
                break;
            }

            if op.move_to_scratch(right_start) {
                let partition_target =
                    crate::partition::div_ceil_f64(op.target() - (seq_start - 1), state.div_factor) - 1;
                debug_assert!((partition_target as usize) < split_off_idx);
                let p = partition_target as usize;

                let incrs = state.qry_and_upd_partition_incr(p);
                let scratch = &mut state.scratch_spaces[p];
                debug_assert!(scratch.last().is_some_and(Op::is_null));
                let stack_full = scratch.last().expect("scratch always has a Null tail").full_amt();

                let mut migrated = op;
                migrated.add_full(incrs + state.all_partitions_full_incr - stack_full);
                *scratch.last_mut().expect("scratch always has a Null tail") = migrated;

                state.all_partitions_full_incr += op.full_amt();

                let mut tail = Op::null();
                tail.add_full(incrs + state.all_partitions_full_incr);
                scratch.push(tail);

                if state.cur_idx != state.merge_into_idx {
                    let full = op.full_amt() + op.inc_amt();
                    self.ops[state.merge_into_idx as usize].add_full(full);
                    self.ops[cur_idx] = Op::null();
                } else {
                    let mut op_mut = op;
                    op_mut.add_full(op.inc_amt());
                    op_mut.make_null();
                    self.ops[cur_idx] = op_mut;
                }
            } else {
                state.all_partitions_full_incr += op.full_incr_to_left(right_start);

                if state.merge_into_idx != state.cur_idx {
                    let full = self.ops[state.merge_into_idx as usize].full_amt();
                    let mut moved = op;
                    moved.add_full(full);
                    self.ops[state.merge_into_idx as usize] = moved;
                    self.ops[cur_idx] = Op::null();
                }
                if !self.ops[state.merge_into_idx as usize].is_null() {
                    state.merge_into_idx -= 1;
                }
            }

            state.cur_idx -= 1;
        }
        debug_assert!(state.cur_idx >= 0, "sweep exhausted without finding a boundary op");

        let mut merge_into_idx = state.merge_into_idx;

        // Drain the now-finalized scratch stack for the partition we're
        // about to carve off, walking merge_into_idx leftward as we go.
        {
            let scratch = std::mem::take(&mut state.scratch_spaces[split_off_idx - 1]);
            debug_assert!(!scratch.is_empty() && scratch.last().is_some_and(Op::is_null));
            for item in &scratch[..scratch.len() - 1] {
                merge_into_idx -= 1;
                self.ops[merge_into_idx as usize] = *item;
            }
            let back = scratch[scratch.len() - 1];
            let incrs_to_end = state.qry_and_upd_partition_incr(split_off_idx - 1);
            merge_into_idx -= 1;
            let total = state.all_partitions_full_incr + incrs_to_end - back.full_amt();
            self.ops[merge_into_idx as usize].add_full(total);
        }
        state.merge_into_idx = merge_into_idx;

        let split_at = merge_into_idx as usize;
        let (left_ops, right_ops) = self.ops.split_at_mut(split_at);
        debug_assert!(left_ops[0].is_null());
        debug_assert!(right_ops[0].is_null());

        let left = ProjSequence {
            start: seq_start,
            end: left_end,
            ops: left_ops,
        };
        let right = ProjSequence {
            start: right_start,
            end: seq_end,
            ops: right_ops,
        };
        (left, right)
    }
}
