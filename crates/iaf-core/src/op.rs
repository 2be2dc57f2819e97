//! Packed prefix/postfix/null operation records.
//!
//! An [`Op`] packs its target and type tag into a single machine word so that
//! a chunk's operation array costs two words per request rather than three.
//! The type tag is folded into the top bit of `target`; an all-zero `target`
//! is the `Null` sentinel, so a `Prefix` with `target == 0` degenerates to
//! `Null` by construction rather than by a separate branch at each call site.

use std::fmt;

/// Counts requests/targets within a chunk. Bounds the max chunk size to
/// `2^(u64::BITS - 1)` operations.
pub type ReqCount = u64;

/// Signed full-range increment amount (usually `0` or `-1`, but accumulates
/// across partition migrations so it can grow in magnitude).
pub type FullAmt = i64;

const TAG_BIT: u32 = u64::BITS - 1; // top bit
const TARGET_MASK: u64 = !(1u64 << TAG_BIT);

/// The kind of range update an [`Op`] performs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OpKind {
    /// `+1` to every position in `[chunk.start, target]`.
    Prefix,
    /// `+1` to every position in `[target, chunk.end]`.
    Postfix,
    /// No range component; only `full_amt` applies.
    Null,
}

/// A single IAF operation: a prefix or postfix range increment, or a null
/// full-increment-only placeholder. `Copy` so base-case and partition code
/// can move operations around the op array without incurring allocation.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Op {
    target: u64,
    full_amt: FullAmt,
}

impl Op {
    /// Build a `Prefix(target, full)` op. `target == 0` yields `Null(full)`:
    /// a prefix range with nothing in it collapses to a plain full-increment.
    #[must_use]
    pub fn prefix(target: ReqCount, full: FullAmt) -> Self {
        if target == 0 {
            return Self::null_with(full);
        }
        debug_assert!(target & !TARGET_MASK == 0, "target overflows tag bit");
        Self {
            target,
            full_amt: full,
        }
    }

    /// Build a `Postfix(target)` op (`full_amt` starts at zero).
    #[must_use]
    pub fn postfix(target: ReqCount) -> Self {
        debug_assert!(target > 0, "postfix target must be nonzero");
        debug_assert!(target & !TARGET_MASK == 0, "target overflows tag bit");
        Self {
            target: target | (1u64 << TAG_BIT),
            full_amt: 0,
        }
    }

    /// The zero-valued sentinel: `Null(0)`.
    #[must_use]
    pub const fn null() -> Self {
        Self {
            target: 0,
            full_amt: 0,
        }
    }

    /// A `Null` carrying a nonzero full-increment.
    #[must_use]
    pub const fn null_with(full: FullAmt) -> Self {
        Self {
            target: 0,
            full_amt: full,
        }
    }

    #[must_use]
    pub fn is_null(&self) -> bool {
        self.target == 0
    }

    #[must_use]
    pub fn kind(&self) -> OpKind {
        if self.is_null() {
            OpKind::Null
        } else if self.target & (1u64 << TAG_BIT) == 0 {
            OpKind::Prefix
        } else {
            OpKind::Postfix
        }
    }

    #[must_use]
    pub fn target(&self) -> ReqCount {
        self.target & TARGET_MASK
    }

    #[must_use]
    pub fn full_amt(&self) -> FullAmt {
        self.full_amt
    }

    /// `1` for prefix/postfix, `0` for null — the implicit `+1` every range
    /// op contributes on top of its `full_amt`.
    #[must_use]
    pub fn inc_amt(&self) -> FullAmt {
        if self.is_null() {
            0
        } else {
            1
        }
    }

    /// Add `x` to this op's full-increment, preserving its kind/target.
    pub fn add_full(&mut self, x: FullAmt) {
        self.full_amt += x;
    }

    /// Convert this op to `Null`, keeping its accumulated `full_amt` — a
    /// postfix that has fully migrated left still carries its full delta.
    pub fn make_null(&mut self) {
        self.target = 0;
    }

    /// `true` if this postfix's target lies left of `right_start`, meaning
    /// it must migrate into a left partition's scratch space during a split.
    #[must_use]
    pub fn move_to_scratch(&self, right_start: ReqCount) -> bool {
        self.kind() == OpKind::Postfix && self.target() < right_start
    }

    /// `true` if this is the prefix op whose target is exactly the current
    /// left/right partition boundary.
    #[must_use]
    pub fn is_boundary_op(&self, left_end: ReqCount) -> bool {
        self.kind() == OpKind::Prefix && self.target() == left_end
    }

    /// The full-increment contribution this op makes to partitions strictly
    /// left of `right_start`: a prefix whose target lands in the right half
    /// contributes its `inc_amt + full_amt` as a uniform full increment; any
    /// other op only contributes its own `full_amt`.
    #[must_use]
    pub fn full_incr_to_left(&self, right_start: ReqCount) -> FullAmt {
        if self.kind() == OpKind::Prefix && self.target() >= right_start {
            self.inc_amt() + self.full_amt()
        } else {
            self.full_amt()
        }
    }
}

impl fmt::Debug for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind() {
            OpKind::Prefix => write!(f, "Pr:0-{}.+{}", self.target(), self.full_amt),
            OpKind::Postfix => write!(f, "Po:{}-Inf.+{}", self.target(), self.full_amt),
            OpKind::Null => write!(f, "N:+{}", self.full_amt),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefix_with_zero_target_is_null() {
        let op = Op::prefix(0, 7);
        assert_eq!(op.kind(), OpKind::Null);
        assert_eq!(op.full_amt(), 7);
        assert!(op.is_null());
    }

    #[test]
    fn basic_accessors_round_trip() {
        let p = Op::prefix(12, -1);
        assert_eq!(p.kind(), OpKind::Prefix);
        assert_eq!(p.target(), 12);
        assert_eq!(p.full_amt(), -1);
        assert_eq!(p.inc_amt(), 1);

        let q = Op::postfix(5);
        assert_eq!(q.kind(), OpKind::Postfix);
        assert_eq!(q.target(), 5);
        assert_eq!(q.full_amt(), 0);

        let n = Op::null();
        assert_eq!(n.kind(), OpKind::Null);
        assert!(n.is_null());
    }

    #[test]
    fn make_null_preserves_full_amt() {
        let mut p = Op::postfix(9);
        p.add_full(3);
        p.make_null();
        assert!(p.is_null());
        assert_eq!(p.full_amt(), 3);
    }

    #[test]
    fn move_to_scratch_only_for_postfix_left_of_right_start() {
        assert!(Op::postfix(3).move_to_scratch(5));
        assert!(!Op::postfix(7).move_to_scratch(5));
        assert!(!Op::prefix(3, 0).move_to_scratch(5));
    }

    #[test]
    fn is_boundary_op_checks_prefix_target_equality() {
        assert!(Op::prefix(10, 0).is_boundary_op(10));
        assert!(!Op::prefix(9, 0).is_boundary_op(10));
        assert!(!Op::postfix(10).is_boundary_op(10));
    }

    #[test]
    fn full_incr_to_left_rules() {
        // Prefix landing in the right half: inc + full counted as a left full.
        let p = Op::prefix(8, 2);
        assert_eq!(p.full_incr_to_left(5), 3);
        // Prefix landing in the left half: only full counts.
        let p2 = Op::prefix(3, 2);
        assert_eq!(p2.full_incr_to_left(5), 2);
        // Postfix: only full counts regardless of target.
        let mut q = Op::postfix(9);
        q.add_full(4);
        assert_eq!(q.full_incr_to_left(5), 4);
    }
}
