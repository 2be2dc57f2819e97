//! The raw order-statistic-tree baseline: the same LRU-by-rank algorithm as
//! [`crate::reference::ReferenceLruSim`], but backed by a plain (unbalanced)
//! recursive binary search tree instead of [`iaf_ost::OrderStatSet`]'s
//! weight-balanced one.
//!
//! An owned-node BST with a `weight` field for rank/select; no balance
//! invariant is maintained after insert/remove, so this tree can grow
//! arbitrarily skewed over a long trace. Kept as a distinct `CacheSim`
//! variant (`OS_TREE` in `sim_factory.h`'s enum) alongside
//! `ReferenceLruSim`'s balanced tree, which is the better oracle to actually
//! run — `OS_TREE` exists to give the factory the same four-way choice
//! `sim_factory.h` offers. No raw pointers: `forbid(unsafe_code)` means
//! nodes are `Box`-owned rather than manually allocated/freed.

use std::collections::HashMap;

use iaf_core::{CacheSim, ReqCount, SuccessVector};

struct Node {
    ts: u64,
    weight: usize,
    left: Option<Box<Node>>,
    right: Option<Box<Node>>,
}

impl Node {
    fn new(ts: u64) -> Box<Self> {
        Box::new(Self {
            ts,
            weight: 1,
            left: None,
            right: None,
        })
    }

    fn weight_of(node: &Option<Box<Self>>) -> usize {
        node.as_ref().map_or(0, |n| n.weight)
    }

    /// Insert `ts` (larger timestamps sort left, so rank 0 is always the
    /// most-recently-used entry).
    fn insert(node: &mut Option<Box<Self>>, ts: u64) {
        match node {
            None => *node = Some(Self::new(ts)),
            Some(n) => {
                debug_assert!(ts != n.ts, "timestamps are unique by construction");
                if ts > n.ts {
                    Self::insert(&mut n.left, ts);
                } else {
                    Self::insert(&mut n.right, ts);
                }
                n.weight += 1;
            }
        }
    }

    /// Remove the node at in-order `rank` (0 = leftmost = most recent),
    /// returning the updated subtree.
    fn remove_rank(mut boxed: Box<Self>, rank: usize) -> Option<Box<Self>> {
        debug_assert!(rank < boxed.weight);
        let lweight = Self::weight_of(&boxed.left);

        match rank.cmp(&lweight) {
            std::cmp::Ordering::Less => {
                let left = boxed.left.take().expect("rank < lweight implies a left child");
                boxed.left = Self::remove_rank(left, rank);
                boxed.weight -= 1;
                Some(boxed)
            }
            std::cmp::Ordering::Equal => {
                boxed.weight -= 1;
                match (boxed.left.take(), boxed.right.take()) {
                    (None, right) => right,
                    (left, None) => left,
                    (Some(left), Some(right)) => {
                        // Splice: the removed node's left subtree keeps its
                        // weight/position, and the rightmost node of `left`
                        // (the new in-order predecessor) gets promoted.
                        let (promoted_ts, new_left) = Self::take_rightmost(left);
                        Some(Box::new(Self {
                            ts: promoted_ts,
                            weight: Self::weight_of(&new_left) + 1 + right.weight,
                            left: new_left,
                            right: Some(right),
                        }))
                    }
                }
            }
            std::cmp::Ordering::Greater => {
                let right = boxed.right.take().expect("rank >= lweight+1 implies a right child");
                boxed.right = Self::remove_rank(right, rank - lweight - 1);
                boxed.weight -= 1;
                Some(boxed)
            }
        }
    }

    fn take_rightmost(mut boxed: Box<Self>) -> (u64, Option<Box<Self>>) {
        match boxed.right.take() {
            None => (boxed.ts, boxed.left.take()),
            Some(right) => {
                let (ts, new_right) = Self::take_rightmost(right);
                boxed.weight -= 1;
                boxed.right = new_right;
                (ts, Some(boxed))
            }
        }
    }

    /// Rank of `ts` among all stored timestamps (0 = most recent), assuming
    /// `ts` is present.
    fn rank_of(node: &Option<Box<Self>>, ts: u64) -> usize {
        let n = node.as_ref().expect("ts must be present in the tree");
        let lweight = Self::weight_of(&n.left);
        if ts == n.ts {
            lweight
        } else if ts > n.ts {
            Self::rank_of(&n.left, ts)
        } else {
            lweight + 1 + Self::rank_of(&n.right, ts)
        }
    }
}

/// `OS_TREE`: an exact LRU simulator identical in algorithm to
/// [`crate::reference::ReferenceLruSim`], grounded directly on
/// `OSTCacheSim`/`OSTree` rather than `ContainerCacheSim`/`OrderStatisticSet`.
#[derive(Default)]
pub struct OsTreeCacheSim {
    root: Option<Box<Node>>,
    last_seen: HashMap<u64, u64>,
    page_hits: Vec<ReqCount>,
    total_requests: u64,
}

impl OsTreeCacheSim {
    /// A fresh simulator with no accesses recorded.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl CacheSim for OsTreeCacheSim {
    fn memory_access(&mut self, addr: u64) {
        self.total_requests += 1;
        let ts = self.total_requests;

        if let Some(&old_ts) = self.last_seen.get(&addr) {
            let rank = Node::rank_of(&self.root, old_ts);
            let root = self.root.take().expect("rank lookup implies a non-empty tree");
            self.root = Node::remove_rank(root, rank);
            Node::insert(&mut self.root, ts);
            self.page_hits[rank] += 1;
        } else {
            self.page_hits.push(0);
            Node::insert(&mut self.root, ts);
        }
        self.last_seen.insert(addr, ts);
    }

    fn get_success_function(&mut self) -> SuccessVector {
        let mut success = SuccessVector::with_capacity(self.page_hits.len() + 1);
        success.push(0);
        let mut running: ReqCount = 0;
        for &hits in &self.page_hits {
            running += hits;
            success.push(running);
        }
        success
    }

    fn total_requests(&self) -> u64 {
        self.total_requests
    }

    fn memory_usage(&self) -> f64 {
        let node_bytes = std::mem::size_of::<u64>() * 4;
        (Node::weight_of(&self.root) * node_bytes) as f64 / (1024.0 * 1024.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unique_addresses_never_hit() {
        let mut sim = OsTreeCacheSim::new();
        for addr in [1u64, 2, 3, 4] {
            sim.memory_access(addr);
        }
        assert!(sim.get_success_function().iter().all(|&h| h == 0));
    }

    #[test]
    fn minimal_boundary_scenario_matches_spec() {
        let mut sim = OsTreeCacheSim::new();
        for addr in [1u64, 2, 1, 1] {
            sim.memory_access(addr);
        }
        let success = sim.get_success_function();
        assert_eq!(success[1], 1);
        for &h in &success[2..] {
            assert_eq!(h, 2);
        }
    }

    #[test]
    fn matches_reference_lru_sim_on_a_mixed_trace() {
        use crate::reference::ReferenceLruSim;

        let trace = [1u64, 2, 3, 1, 2, 3, 4, 5, 1, 6, 7, 8, 1, 1, 9, 2];

        let mut ost = OsTreeCacheSim::new();
        let mut reference = ReferenceLruSim::new();
        for &addr in &trace {
            ost.memory_access(addr);
            reference.memory_access(addr);
        }

        assert_eq!(ost.get_success_function(), reference.get_success_function());
    }

    #[test]
    fn many_removals_keep_weights_consistent() {
        let mut sim = OsTreeCacheSim::new();
        let trace: Vec<u64> = (0..200).map(|i| i % 17).collect();
        for &addr in &trace {
            sim.memory_access(addr);
        }
        let success = sim.get_success_function();
        for w in success.windows(2) {
            assert!(w[1] >= w[0]);
        }
    }
}
