//! The order-statistic-tree baseline oracle: simulates LRU directly by
//! tracking each address's last-access timestamp in an [`OrderStatSet`] keyed
//! so the most recently used timestamp has rank `0`.
//!
//! A hit at rank `r` (the number of more-recently-used addresses)
//! increments `page_hits[r]`; `get_success_function` turns that histogram
//! into a cumulative hit count per cache size via a running sum.

use std::cmp::Reverse;
use std::collections::HashMap;

use iaf_core::{CacheSim, ReqCount, SuccessVector};
use iaf_ost::OrderStatSet;

/// The exact (non-approximating) LRU simulator: maintains every address's
/// position in recency order and reads off the reuse distance directly,
/// rather than deriving it via Increment-and-Freeze's divide-and-conquer.
/// `O(log n)` per access, `O(n)` memory for `n` distinct addresses live at
/// once — the reference this workspace's IAF engine is checked against.
#[derive(Default)]
pub struct ReferenceLruSim {
    /// Timestamps of currently-resident addresses, ordered so the largest
    /// (most recent) timestamp has rank `0`.
    recency: OrderStatSet<Reverse<u64>>,
    last_seen: HashMap<u64, u64>,
    /// `page_hits[r]` counts accesses that hit at LRU-stack rank `r`.
    page_hits: Vec<ReqCount>,
    total_requests: u64,
}

impl ReferenceLruSim {
    /// A fresh simulator with no accesses recorded.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl CacheSim for ReferenceLruSim {
    fn memory_access(&mut self, addr: u64) {
        self.total_requests += 1;
        let ts = self.total_requests;

        if let Some(&old_ts) = self.last_seen.get(&addr) {
            let rank = self.recency.rank(&Reverse(old_ts));
            self.recency.remove(&Reverse(old_ts));
            self.recency.insert(Reverse(ts));
            self.page_hits[rank] += 1;
            self.last_seen.insert(addr, ts);
        } else {
            self.page_hits.push(0);
            self.last_seen.insert(addr, ts);
            self.recency.insert(Reverse(ts));
        }
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
        // Rough estimate: an order-statistic-tree node plus a hash-map
        // entry per live address.
        let node_bytes = std::mem::size_of::<u64>() * 4;
        (self.recency.len() * node_bytes) as f64 / (1024.0 * 1024.0)
    }
}
