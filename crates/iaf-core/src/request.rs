//! The `(addr, access_number)` pair the whole engine operates on.

use crate::op::ReqCount;
use serde::{Deserialize, Serialize};

/// A single memory access within the chunk currently being processed.
///
/// Ordering is lexicographic on `(addr, access_number)`: sorting a chunk's
/// requests groups same-`addr` runs together with access numbers ascending,
/// which is exactly what [`crate::op`] construction needs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Request {
    pub addr: u64,
    pub access_number: ReqCount,
}

impl Request {
    #[must_use]
    pub const fn new(addr: u64, access_number: ReqCount) -> Self {
        Self {
            addr,
            access_number,
        }
    }
}
