// crates/iaf-core/src/lib.rs

//! Core data types and the recursion machinery shared by every LRU
//! hit-rate-curve simulator in this workspace: the packed [`op::Op`] record,
//! [`request::Request`], the [`projection::ProjSequence`] partitioner, and
//! the [`cache_sim::CacheSim`] trait implementations are built against.

#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]

pub mod cache_sim;
pub mod op;
pub mod partition;
pub mod projection;
pub mod request;

pub use cache_sim::{
    dump_success_function, format_success_function, percent, process_rss_mib, CacheSim,
    SuccessVector,
};
pub use op::{FullAmt, Op, OpKind, ReqCount};
pub use partition::{PartitionState, BRANCHING};
pub use projection::ProjSequence;
pub use request::Request;
