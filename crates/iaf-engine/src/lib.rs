// crates/iaf-engine/src/lib.rs

//! The Increment-and-Freeze divide-and-conquer engine.
//!
//! [`engine::IafEngine`] records a stream of memory accesses and computes,
//! in one pass, the number of hits an LRU cache of *every* size would see —
//! rather than simulating one fixed cache size at a time.

#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]

pub mod engine;
pub mod hits;

pub use engine::{IafEngine, BASE_CASE, INLINE_THRESHOLD};
pub use hits::HitsVector;
