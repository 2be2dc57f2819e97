// crates/iaf-sim/src/lib.rs

//! The cache simulator family built on top of [`iaf_core`]/[`iaf_engine`]:
//! two exact order-statistic-tree oracles ([`ost_tree::OsTreeCacheSim`],
//! [`reference::ReferenceLruSim`]), the bounded/streaming IAF driver
//! ([`bounded::BoundedStreamer`]), request sampling ([`sampling::SamplingAdapter`]),
//! and the [`factory::new_simulator`] picker that ties a `--sim` name to one
//! of them.

#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]

pub mod bounded;
pub mod factory;
pub mod ost_tree;
pub mod reference;
pub mod sampling;

pub use bounded::BoundedStreamer;
pub use factory::{new_simulator, SimVariant};
pub use ost_tree::OsTreeCacheSim;
pub use reference::ReferenceLruSim;
pub use sampling::SamplingAdapter;
