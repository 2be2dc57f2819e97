// crates/iaf-trace/src/lib.rs

//! Synthetic trace generation (uniform, Zipfian, working-set) and trace file
//! I/O for the LRU hit-rate-curve workspace. Kept separate from the
//! `iaf-core`/`iaf-engine`/`iaf-sim` algorithmic core since a trace source
//! is a collaborator the simulators consume, not part of the curve
//! computation itself.

#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]

pub mod generator;
pub mod io;

use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

pub use generator::{uniform_trace, working_set_trace, zipfian_trace, DEFAULT_ACCESSES, DEFAULT_ID_UNIVERSE, DEFAULT_SEED};
pub use io::{read_trace, write_trace, Radix};

/// Zipfian skew values `dump_traces.cc` emits one file per.
pub const DUMP_ZIPF_ALPHAS: [f64; 5] = [0.1, 0.2, 0.4, 0.6, 0.8];

/// Write `uniform.trace` and `zipfian_{0.1,0.2,0.4,0.6,0.8}.trace` into
/// `dir`, matching `dump_traces.cc`'s output set exactly (filenames
/// included). `accesses`/`id_universe` default to this crate's
/// [`DEFAULT_ACCESSES`]/[`DEFAULT_ID_UNIVERSE`] when the CLI doesn't override
/// them.
///
/// # Errors
/// Propagates any I/O error creating `dir` or writing a trace file into it.
pub fn dump_traces(dir: &Path, accesses: u64, id_universe: u64) -> Result<()> {
    std::fs::create_dir_all(dir).with_context(|| format!("creating trace directory {}", dir.display()))?;

    info!(accesses, id_universe, "dumping uniform trace");
    let uniform = uniform_trace(accesses, id_universe, DEFAULT_SEED);
    write_trace(&dir.join("uniform.trace"), &uniform)?;

    for alpha in DUMP_ZIPF_ALPHAS {
        info!(accesses, id_universe, alpha, "dumping zipfian trace");
        let trace = zipfian_trace(accesses, id_universe, alpha, DEFAULT_SEED);
        write_trace(&dir.join(format!("zipfian_{alpha}.trace")), &trace)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dump_traces_writes_the_documented_file_set() {
        let dir = std::env::temp_dir().join(format!("iaf-trace-dump-{}", std::process::id()));
        dump_traces(&dir, 200, 20).unwrap();

        assert!(dir.join("uniform.trace").exists());
        for alpha in DUMP_ZIPF_ALPHAS {
            assert!(dir.join(format!("zipfian_{alpha}.trace")).exists());
        }

        let _ = std::fs::remove_dir_all(&dir);
    }
}
