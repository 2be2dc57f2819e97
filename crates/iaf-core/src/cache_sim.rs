//! The common interface every LRU simulator in this workspace implements,
//! plus the text report format shared by all of them.
//!
//! `memory_access` feeds one request at a time; `get_success_function`
//! finalizes and returns the hit-count vector `H` where `H[k]` is the number
//! of requests that would hit in an LRU cache of capacity `k`.
//! `dump_success_function` writes that vector as a fixed-width table,
//! including a trailing "Misses" row.

use crate::op::ReqCount;
use std::io::{self, Write};
use sysinfo::{Pid, ProcessRefreshKind, RefreshKind, System};

/// A hit-count vector indexed by cache capacity: `hits[k]` is the number of
/// requests that hit in an LRU cache of size `k`. `hits[0]` is always `0`.
pub type SuccessVector = Vec<ReqCount>;

/// Common interface for every cache simulator in this workspace: the exact
/// order-statistic-tree oracle, the IAF engine, and the bounded/streaming and
/// sampling wrappers built on top of it.
pub trait CacheSim {
    /// Record a single memory access to `addr`.
    fn memory_access(&mut self, addr: u64);

    /// Finalize accounting and return the hit-count vector for every cache
    /// size seen so far. Implementations may be called repeatedly (e.g. once
    /// per streamed chunk); each call accounts for all requests recorded
    /// since the simulator was constructed.
    fn get_success_function(&mut self) -> SuccessVector;

    /// Total number of [`Self::memory_access`] calls made so far, including
    /// ones later dropped as duplicates or sampled out. The denominator for
    /// hit-rate percentages in [`dump_success_function`].
    fn total_requests(&self) -> u64;

    /// Resident-set size of the current process, in MiB. Backed by
    /// `sysinfo` so it reads the same way on every target this workspace
    /// builds for.
    #[must_use]
    fn memory_usage(&self) -> f64 {
        process_rss_mib()
    }
}

/// Resident-set size of the current process, in MiB, via `sysinfo`. Shared by
/// every [`CacheSim`] implementation's default `memory_usage`.
#[must_use]
pub fn process_rss_mib() -> f64 {
    let mut sys = System::new_with_specifics(
        RefreshKind::new().with_processes(ProcessRefreshKind::everything()),
    );
    let Ok(pid) = Pid::try_from(std::process::id() as usize) else {
        return 0.0;
    };
    sys.refresh_process(pid);
    sys.process(pid)
        .map_or(0.0, |p| p.memory() as f64 / (1024.0 * 1024.0))
}

/// `round(value / total * 1e6) / 1e4`, i.e. a percentage rounded to four
/// decimal places. Mirrors `cache_sim.h::percent`.
#[must_use]
pub fn percent(value: f64, total: f64) -> f64 {
    if total == 0.0 {
        return 0.0;
    }
    (value / total * 1e6).round() / 1e4
}

/// Write the fixed-width `Cache Size | Hits | Hit Rate` table
/// `dump_success_function` prints: one row per cache size sampled at
/// `stride`, then a final "Misses" row for requests that never hit any
/// cache size in `success`. `total_requests` is the denominator for the
/// hit-rate percentages (the simulator's [`CacheSim::total_requests`]).
///
/// # Errors
/// Propagates any I/O error from `writer`.
pub fn dump_success_function<W: Write>(
    mut writer: W,
    success: &SuccessVector,
    total_requests: u64,
    stride: usize,
) -> io::Result<()> {
    let stride = stride.max(1);
    let total = total_requests as f64;

    writeln!(
        writer,
        "#{:>15}{:>16}{:>16}",
        "Cache Size", "Hits", "Hit Rate"
    )?;

    for page in (1..success.len()).step_by(stride) {
        let hits = success[page];
        writeln!(
            writer,
            "{page:>16}{hits:>16}{:>15.4}%",
            percent(hits as f64, total)
        )?;
    }

    let hits_at_max = success.last().copied().unwrap_or(0);
    let misses = total_requests.saturating_sub(hits_at_max);
    writeln!(
        writer,
        "{:>16}{misses:>16}{:>15.4}%",
        "Misses",
        percent(misses as f64, total)
    )?;
    Ok(())
}

/// Render [`dump_success_function`]'s table to an owned `String`, for
/// callers (tests, the `--format text` CLI path) that want the text in
/// memory rather than streamed to a writer.
#[must_use]
pub fn format_success_function(success: &SuccessVector, total_requests: u64, stride: usize) -> String {
    let mut buf = Vec::new();
    // `Vec<u8>` writes are infallible; the `dump_success_function` contract
    // only surfaces I/O errors from real sinks (files, sockets).
    dump_success_function(&mut buf, success, total_requests, stride)
        .unwrap_or_else(|e| unreachable!("writing to a Vec<u8> cannot fail: {e}"));
    String::from_utf8(buf).unwrap_or_else(|e| unreachable!("table is ASCII: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percent_handles_zero_total() {
        assert_eq!(percent(5.0, 0.0), 0.0);
    }

    #[test]
    fn percent_rounds_to_four_decimals() {
        assert!((percent(1.0, 3.0) - 33.3333).abs() < 1e-9);
    }

    #[test]
    fn format_success_function_has_header_and_misses_row() {
        let hits: SuccessVector = vec![0, 2, 3, 4];
        let table = format_success_function(&hits, 5, 1);
        assert!(table.starts_with("#     Cache Size"));
        assert!(table.contains("Misses"));
    }

    #[test]
    fn misses_row_uses_total_minus_last_success_entry() {
        let hits: SuccessVector = vec![0, 1, 2];
        // total_requests=5, last success entry=2 => 3 forced misses.
        let table = format_success_function(&hits, 5, 1);
        let misses_line = table.lines().last().unwrap();
        assert!(misses_line.contains('3'));
    }

    #[test]
    fn stride_skips_intermediate_cache_sizes() {
        let hits: SuccessVector = vec![0, 1, 2, 3, 4, 5];
        let table = format_success_function(&hits, 10, 2);
        // Rows for sizes 1, 3, 5 plus header plus misses = 5 lines.
        assert_eq!(table.lines().count(), 5);
    }
}
