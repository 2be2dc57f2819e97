// crates/iaf-cli/src/main.rs

#![forbid(unsafe_code)]
#![deny(
    rust_2018_idioms,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::todo
)]

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use iaf_core::{format_success_function, CacheSim, SuccessVector};
use iaf_sim::{new_simulator, SimVariant};
use iaf_trace::{read_trace, Radix, DEFAULT_ACCESSES, DEFAULT_ID_UNIVERSE, DEFAULT_SEED};

/// `kMemoryLimit` from `params.h`: the cache-size cap `K_LIM_IAF` runs
/// `BOUND_IAF` with, matching `simulation.cc`'s
/// `new_simulator(BOUND_IAF, 65536, kMemoryLimit)`.
const K_LIM_MEM_LIMIT: usize = 75_000;
/// `BoundedIAF`'s default `min_chunk_size`, also from `params.h`'s call site.
const K_LIM_MIN_CHUNK: usize = 65_536;

#[derive(Parser, Debug)]
#[command(
    name = "iaf-cli",
    about = "LRU hit-rate-curve reference CLI",
    long_about = "LRU hit-rate-curve reference CLI.\n\nUse this tool to generate synthetic traces, process a recorded trace into a hit-rate curve, and compare cache simulator variants.",
    version = env!("CARGO_PKG_VERSION"),
    disable_help_subcommand = true
)]
struct Cli {
    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Run a synthetic workload against one simulator variant and write its
    /// success function.
    Simulate {
        /// Output path for the success function.
        #[arg(long)]
        out: PathBuf,

        /// Which cache simulator to run.
        #[arg(long, value_enum)]
        sim: SimOpt,

        /// Which synthetic workload to generate.
        #[arg(long, value_enum)]
        workload: WorkloadOpt,

        /// Zipfian skew parameter (required when `--workload zipfian`).
        #[arg(long)]
        alpha: Option<f64>,

        /// Number of synthetic accesses to generate.
        #[arg(long, default_value_t = DEFAULT_ACCESSES)]
        accesses: u64,

        /// Size of the synthetic address universe.
        #[arg(long, default_value_t = DEFAULT_ID_UNIVERSE)]
        id_universe: u64,

        /// Starting/floor chunk size for `BOUND_IAF`/`K_LIM_IAF` (ignored otherwise).
        #[arg(long, default_value_t = K_LIM_MIN_CHUNK)]
        min_chunk: usize,

        /// Cache-size reporting cap for `BOUND_IAF` (ignored otherwise; `K_LIM_IAF`
        /// always uses `params.h`'s `kMemoryLimit`).
        #[arg(long)]
        mem_limit: Option<usize>,

        /// Output report format.
        #[arg(long, value_enum, default_value_t = FormatOpt::Text)]
        format: FormatOpt,
    },

    /// Process a recorded trace file into a success function.
    ProcessTrace {
        /// Output path for the success function.
        #[arg(long)]
        succ: PathBuf,

        /// Input trace file: one request identifier per line.
        #[arg(long)]
        trace: PathBuf,

        /// Numeral base the trace file's identifiers are written in.
        #[arg(long, value_enum)]
        radix: RadixOpt,

        /// Which cache simulator to run (defaults to the unbounded IAF
        /// engine, as `process_trace.cc` hardcodes).
        #[arg(long, value_enum, default_value_t = SimOpt::Iaf)]
        sim: SimOpt,

        /// Starting/floor chunk size for `BOUND_IAF`/`K_LIM_IAF` (ignored otherwise).
        #[arg(long, default_value_t = K_LIM_MIN_CHUNK)]
        min_chunk: usize,

        /// Cache-size reporting cap for `BOUND_IAF` (ignored otherwise).
        #[arg(long)]
        mem_limit: Option<usize>,

        /// Output report format.
        #[arg(long, value_enum, default_value_t = FormatOpt::Text)]
        format: FormatOpt,
    },

    /// Emit the standard synthetic trace set (`uniform.trace` plus five
    /// Zipfian traces) into a directory.
    DumpTraces {
        /// Directory to write trace files into (created if missing).
        #[arg(long)]
        dir: PathBuf,

        /// Number of synthetic accesses per trace.
        #[arg(long, default_value_t = DEFAULT_ACCESSES)]
        accesses: u64,

        /// Size of the synthetic address universe.
        #[arg(long, default_value_t = DEFAULT_ID_UNIVERSE)]
        id_universe: u64,
    },
}

#[derive(Copy, Clone, Eq, PartialEq, Debug, ValueEnum)]
#[value(rename_all = "SCREAMING_SNAKE_CASE")]
enum SimOpt {
    OsTree,
    OsSet,
    Iaf,
    BoundIaf,
    /// `BOUND_IAF` with `params.h`'s `kMemoryLimit` cap baked in.
    KLimIaf,
}

#[derive(Copy, Clone, Eq, PartialEq, Debug, ValueEnum)]
#[value(rename_all = "lowercase")]
enum WorkloadOpt {
    Uniform,
    Zipfian,
}

#[derive(Copy, Clone, Eq, PartialEq, Debug, ValueEnum)]
#[value(rename_all = "SCREAMING_SNAKE_CASE")]
enum RadixOpt {
    Int,
    Hex,
}

#[derive(Copy, Clone, Eq, PartialEq, Debug, ValueEnum)]
#[value(rename_all = "lowercase")]
enum FormatOpt {
    Text,
    Json,
}

fn main() -> Result<()> {
    init_tracing();

    let cli = Cli::parse();
    match cli.cmd {
        Cmd::Simulate {
            out,
            sim,
            workload,
            alpha,
            accesses,
            id_universe,
            min_chunk,
            mem_limit,
            format,
        } => simulate(out, sim, workload, alpha, accesses, id_universe, min_chunk, mem_limit, format),

        Cmd::ProcessTrace {
            succ,
            trace,
            radix,
            sim,
            min_chunk,
            mem_limit,
            format,
        } => process_trace(succ, trace, radix, sim, min_chunk, mem_limit, format),

        Cmd::DumpTraces {
            dir,
            accesses,
            id_universe,
        } => dump_traces(dir, accesses, id_universe),
    }
}

/// Initialize tracing with an env-driven filter (default INFO).
fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let fmt_layer = fmt::layer().with_target(false).with_level(true).compact();

    let _ = tracing_subscriber::registry().with(filter).with(fmt_layer).try_init();
}

fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(dir) = path.parent() {
        if !dir.as_os_str().is_empty() {
            std::fs::create_dir_all(dir).with_context(|| format!("creating parent directory {}", dir.display()))?;
        }
    }
    Ok(())
}

fn build_sim(sim: SimOpt, min_chunk: usize, mem_limit: Option<usize>) -> Box<dyn CacheSim> {
    match sim {
        SimOpt::OsTree => new_simulator(SimVariant::OsTree, min_chunk, mem_limit),
        SimOpt::OsSet => new_simulator(SimVariant::OsSet, min_chunk, mem_limit),
        SimOpt::Iaf => new_simulator(SimVariant::Iaf, min_chunk, mem_limit),
        SimOpt::BoundIaf => new_simulator(SimVariant::BoundIaf, min_chunk, mem_limit),
        SimOpt::KLimIaf => new_simulator(SimVariant::BoundIaf, K_LIM_MIN_CHUNK, Some(K_LIM_MEM_LIMIT)),
    }
}

/// The JSON shape of a success-function report; the text report is
/// `iaf_core::format_success_function`'s fixed-width table.
#[derive(Serialize, serde::Deserialize)]
struct SuccessReport {
    cache_size: Vec<u64>,
    hits: Vec<u64>,
    hit_rate_pct: Vec<f64>,
    misses: u64,
    miss_rate_pct: f64,
}

fn build_report(success: &SuccessVector, total_requests: u64) -> SuccessReport {
    let cache_size: Vec<u64> = (1..success.len() as u64).collect();
    let hits: Vec<u64> = success.iter().skip(1).copied().collect();
    let hit_rate_pct: Vec<f64> = hits
        .iter()
        .map(|&h| iaf_core::percent(h as f64, total_requests as f64))
        .collect();
    let hits_at_max = success.last().copied().unwrap_or(0);
    let misses = total_requests.saturating_sub(hits_at_max);
    let miss_rate_pct = iaf_core::percent(misses as f64, total_requests as f64);

    SuccessReport {
        cache_size,
        hits,
        hit_rate_pct,
        misses,
        miss_rate_pct,
    }
}

fn write_report(out: &Path, success: &SuccessVector, total_requests: u64, format: FormatOpt) -> Result<()> {
    ensure_parent_dir(out)?;
    let file = File::create(out).with_context(|| format!("creating output file {}", out.display()))?;
    let mut writer = BufWriter::new(file);

    match format {
        FormatOpt::Text => {
            let table = format_success_function(success, total_requests, 1);
            writer.write_all(table.as_bytes())?;
        }
        FormatOpt::Json => {
            let report = build_report(success, total_requests);
            serde_json::to_writer_pretty(&mut writer, &report).context("serializing success report as JSON")?;
            writer.write_all(b"\n")?;
        }
    }
    writer.flush()?;
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn simulate(
    out: PathBuf,
    sim: SimOpt,
    workload: WorkloadOpt,
    alpha: Option<f64>,
    accesses: u64,
    id_universe: u64,
    min_chunk: usize,
    mem_limit: Option<usize>,
    format: FormatOpt,
) -> Result<()> {
    let trace = match workload {
        WorkloadOpt::Uniform => {
            info!(accesses, id_universe, "generating uniform workload");
            iaf_trace::uniform_trace(accesses, id_universe, DEFAULT_SEED)
        }
        WorkloadOpt::Zipfian => {
            let Some(alpha) = alpha else {
                bail!("--alpha is required for --workload zipfian");
            };
            info!(accesses, id_universe, alpha, "generating zipfian workload");
            iaf_trace::zipfian_trace(accesses, id_universe, alpha, DEFAULT_SEED)
        }
    };

    let mut simulator = build_sim(sim, min_chunk, mem_limit);
    let start = Instant::now();
    for &addr in &trace {
        simulator.memory_access(addr);
    }
    let success = simulator.get_success_function();
    let elapsed = start.elapsed();

    info!(
        latency_ms = elapsed.as_millis() as u64,
        memory_mib = simulator.memory_usage(),
        "simulation complete"
    );

    write_report(&out, &success, simulator.total_requests(), format)?;
    println!(
        "Simulated {:?} over {:?} ({} accesses) in {:.3}s, {:.2} MiB -> {}",
        sim,
        workload,
        trace.len(),
        elapsed.as_secs_f64(),
        simulator.memory_usage(),
        out.display()
    );
    Ok(())
}

fn process_trace(
    succ: PathBuf,
    trace_path: PathBuf,
    radix: RadixOpt,
    sim: SimOpt,
    min_chunk: usize,
    mem_limit: Option<usize>,
    format: FormatOpt,
) -> Result<()> {
    let radix = match radix {
        RadixOpt::Int => Radix::Decimal,
        RadixOpt::Hex => Radix::Hex,
    };

    info!(trace = %trace_path.display(), "reading trace file");
    let trace = read_trace(&trace_path, radix).with_context(|| format!("reading trace {}", trace_path.display()))?;

    let mut simulator = build_sim(sim, min_chunk, mem_limit);
    info!(requests = trace.len(), "computing success function");
    for &addr in &trace {
        simulator.memory_access(addr);
    }
    let success = simulator.get_success_function();

    info!(out = %succ.display(), "writing success function");
    write_report(&succ, &success, simulator.total_requests(), format)?;

    println!("Processed {} requests -> {}", trace.len(), succ.display());
    Ok(())
}

fn dump_traces(dir: PathBuf, accesses: u64, id_universe: u64) -> Result<()> {
    info!(dir = %dir.display(), accesses, id_universe, "dumping synthetic traces");
    iaf_trace::dump_traces(&dir, accesses, id_universe)
        .with_context(|| format!("dumping traces into {}", dir.display()))?;
    println!("Wrote uniform + 5 zipfian traces -> {}", dir.display());
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn success_for(trace: &[u64], sim: SimOpt) -> (SuccessVector, u64) {
        let mut simulator = build_sim(sim, 64, None);
        for &addr in trace {
            simulator.memory_access(addr);
        }
        let success = simulator.get_success_function();
        let total = simulator.total_requests();
        (success, total)
    }

    #[test]
    fn minimal_boundary_scenario_report_matches_documented_curve() {
        let (success, total) = success_for(&[1, 2, 1, 1], SimOpt::Iaf);
        assert_eq!(total, 4);
        let report = build_report(&success, total);
        assert_eq!(report.hits[0], 1); // cache size 1
        assert!(report.hits[1..].iter().all(|&h| h == 2));
    }

    #[test]
    fn canonical_repeated_block_report_matches_documented_curve() {
        let block: [u64; 12] = [1, 2, 3, 4, 1, 2, 3, 4, 5, 4, 6, 5];
        let trace: Vec<u64> = block.iter().copied().cycle().take(block.len() * 20).collect();
        let (success, _total) = success_for(&trace, SimOpt::Iaf);
        let report = build_report(&success, trace.len() as u64);
        // cache_size[k] == k + 1, hits[k] == success[k + 1]
        assert_eq!(report.hits[0], 0); // size 1
        assert_eq!(report.hits[1], 20); // size 2
        assert_eq!(report.hits[2], 40); // size 3
        assert_eq!(report.hits[3], 120); // size 4
        assert_eq!(report.hits[4], 139); // size 5
        assert_eq!(report.hits[5], 234); // size 6
    }

    #[test]
    fn text_and_json_reports_agree_on_hit_counts() {
        let dir = std::env::temp_dir().join(format!("iaf-cli-test-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();

        let (success, total) = success_for(&[1, 2, 1, 1], SimOpt::Iaf);

        let text_path = dir.join("success.txt");
        write_report(&text_path, &success, total, FormatOpt::Text).unwrap();
        let text = std::fs::read_to_string(&text_path).unwrap();
        assert!(text.contains("Misses"));

        let json_path = dir.join("success.json");
        write_report(&json_path, &success, total, FormatOpt::Json).unwrap();
        let json = std::fs::read_to_string(&json_path).unwrap();
        let report: SuccessReport = serde_json::from_str(&json).unwrap();
        assert_eq!(report.hits, build_report(&success, total).hits);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn every_sim_variant_agrees_on_the_minimal_boundary_scenario() {
        for sim in [SimOpt::OsTree, SimOpt::OsSet, SimOpt::Iaf, SimOpt::BoundIaf] {
            let (success, _total) = success_for(&[1, 2, 1, 1], sim);
            assert_eq!(success[1], 1, "{sim:?}");
            assert_eq!(success[2], 2, "{sim:?}");
        }
    }
}
