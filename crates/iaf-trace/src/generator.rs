//! Synthetic trace generators: uniform, Zipfian, and a "working set" mix of
//! the two, grounded in `simulation.cc`/`dump_traces.cc`'s
//! `uniform_trace`/`zipfian_trace`/`working_set_simulator`.

use rand::seq::SliceRandom as _;
use rand::{rngs::StdRng, Rng as _, SeedableRng};

/// The seed `params.h` hardcodes for every synthetic workload, kept as the
/// default so `dump-traces`/`simulate` runs are reproducible without a
/// `--seed` flag.
pub const DEFAULT_SEED: u64 = 298_234_433;

/// `kIdUniverseSize` from `params.h`: the default address-space size for the
/// synthetic workloads.
pub const DEFAULT_ID_UNIVERSE: u64 = 200_000;

/// `kAccesses` from `params.h`, scaled down from `40_000_000` to something a
/// `dump-traces` CLI call finishes quickly — callers needing the larger
/// scale pass their own `accesses` count.
pub const DEFAULT_ACCESSES: u64 = 1_000_000;

/// One request per access, drawn uniformly from `[0, id_universe)`. Mirrors
/// `uniform_trace`.
#[must_use]
pub fn uniform_trace(accesses: u64, id_universe: u64, seed: u64) -> Vec<u64> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..accesses).map(|_| rng.random_range(0..id_universe)).collect()
}

/// A Zipfian-distributed trace with skew parameter `alpha`: address `i`'s
/// frequency is proportional to `1 / (i + 1)^alpha`, normalized over
/// `id_universe` addresses, then shuffled into access order. Rounds each
/// address's share to a whole count and backfills round-trip shortfall by
/// cycling through low address ids, so the output always has exactly
/// `accesses` entries even though the rounded shares rarely sum to it
/// precisely.
#[must_use]
pub fn zipfian_trace(accesses: u64, id_universe: u64, alpha: f64, seed: u64) -> Vec<u64> {
    let mut rng = StdRng::seed_from_u64(seed);

    let divisor: f64 = (1..=id_universe).map(|i| 1.0 / (i as f64).powf(alpha)).sum();
    let freq: Vec<f64> = (1..=id_universe)
        .map(|i| (1.0 / (i as f64).powf(alpha)) / divisor)
        .collect();

    let mut seq = Vec::with_capacity(accesses as usize);
    for (id, &f) in freq.iter().enumerate() {
        #[allow(clippy::cast_sign_loss, clippy::cast_possible_truncation)]
        let num_items = (f * accesses as f64).round() as u64;
        for _ in 0..num_items {
            if seq.len() as u64 >= accesses {
                break;
            }
            seq.push(id as u64);
        }
    }

    if (seq.len() as u64) < accesses {
        let num_needed = accesses - seq.len() as u64;
        for i in 0..num_needed {
            seq.push(i % id_universe);
        }
    }
    seq.truncate(accesses as usize);

    seq.shuffle(&mut rng);
    seq
}

/// A working-set mix: with probability `locality`, draw from a small "hot"
/// working set of `working_set` addresses; otherwise draw uniformly from the
/// remaining `id_universe - working_set` "cold" addresses. Mirrors
/// `simulation.cc`'s `working_set_simulator`, exposed here as a trace rather
/// than an inline simulator loop so it can feed any [`iaf_core::CacheSim`].
///
/// # Panics
/// Panics if `working_set > id_universe` or `locality` is outside `[0, 1]` —
/// the same preconditions `params.h`'s `static_assert`s enforce at compile time.
#[must_use]
pub fn working_set_trace(
    accesses: u64,
    id_universe: u64,
    working_set: u64,
    locality: f64,
    seed: u64,
) -> Vec<u64> {
    assert!(working_set <= id_universe, "working set cannot exceed the id universe");
    assert!((0.0..=1.0).contains(&locality), "locality must be a probability");

    let mut rng = StdRng::seed_from_u64(seed);
    let leftover = id_universe - working_set;

    (0..accesses)
        .map(|_| {
            if rng.random_bool(locality) {
                rng.random_range(0..working_set)
            } else {
                working_set + rng.random_range(0..leftover.max(1))
            }
        })
        .collect()
}
