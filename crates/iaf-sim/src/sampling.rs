//! Hash-based request sampling and inverse-scaling of the success curve.
//!
//! A request is admitted iff `hash(addr, seed) & mask == 0`, where `mask` is
//! a sample rate of the form `2^k - 1` (so "keep 1 in `mask + 1`"). `blake3`
//! provides the admission hash: the mask-based test doesn't care which hash
//! produces the bits, only that they're uniform and deterministic given a
//! seed.

/// Admits or drops requests by hashing their address against a fixed mask,
/// and knows how to inverse-scale a hits vector computed over the admitted
/// subsample back up to an estimate over the full trace.
#[derive(Clone, Copy, Debug)]
pub struct SamplingAdapter {
    /// `0` disables sampling (every request admitted). Otherwise a mask of
    /// the form `2^k - 1`: a request is kept when `hash & rate == 0`, i.e.
    /// one in `rate + 1` requests survives.
    sample_rate: u64,
    seed: u64,
}

impl SamplingAdapter {
    /// No sampling: every request is admitted.
    #[must_use]
    pub const fn disabled() -> Self {
        Self {
            sample_rate: 0,
            seed: 0,
        }
    }

    /// Keep one request in every `sample_rate + 1`. `sample_rate` must be of
    /// the form `2^k - 1` for the mask-based admission test to be uniform;
    /// `sample_rate == 0` is equivalent to [`Self::disabled`].
    #[must_use]
    pub const fn new(sample_rate: u64, seed: u64) -> Self {
        Self { sample_rate, seed }
    }

    /// `true` if sampling is active (some requests will be dropped).
    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.sample_rate > 0
    }

    /// The configured sample-rate mask (`0` if disabled).
    #[must_use]
    pub const fn sample_rate(&self) -> u64 {
        self.sample_rate
    }

    /// `true` if `addr` should be recorded under this sampling policy.
    #[must_use]
    pub fn admit(&self, addr: u64) -> bool {
        self.sample_rate == 0 || hash64(addr, self.seed) & self.sample_rate == 0
    }

    /// Expand a hits vector computed over the admitted subsample into a
    /// success curve over the full (unsampled) request count: each sampled
    /// hit count is broadcast across `sample_rate + 1` adjacent cache sizes,
    /// with the running total scaled by the same factor and capped at
    /// `total_requests - 1` (intentional — see DESIGN.md; this loses the
    /// very last sampled hit's contribution to the cap).
    #[must_use]
    pub fn expand_success(&self, sampled_hits: &[u64], num_duplicates: u64, total_requests: u64) -> Vec<u64> {
        if !self.is_enabled() {
            let mut running = num_duplicates;
            let mut out = Vec::with_capacity(sampled_hits.len());
            for (i, &h) in sampled_hits.iter().enumerate() {
                if i == 0 {
                    out.push(0);
                    continue;
                }
                running += h;
                out.push(running);
            }
            return out;
        }

        let samples_per_measure = self.sample_rate + 1;
        let mut running = num_duplicates * samples_per_measure;
        let cap = total_requests.saturating_sub(1);

        let mut out = vec![0u64; sampled_hits.len() * samples_per_measure as usize];
        for (i, &h) in sampled_hits.iter().enumerate() {
            running += h * samples_per_measure;
            running = running.min(cap);

            let pos = i * samples_per_measure as usize;
            let num_to_update = (out.len() - pos).min(samples_per_measure as usize);
            for slot in &mut out[pos..pos + num_to_update] {
                *slot = running;
            }
        }
        out
    }
}

/// `blake3::hash(addr || seed)`, read back as a little-endian `u64`. A stable
/// pseudo-random admission test: same `(addr, seed)` always hashes the same.
fn hash64(addr: u64, seed: u64) -> u64 {
    let mut buf = [0u8; 16];
    buf[0..8].copy_from_slice(&addr.to_le_bytes());
    buf[8..16].copy_from_slice(&seed.to_le_bytes());
    let digest = blake3::hash(&buf);
    let mut first8 = [0u8; 8];
    first8.copy_from_slice(&digest.as_bytes()[0..8]);
    u64::from_le_bytes(first8)
}
