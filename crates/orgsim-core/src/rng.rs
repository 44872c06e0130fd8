//! Run-local deterministic randomness built on SplitMix64 mixing.
//!
//! Every random draw in a run (topology wiring, skill assignment, initial
//! actor, recall choice, availability, memory retention) comes from one
//! `Rng64` stream seeded per run, so identical seeds reproduce identical
//! trajectories across processes.

/// Derive a per-run seed from a base seed and a salt (the run id).
pub fn mix_seed(seed: u64, salt: u64) -> u64 {
    let mut value = seed ^ salt.wrapping_mul(0x9E37_79B9_7F4A_7C15);
    value ^= value.rotate_left(29);
    value = value.wrapping_mul(0x517C_C1B7_2722_0A95);
    value ^ (value >> 31)
}

/// SplitMix64 stream.
#[derive(Debug, Clone)]
pub struct Rng64 {
    state: u64,
}

impl Rng64 {
    pub fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    pub fn next_u64(&mut self) -> u64 {
        self.state = self.state.wrapping_add(0x9E37_79B9_7F4A_7C15);
        let mut mixed = self.state;
        mixed = (mixed ^ (mixed >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        mixed = (mixed ^ (mixed >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
        mixed ^ (mixed >> 31)
    }

    /// Uniform draw in [0, 1).
    pub fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 * (1.0 / (1_u64 << 53) as f64)
    }

    /// Bernoulli draw; `probability <= 0.0` never fires, `>= 1.0` always does.
    pub fn chance(&mut self, probability: f64) -> bool {
        self.next_f64() < probability
    }

    /// Uniform index in `0..n`. `n` must be non-zero.
    pub fn index(&mut self, n: usize) -> usize {
        debug_assert!(n > 0, "index() needs a non-empty range");
        (self.next_u64() % n as u64) as usize
    }

    /// `k` distinct indices sampled uniformly from `0..n` (partial
    /// Fisher-Yates). Returns all of `0..n` when `k >= n`.
    pub fn sample_distinct(&mut self, n: usize, k: usize) -> Vec<usize> {
        let mut pool: Vec<usize> = (0..n).collect();
        let take = k.min(n);
        for slot in 0..take {
            let pick = slot + self.index(n - slot);
            pool.swap(slot, pick);
        }
        pool.truncate(take);
        pool
    }
}
