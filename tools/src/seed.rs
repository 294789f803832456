//! Deterministic demo-data generation.
//!
//! All randomness in the runner flows through one SeedRng derived from
//! the master seed: same seed, same run.

use rand::{RngCore, SeedableRng};
use rand_pcg::Pcg64Mcg;

pub struct SeedRng {
    inner: Pcg64Mcg,
}

impl SeedRng {
    pub fn new(seed: u64) -> Self {
        Self {
            inner: Pcg64Mcg::seed_from_u64(seed),
        }
    }

    /// Roll a float in [0.0, 1.0).
    pub fn next_f64(&mut self) -> f64 {
        let bits = self.inner.next_u64();
        (bits >> 11) as f64 * (1.0 / (1u64 << 53) as f64)
    }

    /// Roll a u64 in [0, n).
    pub fn next_u64_below(&mut self, n: u64) -> u64 {
        assert!(n > 0, "n must be > 0");
        self.inner.next_u64() % n
    }

    /// Bernoulli trial: returns true with probability p.
    pub fn chance(&mut self, p: f64) -> bool {
        self.next_f64() < p
    }

    pub fn pick<'a, T>(&mut self, items: &'a [T]) -> &'a T {
        &items[self.next_u64_below(items.len() as u64) as usize]
    }
}

/// Curated roster names for the demo household.
pub const FIRST_NAMES: &[&str] = &[
    "Avery", "Blake", "Casey", "Devon", "Emery", "Finley", "Harper", "Indigo", "Jordan", "Kai",
    "Lennon", "Morgan", "Noor", "Oakley", "Parker", "Quinn", "Riley", "Sage", "Tatum", "Uma",
    "Vesper", "Wren", "Yael", "Zion",
];

/// Chores with their point values, roughly ordered by effort.
pub const CHORES: &[(&str, i64)] = &[
    ("Make the bed", 5),
    ("Take out the trash", 5),
    ("Water the plants", 5),
    ("Wash the dishes", 10),
    ("Wipe the counters", 10),
    ("Sweep the kitchen", 10),
    ("Fold the laundry", 15),
    ("Vacuum the living room", 15),
    ("Clean the bathroom", 25),
    ("Mow the lawn", 30),
    ("Deep-clean the fridge", 40),
];
