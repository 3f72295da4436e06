//! Deterministic RNG wrapper for graph construction.
//!
//! # Determinism strategy
//!
//! Every random attribute of a built graph (fan-out per parcel, surface for
//! straight-line estimates, speed, rain accessibility, direct-edge sample) is
//! drawn from one `BuildRng` owned by the graph builder and seeded from the
//! configuration.  Draws happen in a fixed order (parcels in input order,
//! then centers, then the direct sample), so two builds from the same node
//! set and seed produce bit-identical edges.
//!
//! Never reach for `thread_rng()` in builder code; it breaks this contract.

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

/// Single seeded generator owned by the graph builder.
///
/// Not `Sync`; route resolution may run in parallel but all draws stay on
/// the builder's thread.
pub struct BuildRng(SmallRng);

impl BuildRng {
    pub fn new(seed: u64) -> Self {
        BuildRng(SmallRng::seed_from_u64(seed))
    }

    /// Generate a value uniformly in `range`.
    #[inline]
    pub fn gen_range<T, R>(&mut self, range: R) -> T
    where
        T: rand::distributions::uniform::SampleUniform,
        R: rand::distributions::uniform::SampleRange<T>,
    {
        self.0.gen_range(range)
    }

    /// `true` with probability `p` (clamped to [0, 1]).
    #[inline]
    pub fn gen_bool(&mut self, p: f64) -> bool {
        self.0.gen_bool(p.clamp(0.0, 1.0))
    }

    /// Pick one value from a `(value, weight)` table.
    ///
    /// Weights need not sum to 1.  Returns `None` for an empty table or when
    /// every weight is zero.
    pub fn pick_weighted<T: Copy>(&mut self, table: &[(T, f64)]) -> Option<T> {
        let total: f64 = table.iter().map(|&(_, w)| w.max(0.0)).sum();
        if total <= 0.0 {
            return None;
        }
        let mut roll = self.0.gen_range(0.0..total);
        for &(value, weight) in table {
            let weight = weight.max(0.0);
            if roll < weight {
                return Some(value);
            }
            roll -= weight;
        }
        // Floating-point remainder: fall back to the last positive entry.
        table.iter().rev().find(|&&(_, w)| w > 0.0).map(|&(v, _)| v)
    }

    /// Choose `amount` distinct indices from `0..len` and return them in
    /// ascending order.  `amount` is clamped to `len`.
    pub fn sample_indices(&mut self, len: usize, amount: usize) -> Vec<usize> {
        let mut picked = rand::seq::index::sample(&mut self.0, len, amount.min(len)).into_vec();
        picked.sort_unstable();
        picked
    }
}
