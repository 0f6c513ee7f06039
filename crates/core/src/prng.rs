//! Deterministic 32-bit linear congruential generator.
//!
//! Used for the permutation-table shuffle and for scene-local pseudo-random
//! tables (glyph interference, panel text). Same seed always produces the same
//! sequence on every platform: the state update is pure wrapping `u32`
//! arithmetic.

use serde::{Deserialize, Serialize};

/// Numerical Recipes LCG: `s = s * 1664525 + 1013904223 (mod 2^32)`.
///
/// Unlike xorshift, a zero seed is a valid starting state here, so no
/// fallback seed is needed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lcg32 {
    state: u32,
}

impl Lcg32 {
    const MULTIPLIER: u32 = 1_664_525;
    const INCREMENT: u32 = 1_013_904_223;

    /// Creates a generator with the given seed.
    pub fn new(seed: u32) -> Self {
        Self { state: seed }
    }

    /// Advances the state and returns it.
    pub fn next_u32(&mut self) -> u32 {
        self.state = self
            .state
            .wrapping_mul(Self::MULTIPLIER)
            .wrapping_add(Self::INCREMENT);
        self.state
    }

    /// Returns a uniformly distributed f64 in [0, 1): the new state divided by 2^32.
    pub fn next_f64(&mut self) -> f64 {
        f64::from(self.next_u32()) / 4_294_967_296.0
    }

    /// Returns a uniformly distributed usize in [0, max).
    ///
    /// Scales `next_f64()` rather than taking a modulo, so the low bits of
    /// the LCG (which have short periods) do not dominate.
    ///
    /// # Panics
    ///
    /// Panics if `max` is 0.
    pub fn next_usize(&mut self, max: usize) -> usize {
        assert!(max > 0, "next_usize called with max = 0");
        ((self.next_f64() * max as f64) as usize).min(max - 1)
    }

    /// Fisher–Yates shuffle, walking from the last index down to 1.
    pub fn shuffle<T>(&mut self, items: &mut [T]) {
        for i in (1..items.len()).rev() {
            let j = (self.next_f64() * (i + 1) as f64) as usize;
            items.swap(i, j.min(i));
        }
    }
}
