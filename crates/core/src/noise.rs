//! Seeded 2D gradient noise and fractal (FBM) summation.
//!
//! [`GradientNoise`] is improved Perlin noise over a [`PermutationTable`]
//! shuffled from a 32-bit seed. [`Fbm`] sums octaves of any
//! [`NoiseFn<f64, 2>`](noise::NoiseFn), so it composes with the generators of
//! the `noise` crate as well as with [`GradientNoise`].
//!
//! Everything here is pure: no state beyond the permutation table, defined for
//! every real input via floor/fractional decomposition.

use noise::NoiseFn;

use crate::prng::Lcg32;

/// Number of distinct lattice hashes; the noise repeats every `PERIOD` units.
pub const PERIOD: usize = 256;

/// A 512-entry byte permutation (256 shuffled values, duplicated) derived
/// from a seed. Immutable after construction.
#[derive(Clone)]
pub struct PermutationTable {
    seed: u32,
    perm: [u8; PERIOD * 2],
}

impl PermutationTable {
    /// Shuffles `0..256` with an LCG seeded by `seed`, then duplicates it so
    /// lookups of `perm[perm[x] + y + 1]` never need wrapping.
    pub fn new(seed: u32) -> Self {
        let mut base: [u8; PERIOD] = std::array::from_fn(|i| i as u8);
        Lcg32::new(seed).shuffle(&mut base);
        let perm = std::array::from_fn(|i| base[i & (PERIOD - 1)]);
        Self { seed, perm }
    }

    /// The seed this table was built from.
    pub fn seed(&self) -> u32 {
        self.seed
    }

    /// The full 512-entry table.
    pub fn as_slice(&self) -> &[u8] {
        &self.perm
    }

    #[inline]
    fn at(&self, i: usize) -> usize {
        usize::from(self.perm[i])
    }
}

impl std::fmt::Debug for PermutationTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PermutationTable")
            .field("seed", &self.seed)
            .finish_non_exhaustive()
    }
}

/// Quintic smoothstep `6t^5 - 15t^4 + 10t^3`.
#[inline]
fn fade(t: f64) -> f64 {
    t * t * t * (t * (t * 6.0 - 15.0) + 10.0)
}

#[inline]
fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + t * (b - a)
}

/// Dot product with one of eight gradient directions picked by `hash & 7`.
#[inline]
fn grad(hash: usize, x: f64, y: f64) -> f64 {
    let h = hash & 7;
    let (u, v) = if h < 4 { (x, y) } else { (y, x) };
    let u = if h & 1 == 0 { u } else { -u };
    let v = if h & 2 == 0 { v } else { -v };
    u + v
}

/// Wraps an already-floored coordinate onto the 256-cell lattice.
#[inline]
fn lattice(floor: f64) -> usize {
    ((floor as i64) & (PERIOD as i64 - 1)) as usize
}

/// 2D gradient noise, continuous, period 256 per axis, range roughly [-1, 1].
///
/// Exactly zero at every integer lattice point.
#[derive(Debug, Clone)]
pub struct GradientNoise {
    table: PermutationTable,
}

impl GradientNoise {
    /// Creates noise over an existing permutation table.
    pub fn new(table: PermutationTable) -> Self {
        Self { table }
    }

    /// Shorthand for `GradientNoise::new(PermutationTable::new(seed))`.
    pub fn from_seed(seed: u32) -> Self {
        Self::new(PermutationTable::new(seed))
    }

    /// The permutation table backing this generator.
    pub fn table(&self) -> &PermutationTable {
        &self.table
    }

    /// Samples the noise at `(x, y)`.
    pub fn sample(&self, x: f64, y: f64) -> f64 {
        let fx = x.floor();
        let fy = y.floor();
        let xi = lattice(fx);
        let yi = lattice(fy);
        let xf = x - fx;
        let yf = y - fy;
        let u = fade(xf);
        let v = fade(yf);

        let p = &self.table;
        let aa = p.at(p.at(xi) + yi);
        let ab = p.at(p.at(xi) + yi + 1);
        let ba = p.at(p.at(xi + 1) + yi);
        let bb = p.at(p.at(xi + 1) + yi + 1);

        lerp(
            lerp(grad(aa, xf, yf), grad(ba, xf - 1.0, yf), u),
            lerp(grad(ab, xf, yf - 1.0), grad(bb, xf - 1.0, yf - 1.0), u),
            v,
        )
    }
}

impl NoiseFn<f64, 2> for GradientNoise {
    fn get(&self, point: [f64; 2]) -> f64 {
        self.sample(point[0], point[1])
    }
}

/// Fractal Brownian motion: `octaves` copies of a base noise at doubling
/// frequency and halving amplitude, divided by the total amplitude so the
/// output range matches the base noise regardless of octave count.
#[derive(Debug, Clone)]
pub struct Fbm<N> {
    source: N,
    octaves: u32,
}

impl<N: NoiseFn<f64, 2>> Fbm<N> {
    /// Wraps `source`. An octave count of 0 is treated as 1.
    pub fn new(source: N, octaves: u32) -> Self {
        Self {
            source,
            octaves: octaves.max(1),
        }
    }

    /// Number of summed octaves.
    pub fn octaves(&self) -> u32 {
        self.octaves
    }

    /// Samples the fractal sum at `(x, y)`.
    pub fn sample(&self, x: f64, y: f64) -> f64 {
        let mut value = 0.0;
        let mut amp = 0.5;
        let mut freq = 1.0;
        let mut total = 0.0;
        for _ in 0..self.octaves {
            value += self.source.get([x * freq, y * freq]) * amp;
            total += amp;
            amp *= 0.5;
            freq *= 2.0;
        }
        value / total
    }
}

impl Fbm<GradientNoise> {
    /// FBM over [`GradientNoise`] seeded with `seed`.
    pub fn seeded(seed: u32, octaves: u32) -> Self {
        Self::new(GradientNoise::from_seed(seed), octaves)
    }
}

impl<N: NoiseFn<f64, 2>> NoiseFn<f64, 2> for Fbm<N> {
    fn get(&self, point: [f64; 2]) -> f64 {
        self.sample(point[0], point[1])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn permutation_table_is_deterministic() {
        let a = PermutationTable::new(42);
        let b = PermutationTable::new(42);
        assert_eq!(a.as_slice(), b.as_slice());
        assert_eq!(a.seed(), 42);
    }

    #[test]
    fn permutation_table_upper_half_duplicates_lower_half() {
        let table = PermutationTable::new(137);
        let perm = table.as_slice();
        assert_eq!(perm.len(), 512);
        assert_eq!(&perm[..256], &perm[256..]);
    }

    #[test]
    fn permutation_table_contains_every_byte_once_per_half() {
        let table = PermutationTable::new(73);
        let mut seen = [false; 256];
        for &b in &table.as_slice()[..256] {
            assert!(!seen[b as usize], "byte {b} repeated");
            seen[b as usize] = true;
        }
    }

    #[test]
    fn different_seeds_produce_different_tables() {
        let a = PermutationTable::new(42);
        let b = PermutationTable::new(137);
        assert_ne!(a.as_slice(), b.as_slice());
    }

    #[test]
    fn noise_is_zero_at_lattice_point() {
        let noise = GradientNoise::from_seed(42);
        assert_eq!(noise.sample(3.0, 5.0), 0.0);
        assert_eq!(noise.sample(-7.0, 0.0), 0.0);
    }

    #[test]
    fn noise_has_period_256() {
        let noise = GradientNoise::from_seed(211);
        for &(x, y) in &[(0.3, 0.7), (12.25, 99.5), (-4.1, 3.3)] {
            let a = noise.sample(x, y);
            let b = noise.sample(x + 256.0, y - 256.0);
            assert!((a - b).abs() < 1e-9, "period broken at ({x}, {y}): {a} vs {b}");
        }
    }

    #[test]
    fn noise_is_continuous_across_cell_boundaries() {
        let noise = GradientNoise::from_seed(317);
        let below = noise.sample(4.0 - 1e-9, 2.5);
        let above = noise.sample(4.0 + 1e-9, 2.5);
        assert!((below - above).abs() < 1e-6);
    }

    #[test]
    fn independent_seeds_are_decorrelated() {
        let a = GradientNoise::from_seed(42);
        let b = GradientNoise::from_seed(137);
        let mut diff = 0.0;
        for i in 0..200 {
            let x = i as f64 * 0.37 + 0.5;
            let y = i as f64 * 0.11 + 0.25;
            diff += (a.sample(x, y) - b.sample(x, y)).abs();
        }
        assert!(diff > 5.0, "seeds look correlated: total |diff| = {diff}");
    }

    #[test]
    fn fbm_with_one_octave_matches_base_noise() {
        let base = GradientNoise::from_seed(9);
        let fbm = Fbm::new(base.clone(), 1);
        for &(x, y) in &[(0.5, 0.5), (1.3, 7.9), (-2.2, 4.4)] {
            assert!((fbm.sample(x, y) - base.sample(x, y)).abs() < 1e-12);
        }
    }

    #[test]
    fn fbm_zero_octaves_is_clamped_to_one() {
        let fbm = Fbm::seeded(1, 0);
        assert_eq!(fbm.octaves(), 1);
        assert!(fbm.sample(0.5, 0.5).is_finite());
    }

    #[test]
    fn fbm_composes_with_noise_crate_generators() {
        let fbm = Fbm::new(noise::Perlin::new(42), 4);
        let v = fbm.get([0.31, 0.77]);
        assert!(v.is_finite());
        assert!((-1.0..=1.0).contains(&v));
    }

    #[test]
    fn fbm_is_itself_a_noise_fn() {
        let inner = Fbm::seeded(5, 2);
        let outer = Fbm::new(&inner, 3);
        assert!(outer.sample(1.5, 2.5).is_finite());
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn noise_vanishes_on_lattice_for_any_seed(
                seed: u32,
                x in -1000_i32..1000,
                y in -1000_i32..1000,
            ) {
                let noise = GradientNoise::from_seed(seed);
                prop_assert_eq!(noise.sample(f64::from(x), f64::from(y)), 0.0);
            }

            #[test]
            fn fbm_stays_in_unit_range(seed: u32, octaves in 1_u32..=8) {
                let fbm = Fbm::seeded(seed, octaves);
                let mut rng = Lcg32::new(seed ^ 0x9E37_79B9);
                for _ in 0..1000 {
                    let x = rng.next_f64() * 512.0 - 256.0;
                    let y = rng.next_f64() * 512.0 - 256.0;
                    let v = fbm.sample(x, y);
                    prop_assert!((-1.0..=1.0).contains(&v), "fbm({x}, {y}) = {v}");
                }
            }

            #[test]
            fn noise_is_deterministic(seed: u32, x in -300.0_f64..300.0, y in -300.0_f64..300.0) {
                let a = GradientNoise::from_seed(seed);
                let b = GradientNoise::from_seed(seed);
                prop_assert_eq!(a.sample(x, y).to_bits(), b.sample(x, y).to_bits());
            }
        }
    }
}
