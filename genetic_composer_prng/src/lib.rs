// Seedable pseudo-random stream for the genetic melody composer.
//
// xoshiro256++ (Blackman & Vigna, 2019), expanded from a single u64 seed with
// SplitMix64. Every stochastic decision in an evolutionary run (initial
// random walks, tournament draws, crossover cut points, each mutation trial)
// is taken from one `ComposerRng`, sequentially, so a fixed seed replays a
// run exactly.
//
// The integer helpers use rejection sampling rather than modulo reduction,
// and the float helpers use only the high bits of the 64-bit output. Nothing
// in the core generator touches floating point, so output is identical on
// every platform.

use serde::{Deserialize, Serialize};
use std::collections::hash_map::RandomState;
use std::hash::{BuildHasher, Hasher};
use std::time::{SystemTime, UNIX_EPOCH};

/// The composer's only source of randomness.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ComposerRng {
    s: [u64; 4],
}

impl ComposerRng {
    /// Create a generator from a `u64` seed. Equal seeds give equal streams.
    pub fn new(seed: u64) -> Self {
        let mut sm = seed;
        Self {
            s: [
                splitmix64(&mut sm),
                splitmix64(&mut sm),
                splitmix64(&mut sm),
                splitmix64(&mut sm),
            ],
        }
    }

    /// Create a generator from process entropy.
    ///
    /// Mixes the per-process random hasher keys with the wall clock. Use
    /// [`ComposerRng::new`] whenever a run has to be reproducible.
    pub fn from_entropy() -> Self {
        Self::new(entropy_seed())
    }

    pub fn next_u64(&mut self) -> u64 {
        let result = (self.s[0].wrapping_add(self.s[3]))
            .rotate_left(23)
            .wrapping_add(self.s[0]);

        let t = self.s[1] << 17;

        self.s[2] ^= self.s[0];
        self.s[3] ^= self.s[1];
        self.s[1] ^= self.s[2];
        self.s[0] ^= self.s[3];

        self.s[2] ^= t;
        self.s[3] = self.s[3].rotate_left(45);

        result
    }

    /// Uniform `f64` in [0, 1) built from the upper 53 bits.
    pub fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Uniform integer in `[low, high)`. Panics if `low >= high`.
    pub fn range_u64(&mut self, low: u64, high: u64) -> u64 {
        assert!(low < high, "range_u64: low must be less than high");
        let span = high - low;
        if span.is_power_of_two() {
            return low + (self.next_u64() & (span - 1));
        }
        let threshold = span.wrapping_neg() % span;
        loop {
            let r = self.next_u64();
            if r >= threshold {
                return low + (r % span);
            }
        }
    }

    /// Uniform `usize` in `[low, high)`. Panics if `low >= high`.
    pub fn range_usize(&mut self, low: usize, high: usize) -> usize {
        self.range_u64(low as u64, high as u64) as usize
    }

    /// Uniform `usize` in `[low, high]`. Panics if `low > high`.
    pub fn range_usize_inclusive(&mut self, low: usize, high: usize) -> usize {
        assert!(low <= high, "range_usize_inclusive: low must be <= high");
        self.range_u64(low as u64, high as u64 + 1) as usize
    }

    /// Uniform `i32` in `[low, high]`, e.g. a semitone step in `[-12, 12]`.
    ///
    /// Panics if `low > high`.
    pub fn range_i32_inclusive(&mut self, low: i32, high: i32) -> i32 {
        assert!(low <= high, "range_i32_inclusive: low must be <= high");
        let span = (high as i64 - low as i64 + 1) as u64;
        (low as i64 + self.range_u64(0, span) as i64) as i32
    }

    /// `true` with probability `p`. `p <= 0` never fires, `p >= 1` always does.
    pub fn random_bool(&mut self, p: f64) -> bool {
        self.next_f64() < p
    }

    /// Pick one element uniformly, or `None` for an empty slice.
    pub fn choose<'a, T>(&mut self, items: &'a [T]) -> Option<&'a T> {
        if items.is_empty() {
            None
        } else {
            Some(&items[self.range_usize(0, items.len())])
        }
    }
}

/// SplitMix64 step, used only to expand the seed.
fn splitmix64(state: &mut u64) -> u64 {
    *state = state.wrapping_add(0x9e37_79b9_7f4a_7c15);
    let mut z = *state;
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    z ^ (z >> 31)
}

fn entropy_seed() -> u64 {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0);
    let mut hasher = RandomState::new().build_hasher();
    hasher.write_u64(nanos);
    hasher.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_same_stream() {
        let mut a = ComposerRng::new(42);
        let mut b = ComposerRng::new(42);
        for _ in 0..1000 {
            assert_eq!(a.next_u64(), b.next_u64());
        }
    }

    #[test]
    fn different_seeds_diverge() {
        let mut a = ComposerRng::new(42);
        let mut b = ComposerRng::new(43);
        assert_ne!(a.next_u64(), b.next_u64());
    }

    #[test]
    fn f64_in_unit_range() {
        let mut rng = ComposerRng::new(12345);
        for _ in 0..10_000 {
            let v = rng.next_f64();
            assert!((0.0..1.0).contains(&v), "f64 out of range: {v}");
        }
    }

    #[test]
    fn range_usize_within_bounds() {
        let mut rng = ComposerRng::new(555);
        for _ in 0..10_000 {
            let v = rng.range_usize(5, 15);
            assert!((5..15).contains(&v), "range_usize out of range: {v}");
        }
    }

    #[test]
    fn range_usize_inclusive_reaches_upper_bound() {
        let mut rng = ComposerRng::new(1);
        let mut saw_max = false;
        for _ in 0..10_000 {
            let v = rng.range_usize_inclusive(0, 1);
            assert!(v <= 1);
            if v == 1 {
                saw_max = true;
            }
        }
        assert!(saw_max, "range_usize_inclusive should reach the upper bound");
    }

    #[test]
    fn semitone_steps_cover_both_octave_ends() {
        let mut rng = ComposerRng::new(777);
        let mut seen = [false; 25];
        for _ in 0..20_000 {
            let step = rng.range_i32_inclusive(-12, 12);
            assert!((-12..=12).contains(&step), "step out of range: {step}");
            seen[(step + 12) as usize] = true;
        }
        assert!(seen.iter().all(|&s| s), "every step in [-12, 12] should occur");
    }

    #[test]
    fn random_bool_extremes() {
        let mut rng = ComposerRng::new(42);
        for _ in 0..100 {
            assert!(!rng.random_bool(0.0));
            assert!(rng.random_bool(1.0));
        }
    }

    #[test]
    fn random_bool_rate_is_roughly_respected() {
        let mut rng = ComposerRng::new(9);
        let n = 10_000;
        let hits = (0..n).filter(|_| rng.random_bool(0.3)).count();
        let rate = hits as f64 / n as f64;
        assert!((0.27..0.33).contains(&rate), "expected ~30%, got {rate}");
    }

    #[test]
    fn choose_handles_empty_and_singleton() {
        let mut rng = ComposerRng::new(3);
        let empty: [i32; 0] = [];
        assert!(rng.choose(&empty).is_none());
        assert_eq!(rng.choose(&[7]), Some(&7));
    }

    #[test]
    fn serialization_preserves_stream_position() {
        let mut rng = ComposerRng::new(42);
        for _ in 0..100 {
            rng.next_u64();
        }
        let json = serde_json::to_string(&rng).unwrap();
        let mut restored: ComposerRng = serde_json::from_str(&json).unwrap();
        for _ in 0..100 {
            assert_eq!(rng.next_u64(), restored.next_u64());
        }
    }
}
