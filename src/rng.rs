//! Deterministic splittable PRNG.
//!
//! A counter-stepped xorshift/imul mix. This is the single source of
//! randomness in the simulation; every randomized decision must come from
//! a substream derived via [`Rng::derive`] so that two independent
//! consumers (wave spawner, map generator, stash rolls, ...) never draw
//! from the same sequence.

use serde::{Deserialize, Serialize};

/// A 32-bit counter-stepped PRNG state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rng {
    state: u32,
}

impl Rng {
    /// Construct a root RNG from a seed.
    pub fn new(seed: u32) -> Self {
        Self { state: seed ^ 0x9E3779B9 }
    }

    /// Advance the state and return the next raw 32-bit word.
    fn next_u32(&mut self) -> u32 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        self.state = x;
        x.wrapping_mul(0x85EBCA6B)
    }

    /// Next float in `[0, 1)`.
    pub fn next(&mut self) -> f64 {
        (self.next_u32() as f64) / (u32::MAX as f64 + 1.0)
    }

    /// Next integer in `[0, n)`. Returns 0 when `n == 0`.
    pub fn next_int(&mut self, n: u32) -> u32 {
        if n == 0 {
            return 0;
        }
        self.next_u32() % n
    }

    /// Next float in `[lo, hi)`.
    pub fn next_range(&mut self, lo: f32, hi: f32) -> f32 {
        lo + (self.next() as f32) * (hi - lo)
    }

    /// Derive a child substream, isolating a subsystem's randomness from
    /// every other consumer of this RNG. Advances `self` as a side effect,
    /// so sibling `derive` calls against the same parent produce distinct
    /// children even when passed the same `substream` id.
    pub fn derive(&mut self, substream: u32) -> Self {
        let mixed = self
            .next_u32()
            .wrapping_mul(0xC2B2AE35)
            .wrapping_add(substream.wrapping_mul(0x27D4EB2F));
        Self { state: mixed ^ mixed.rotate_left(15) }
    }

    /// Derive a child substream keyed by a string tag (hashed via FNV-1a),
    /// for call sites that want a named subsystem rather than a numeric id.
    pub fn derive_named(&mut self, tag: &str) -> Self {
        let mut hash: u32 = 0x811C_9DC5;
        for b in tag.as_bytes() {
            hash ^= *b as u32;
            hash = hash.wrapping_mul(0x0100_0193);
        }
        self.derive(hash)
    }

    pub fn raw_state(&self) -> u32 {
        self.state
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_same_sequence() {
        let mut a = Rng::new(42);
        let mut b = Rng::new(42);
        for _ in 0..100 {
            assert_eq!(a.next_u32(), b.next_u32());
        }
    }

    #[test]
    fn different_seeds_diverge() {
        let mut a = Rng::new(1);
        let mut b = Rng::new(2);
        assert_ne!(a.next_u32(), b.next_u32());
    }

    #[test]
    fn next_is_in_unit_range() {
        let mut r = Rng::new(7);
        for _ in 0..1000 {
            let v = r.next();
            assert!(v >= 0.0 && v < 1.0);
        }
    }

    #[test]
    fn next_int_respects_bound() {
        let mut r = Rng::new(99);
        for _ in 0..1000 {
            assert!(r.next_int(7) < 7);
        }
        assert_eq!(r.next_int(0), 0);
    }

    #[test]
    fn derive_is_deterministic_and_distinct_per_substream() {
        let mut root1 = Rng::new(5);
        let mut root2 = Rng::new(5);
        let child_a = root1.derive(1);
        let child_b = root2.derive(1);
        assert_eq!(child_a, child_b);

        let mut root3 = Rng::new(5);
        let _ = root3.derive(1);
        let child_c = root3.derive(2);
        assert_ne!(child_a.state, child_c.state);
    }

    #[test]
    fn derive_named_is_deterministic() {
        let mut a = Rng::new(10);
        let mut b = Rng::new(10);
        assert_eq!(a.derive_named("map"), b.derive_named("map"));
    }
}
