//! Injectable randomness for the weather core.
//!
//! Every probabilistic choice in the simulation (transition rolls, timer
//! jitter, strike chances, bolt geometry) draws from a `RandomSource`, so a
//! test can script exact outcomes with `SequenceRandom` while production
//! code runs on a seeded ChaCha stream.

use rand::prelude::*;
use rand_chacha::ChaCha8Rng;

pub trait RandomSource {
    /// Next value in [0, 1).
    fn next_f64(&mut self) -> f64;

    /// Value in [min, max).
    fn range(&mut self, min: f64, max: f64) -> f64 {
        min + self.next_f64() * (max - min)
    }

    /// True with probability `p`.
    fn chance(&mut self, p: f64) -> bool {
        self.next_f64() < p
    }
}

/// ChaCha8-backed source. Seed 0 picks a random seed; `seed()` reports the
/// one actually used so a run can be reproduced.
#[derive(Debug, Clone)]
pub struct SeededRandom {
    seed: u64,
    rng: ChaCha8Rng,
}

impl SeededRandom {
    pub fn new(seed: u64) -> Self {
        let seed = if seed == 0 {
            rand::thread_rng().r#gen()
        } else {
            seed
        };
        Self {
            seed,
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }
}

impl RandomSource for SeededRandom {
    fn next_f64(&mut self) -> f64 {
        self.rng.r#gen::<f64>()
    }
}

/// Replays a fixed list of values, wrapping around at the end.
#[derive(Debug, Clone)]
pub struct SequenceRandom {
    values: Vec<f64>,
    cursor: usize,
}

impl SequenceRandom {
    /// Values are clamped into [0, 1). An empty list behaves like `[0.0]`.
    pub fn new(values: &[f64]) -> Self {
        let values = if values.is_empty() {
            vec![0.0]
        } else {
            values
                .iter()
                .map(|v| v.clamp(0.0, 1.0 - f64::EPSILON))
                .collect()
        };
        Self { values, cursor: 0 }
    }

    /// Always returns the same value.
    pub fn constant(value: f64) -> Self {
        Self::new(&[value])
    }
}

impl RandomSource for SequenceRandom {
    fn next_f64(&mut self) -> f64 {
        let v = self.values[self.cursor];
        self.cursor = (self.cursor + 1) % self.values.len();
        v
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seeded_random_is_deterministic() {
        let mut a = SeededRandom::new(42);
        let mut b = SeededRandom::new(42);
        for _ in 0..100 {
            assert_eq!(a.next_f64(), b.next_f64());
        }
    }

    #[test]
    fn seeded_random_stays_in_unit_interval() {
        let mut rng = SeededRandom::new(7);
        for _ in 0..10_000 {
            let v = rng.next_f64();
            assert!((0.0..1.0).contains(&v), "out of range: {}", v);
        }
    }

    #[test]
    fn zero_seed_resolves_to_nonzero_seed() {
        let rng = SeededRandom::new(0);
        let replay_seed = rng.seed();
        let mut a = rng.clone();
        let mut b = SeededRandom::new(replay_seed);
        if replay_seed != 0 {
            assert_eq!(a.next_f64(), b.next_f64());
        }
    }

    #[test]
    fn sequence_random_cycles() {
        let mut rng = SequenceRandom::new(&[0.1, 0.5, 0.9]);
        let drawn: Vec<f64> = (0..6).map(|_| rng.next_f64()).collect();
        assert_eq!(drawn, vec![0.1, 0.5, 0.9, 0.1, 0.5, 0.9]);
    }

    #[test]
    fn sequence_random_clamps_to_half_open_interval() {
        let mut rng = SequenceRandom::new(&[1.0, -0.5]);
        assert!(rng.next_f64() < 1.0);
        assert_eq!(rng.next_f64(), 0.0);
    }

    #[test]
    fn range_and_chance_helpers() {
        let mut rng = SequenceRandom::constant(0.5);
        assert!((rng.range(20.0, 60.0) - 40.0).abs() < 1e-12);
        assert!(rng.chance(0.6));
        assert!(!rng.chance(0.4));
    }
}
