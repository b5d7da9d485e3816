//! Randomness as an explicit, injectable dependency.
//!
//! Every choice node consumes exactly one draw, depth-first and left to
//! right, so two runs with the same seed and source produce identical event
//! streams. Production code uses a seeded [`ChaCha8Rng`]; tests and
//! reproduction tools can script the draws instead.

use rand::Rng;
use rand_chacha::ChaCha8Rng;

/// Source of uniform draws for choice nodes.
pub trait DrawSource {
    /// Return a value in `0..bound`. `bound` is always at least 1.
    fn draw(&mut self, bound: usize) -> usize;
}

impl DrawSource for ChaCha8Rng {
    fn draw(&mut self, bound: usize) -> usize {
        self.gen_range(0..bound)
    }
}

/// Replays a fixed draw sequence, wrapping each entry into range.
///
/// When the script runs out, further draws return 0 (the first
/// alternative).
#[derive(Debug, Clone, Default)]
pub struct ScriptedDraws {
    draws: Vec<usize>,
    next: usize,
}

impl ScriptedDraws {
    pub fn new(draws: Vec<usize>) -> Self {
        Self { draws, next: 0 }
    }

    /// Number of draws consumed so far.
    pub fn consumed(&self) -> usize {
        self.next
    }
}

impl DrawSource for ScriptedDraws {
    fn draw(&mut self, bound: usize) -> usize {
        let value = self.draws.get(self.next).copied().unwrap_or(0);
        self.next += 1;
        value % bound
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn chacha_is_deterministic_per_seed() {
        let mut a = ChaCha8Rng::seed_from_u64(7);
        let mut b = ChaCha8Rng::seed_from_u64(7);
        let draws_a: Vec<usize> = (0..32).map(|_| a.draw(5)).collect();
        let draws_b: Vec<usize> = (0..32).map(|_| b.draw(5)).collect();
        assert_eq!(draws_a, draws_b);
        assert!(draws_a.iter().all(|&d| d < 5));
    }

    #[test]
    fn scripted_draws_replay_in_order() {
        let mut s = ScriptedDraws::new(vec![2, 0, 1]);
        assert_eq!(s.draw(3), 2);
        assert_eq!(s.draw(3), 0);
        assert_eq!(s.draw(3), 1);
        assert_eq!(s.consumed(), 3);
    }

    #[test]
    fn scripted_draws_wrap_into_bound() {
        let mut s = ScriptedDraws::new(vec![5]);
        assert_eq!(s.draw(3), 2);
    }

    #[test]
    fn scripted_draws_exhausted_returns_first() {
        let mut s = ScriptedDraws::new(vec![]);
        assert_eq!(s.draw(4), 0);
        assert_eq!(s.draw(4), 0);
    }
}
