use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Seeded ChaCha generator; library shuffles are reproducible per seed
#[derive(Clone)]
pub struct GameRng {
    rng: ChaCha8Rng,
    seed: u64,
}

impl GameRng {
    /// Create a new GameRng; a missing seed is drawn from the thread RNG
    pub fn new(seed: Option<u64>) -> Self {
        let seed = seed.unwrap_or_else(|| rand::thread_rng().gen());
        GameRng {
            rng: ChaCha8Rng::seed_from_u64(seed),
            seed,
        }
    }

    /// Get the seed used for this RNG
    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn shuffle<T>(&mut self, cards: &mut [T]) {
        cards.shuffle(&mut self.rng);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shuffle_reproducibility() {
        let mut a: Vec<u32> = (0..40).collect();
        let mut b = a.clone();
        GameRng::new(Some(42)).shuffle(&mut a);
        GameRng::new(Some(42)).shuffle(&mut b);
        assert_eq!(a, b, "Same seed should produce same shuffle");
    }

    #[test]
    fn test_different_seeds_shuffle_differently() {
        let mut a: Vec<u32> = (0..40).collect();
        let mut b = a.clone();
        GameRng::new(Some(1)).shuffle(&mut a);
        GameRng::new(Some(2)).shuffle(&mut b);
        assert_ne!(a, b);
    }

    #[test]
    fn test_shuffle_keeps_every_card() {
        let mut cards: Vec<u32> = (0..100).collect();
        GameRng::new(Some(9)).shuffle(&mut cards);
        cards.sort();
        assert_eq!(cards, (0..100).collect::<Vec<_>>());
    }

    #[test]
    fn test_seed_getter() {
        assert_eq!(GameRng::new(Some(999)).seed(), 999);
    }
}
