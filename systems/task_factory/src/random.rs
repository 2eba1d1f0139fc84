//! Seeded random source backing task sizing and cosmetic draws.

use loadsplit_core::RandomSource;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use sha2::{Digest, Sha256};

const SEED_DOMAIN: &str = "loadsplit/random-source";

/// Deterministic generator seeded from a per-digit integer array.
///
/// The digits are folded through SHA-256 so that seeds differing only in
/// length (`"0"` versus `"00"`) still produce unrelated streams.
#[derive(Clone, Debug)]
pub struct SeededRandom {
    rng: ChaCha8Rng,
}

impl SeededRandom {
    /// Creates a generator from the provided digit array.
    #[must_use]
    pub fn from_digits(digits: &[u32]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(SEED_DOMAIN.as_bytes());
        hasher.update((digits.len() as u64).to_le_bytes());
        for digit in digits {
            hasher.update(digit.to_le_bytes());
        }
        let digest = hasher.finalize();
        let mut seed = [0u8; 32];
        seed.copy_from_slice(&digest);
        Self {
            rng: ChaCha8Rng::from_seed(seed),
        }
    }
}

impl RandomSource for SeededRandom {
    fn next_unit(&mut self) -> f64 {
        self.rng.gen::<f64>()
    }
}
