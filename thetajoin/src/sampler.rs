//! Sources of routing indices.
//!
//! A tuple is routed by an index in its relation's domain. The index either comes from an
//! explicitly owned random generator, or from a hash of the tuple's key when the same tuple must
//! always land on the same workers.

use std::hash::{BuildHasher, Hash, Hasher};

use ahash::RandomState;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Draws uniformly distributed indices.
///
/// Each producer owns its sampler, there is no process wide generator.
#[derive(Clone, Debug)]
pub struct IndexSampler {
    rng: StdRng,
}

impl IndexSampler {
    /// Create a sampler, reproducible when `seed` is given.
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(s) => StdRng::seed_from_u64(s),
            None => StdRng::from_entropy(),
        };
        Self { rng }
    }

    /// Uniform index in `[0, size)`. `size` must be positive.
    pub fn sample(&mut self, size: u64) -> u64 {
        self.rng.gen_range(0..size)
    }
}

/// Hashes keys into indices.
///
/// Seeds are fixed so that every router in a query agrees on the index of a key.
#[derive(Clone, Debug)]
pub struct KeyHasher {
    state: RandomState,
}

const KEY_HASHER_SEEDS: [u64; 4] = [
    0x243f_6a88_85a3_08d3,
    0x1319_8a2e_0370_7344,
    0xa409_3822_299f_31d0,
    0x082e_fa98_ec4e_6c89,
];

impl Default for KeyHasher {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyHasher {
    pub fn new() -> Self {
        let [k0, k1, k2, k3] = KEY_HASHER_SEEDS;
        Self {
            state: RandomState::with_seeds(k0, k1, k2, k3),
        }
    }

    /// Index of `key` in `[0, size)`. `size` must be positive.
    pub fn index_of<K: Hash + ?Sized>(&self, key: &K, size: u64) -> u64 {
        let mut hasher = self.state.build_hasher();
        key.hash(&mut hasher);
        hasher.finish() % size
    }
}

#[cfg(test)]
mod tests {
    use crate::sampler::{IndexSampler, KeyHasher};

    #[test]
    fn test_seeded_sampler_is_reproducible() {
        let mut s1 = IndexSampler::new(Some(42));
        let mut s2 = IndexSampler::new(Some(42));

        let v1: Vec<u64> = (0..100).map(|_| s1.sample(1000)).collect();
        let v2: Vec<u64> = (0..100).map(|_| s2.sample(1000)).collect();
        assert_eq!(v1, v2);
    }

    #[test]
    fn test_sampler_stays_in_range() {
        let mut sampler = IndexSampler::new(None);
        for _ in 0..1000 {
            assert!(sampler.sample(7) < 7);
        }
        assert_eq!(0, sampler.sample(1));
    }

    #[test]
    fn test_sampler_distribution() {
        let mut sampler = IndexSampler::new(Some(7));
        let mut counts = vec![0; 4];
        for _ in 0..4000 {
            counts[sampler.sample(4) as usize] += 1;
        }

        for count in counts {
            assert!(count > 800 && count < 1200, "Unbalanced distribution: {}", count);
        }
    }

    #[test]
    fn test_key_hasher_is_stable() {
        let h1 = KeyHasher::new();
        let h2 = KeyHasher::default();

        for key in ["FRANCE", "GERMANY", "customer#42"] {
            assert_eq!(h1.index_of(key, 100), h2.index_of(key, 100));
            assert!(h1.index_of(key, 100) < 100);
        }
        assert_eq!(h1.index_of(&17u64, 10), h1.index_of(&17u64, 10));
    }
}
