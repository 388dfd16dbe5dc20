//! Random number generation: a process-constructed CSPRNG handle plus a
//! seeded deterministic variant for reproducible tests.

use rand::rngs::OsRng;
use rand::RngCore;

use crate::crypto::hash::hash_into;

/// Secure random byte source. Implementors are constructed by the caller and
/// passed by reference into `keygen`, rather than reached for through a
/// process-wide singleton — this is what makes deterministic testing a
/// parameter instead of a mutation of global state.
pub trait SecureRandom {
    fn random_bytes(&mut self, size: usize) -> Vec<u8>;
}

/// Cryptographically secure source backed by the OS CSPRNG.
pub struct OsSecureRandom {
    rng: OsRng,
}

impl OsSecureRandom {
    pub fn new() -> Self {
        OsSecureRandom { rng: OsRng }
    }
}

impl Default for OsSecureRandom {
    fn default() -> Self {
        Self::new()
    }
}

impl SecureRandom for OsSecureRandom {
    fn random_bytes(&mut self, size: usize) -> Vec<u8> {
        let mut bytes = vec![0u8; size];
        self.rng.fill_bytes(&mut bytes);
        bytes
    }
}

/// Deterministic, seeded byte source for reproducible tests. NOT
/// cryptographically secure — it exists only so property tests and the
/// concrete scenarios in the test suite can reconstruct identical keys.
pub struct DeterministicRng {
    seed: Vec<u8>,
    counter: u64,
}

impl DeterministicRng {
    pub fn new(seed: &[u8]) -> Self {
        DeterministicRng {
            seed: seed.to_vec(),
            counter: 0,
        }
    }

    pub fn from_u64_seed(seed: u64) -> Self {
        Self::new(&seed.to_le_bytes())
    }
}

impl SecureRandom for DeterministicRng {
    fn random_bytes(&mut self, size: usize) -> Vec<u8> {
        let mut result = Vec::with_capacity(size);
        let mut block = [0u8; 32];
        while result.len() < size {
            let mut input = self.seed.clone();
            input.extend_from_slice(&self.counter.to_le_bytes());
            self.counter += 1;

            hash_into(&input, &mut block);
            result.extend_from_slice(&block);
        }
        result.truncate(size);
        result
    }
}
