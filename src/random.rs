//! Utilities related to random numbers.

use atomic_counter::{AtomicCounter, RelaxedCounter};
use rand::{rngs::StdRng, Rng, SeedableRng};

/// Random number generator owned by a single seeding worker.
pub type WorkerRng = StdRng;

/// Hands out independent random number streams to concurrent workers.
///
/// When created with a base seed, the n-th stream handed out is always
/// seeded the same way, so a single-threaded run is reproducible.
/// Otherwise every stream is seeded from system entropy.
pub struct WorkerRngFactory {
    base_seed: Option<u64>,
    n_created: RelaxedCounter,
}

impl WorkerRngFactory {
    /// Creates a factory producing entropy-seeded streams.
    pub fn from_entropy() -> Self {
        Self {
            base_seed: None,
            n_created: RelaxedCounter::new(0),
        }
    }

    /// Creates a factory producing deterministically seeded streams.
    pub fn from_seed(base_seed: u64) -> Self {
        Self {
            base_seed: Some(base_seed),
            n_created: RelaxedCounter::new(0),
        }
    }

    /// Creates a factory that is deterministic if a base seed is given.
    pub fn new(base_seed: Option<u64>) -> Self {
        base_seed.map_or_else(Self::from_entropy, Self::from_seed)
    }

    /// Returns the number of streams handed out so far.
    pub fn number_of_streams(&self) -> usize {
        self.n_created.get()
    }

    /// Creates the next random number stream.
    pub fn create(&self) -> WorkerRng {
        let stream_idx = self.n_created.inc() as u64;
        match self.base_seed {
            Some(base_seed) => StdRng::seed_from_u64(mix_stream_seed(base_seed, stream_idx)),
            None => StdRng::from_rng(rand::thread_rng())
                .unwrap_or_else(|_| StdRng::seed_from_u64(rand::thread_rng().gen())),
        }
    }
}

impl Default for WorkerRngFactory {
    fn default() -> Self {
        Self::from_entropy()
    }
}

/// Combines a base seed and a stream index into a well-spread 64-bit seed
/// (SplitMix64 finalizer).
fn mix_stream_seed(base_seed: u64, stream_idx: u64) -> u64 {
    let mut z = base_seed.wrapping_add(stream_idx.wrapping_add(1).wrapping_mul(0x9E37_79B9_7F4A_7C15));
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}
