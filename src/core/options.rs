//! Generator configuration.

use super::arch::Arch;
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;

/// Options shared by the random components of a generation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GeneratorOptions {
    /// Target architecture.
    pub arch: Arch,
    /// Fixed seed for reproducible output; `None` draws from OS entropy.
    pub seed: Option<u64>,
}

impl GeneratorOptions {
    pub fn new(arch: Arch) -> Self {
        Self { arch, seed: None }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Random source described by these options.
    pub fn rng(&self) -> ChaCha20Rng {
        match self.seed {
            Some(seed) => ChaCha20Rng::seed_from_u64(seed),
            None => ChaCha20Rng::from_entropy(),
        }
    }
}

impl Default for GeneratorOptions {
    fn default() -> Self {
        Self::new(Arch::X64)
    }
}
