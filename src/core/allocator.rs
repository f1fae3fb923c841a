//! Randomized register selection.
//!
//! Selection draws uniformly from the catalog. Exclusion-aware selection
//! computes the eligible subset first and samples from it directly, so an
//! exclusion list that covers the whole table is reported instead of retried.

use super::arch::{Arch, RegisterSize};
use super::catalog::{Register, RegisterCatalog};
use super::error::{EncodeError, EncodeResult};
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;

/// Picks registers at random from a catalog.
pub struct RegisterAllocator<'c, R: Rng> {
    catalog: &'c RegisterCatalog,
    rng: R,
}

impl<'c, R: Rng> RegisterAllocator<'c, R> {
    /// Create an allocator over `catalog` drawing from `rng`.
    pub fn new(catalog: &'c RegisterCatalog, rng: R) -> Self {
        Self { catalog, rng }
    }

    pub fn catalog(&self) -> &'c RegisterCatalog {
        self.catalog
    }

    /// Random register name of `size_bytes` for architecture `width`.
    pub fn random_register(&mut self, width: u32, size_bytes: usize) -> EncodeResult<&'static str> {
        let arch = Arch::from_width(width)?;
        let size = RegisterSize::from_bytes(size_bytes)?;
        self.random_name(arch, size, &[])
    }

    /// Random register name of `size_bytes` for architecture `width` whose
    /// names at every width are absent from `excluded`.
    pub fn safe_random_register(
        &mut self,
        width: u32,
        size_bytes: usize,
        excluded: &[&str],
    ) -> EncodeResult<&'static str> {
        let arch = Arch::from_width(width)?;
        let size = RegisterSize::from_bytes(size_bytes)?;
        self.random_name(arch, size, excluded)
    }

    /// Random register record not matching any name in `excluded`.
    ///
    /// The whole record is returned so callers can address the same register
    /// at several widths.
    pub fn pick_register(&mut self, arch: Arch, excluded: &[&str]) -> EncodeResult<&'c Register> {
        let eligible = self.eligible(arch, excluded)?;
        eligible
            .choose(&mut self.rng)
            .copied()
            .ok_or_else(|| exhausted(arch, excluded))
    }

    fn random_name(
        &mut self,
        arch: Arch,
        size: RegisterSize,
        excluded: &[&str],
    ) -> EncodeResult<&'static str> {
        let names: Vec<&'static str> = self
            .eligible(arch, excluded)?
            .into_iter()
            .filter_map(|reg| reg.try_name(size))
            .collect();

        let name = names
            .choose(&mut self.rng)
            .copied()
            .ok_or(EncodeError::UnsupportedOperandSize { arch, size })?;
        log::trace!("picked {name} ({size}, {arch}, excluding {excluded:?})");
        Ok(name)
    }

    fn eligible(&self, arch: Arch, excluded: &[&str]) -> EncodeResult<Vec<&'c Register>> {
        let eligible: Vec<&'c Register> = self
            .catalog
            .table(arch)
            .iter()
            .filter(|reg| !excluded.iter().any(|name| reg.matches(name)))
            .collect();

        if eligible.is_empty() {
            return Err(exhausted(arch, excluded));
        }
        Ok(eligible)
    }
}

impl RegisterAllocator<'static, ChaCha20Rng> {
    /// Allocator over the standard catalog with a reproducible seed.
    pub fn seeded(seed: u64) -> Self {
        Self::new(RegisterCatalog::standard(), ChaCha20Rng::seed_from_u64(seed))
    }

    /// Allocator over the standard catalog seeded from OS entropy.
    pub fn from_entropy() -> Self {
        Self::new(RegisterCatalog::standard(), ChaCha20Rng::from_entropy())
    }
}

fn exhausted(arch: Arch, excluded: &[&str]) -> EncodeError {
    EncodeError::ExhaustedSelection {
        arch,
        excluded: excluded.iter().map(|s| s.to_string()).collect(),
    }
}
