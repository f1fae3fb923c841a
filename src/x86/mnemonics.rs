//! Relative branch mnemonics and the junk conditional-jump pool.
//!
//! The pool feeds the conditional jump-over wrapper: each draw picks one
//! spelling uniformly, so the emitted opcode varies across runs. Only
//! mnemonics the gateway can encode as a relative branch are admitted.

use crate::core::{Arch, EncodeError, EncodeResult};
use iced_x86::Code;
use rand::seq::SliceRandom;
use rand::Rng;
use std::sync::{OnceLock, PoisonError, RwLock};

/// Condition tested by a Jcc instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Condition {
    O,
    No,
    B,
    Ae,
    E,
    Ne,
    Be,
    A,
    S,
    Ns,
    P,
    Np,
    L,
    Ge,
    Le,
    G,
}

impl Condition {
    /// Parse any assembler spelling of a conditional jump (`jz`, `JNAE`, ...).
    pub fn from_mnemonic(mnemonic: &str) -> Option<Self> {
        let cond = match mnemonic.to_ascii_lowercase().as_str() {
            "jo" => Condition::O,
            "jno" => Condition::No,
            "jb" | "jc" | "jnae" => Condition::B,
            "jae" | "jnb" | "jnc" => Condition::Ae,
            "je" | "jz" => Condition::E,
            "jne" | "jnz" => Condition::Ne,
            "jbe" | "jna" => Condition::Be,
            "ja" | "jnbe" => Condition::A,
            "js" => Condition::S,
            "jns" => Condition::Ns,
            "jp" | "jpe" => Condition::P,
            "jnp" | "jpo" => Condition::Np,
            "jl" | "jnge" => Condition::L,
            "jge" | "jnl" => Condition::Ge,
            "jle" | "jng" => Condition::Le,
            "jg" | "jnle" => Condition::G,
            _ => return None,
        };
        Some(cond)
    }

    fn short_code(self, arch: Arch) -> Code {
        match (self, arch) {
            (Condition::O, Arch::X86) => Code::Jo_rel8_32,
            (Condition::O, Arch::X64) => Code::Jo_rel8_64,
            (Condition::No, Arch::X86) => Code::Jno_rel8_32,
            (Condition::No, Arch::X64) => Code::Jno_rel8_64,
            (Condition::B, Arch::X86) => Code::Jb_rel8_32,
            (Condition::B, Arch::X64) => Code::Jb_rel8_64,
            (Condition::Ae, Arch::X86) => Code::Jae_rel8_32,
            (Condition::Ae, Arch::X64) => Code::Jae_rel8_64,
            (Condition::E, Arch::X86) => Code::Je_rel8_32,
            (Condition::E, Arch::X64) => Code::Je_rel8_64,
            (Condition::Ne, Arch::X86) => Code::Jne_rel8_32,
            (Condition::Ne, Arch::X64) => Code::Jne_rel8_64,
            (Condition::Be, Arch::X86) => Code::Jbe_rel8_32,
            (Condition::Be, Arch::X64) => Code::Jbe_rel8_64,
            (Condition::A, Arch::X86) => Code::Ja_rel8_32,
            (Condition::A, Arch::X64) => Code::Ja_rel8_64,
            (Condition::S, Arch::X86) => Code::Js_rel8_32,
            (Condition::S, Arch::X64) => Code::Js_rel8_64,
            (Condition::Ns, Arch::X86) => Code::Jns_rel8_32,
            (Condition::Ns, Arch::X64) => Code::Jns_rel8_64,
            (Condition::P, Arch::X86) => Code::Jp_rel8_32,
            (Condition::P, Arch::X64) => Code::Jp_rel8_64,
            (Condition::Np, Arch::X86) => Code::Jnp_rel8_32,
            (Condition::Np, Arch::X64) => Code::Jnp_rel8_64,
            (Condition::L, Arch::X86) => Code::Jl_rel8_32,
            (Condition::L, Arch::X64) => Code::Jl_rel8_64,
            (Condition::Ge, Arch::X86) => Code::Jge_rel8_32,
            (Condition::Ge, Arch::X64) => Code::Jge_rel8_64,
            (Condition::Le, Arch::X86) => Code::Jle_rel8_32,
            (Condition::Le, Arch::X64) => Code::Jle_rel8_64,
            (Condition::G, Arch::X86) => Code::Jg_rel8_32,
            (Condition::G, Arch::X64) => Code::Jg_rel8_64,
        }
    }

    fn near_code(self, arch: Arch) -> Code {
        match (self, arch) {
            (Condition::O, Arch::X86) => Code::Jo_rel32_32,
            (Condition::O, Arch::X64) => Code::Jo_rel32_64,
            (Condition::No, Arch::X86) => Code::Jno_rel32_32,
            (Condition::No, Arch::X64) => Code::Jno_rel32_64,
            (Condition::B, Arch::X86) => Code::Jb_rel32_32,
            (Condition::B, Arch::X64) => Code::Jb_rel32_64,
            (Condition::Ae, Arch::X86) => Code::Jae_rel32_32,
            (Condition::Ae, Arch::X64) => Code::Jae_rel32_64,
            (Condition::E, Arch::X86) => Code::Je_rel32_32,
            (Condition::E, Arch::X64) => Code::Je_rel32_64,
            (Condition::Ne, Arch::X86) => Code::Jne_rel32_32,
            (Condition::Ne, Arch::X64) => Code::Jne_rel32_64,
            (Condition::Be, Arch::X86) => Code::Jbe_rel32_32,
            (Condition::Be, Arch::X64) => Code::Jbe_rel32_64,
            (Condition::A, Arch::X86) => Code::Ja_rel32_32,
            (Condition::A, Arch::X64) => Code::Ja_rel32_64,
            (Condition::S, Arch::X86) => Code::Js_rel32_32,
            (Condition::S, Arch::X64) => Code::Js_rel32_64,
            (Condition::Ns, Arch::X86) => Code::Jns_rel32_32,
            (Condition::Ns, Arch::X64) => Code::Jns_rel32_64,
            (Condition::P, Arch::X86) => Code::Jp_rel32_32,
            (Condition::P, Arch::X64) => Code::Jp_rel32_64,
            (Condition::Np, Arch::X86) => Code::Jnp_rel32_32,
            (Condition::Np, Arch::X64) => Code::Jnp_rel32_64,
            (Condition::L, Arch::X86) => Code::Jl_rel32_32,
            (Condition::L, Arch::X64) => Code::Jl_rel32_64,
            (Condition::Ge, Arch::X86) => Code::Jge_rel32_32,
            (Condition::Ge, Arch::X64) => Code::Jge_rel32_64,
            (Condition::Le, Arch::X86) => Code::Jle_rel32_32,
            (Condition::Le, Arch::X64) => Code::Jle_rel32_64,
            (Condition::G, Arch::X86) => Code::Jg_rel32_32,
            (Condition::G, Arch::X64) => Code::Jg_rel32_64,
        }
    }
}

/// A relaxable relative jump: `jmp` or any `jcc`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BranchMnemonic {
    Jmp,
    Jcc(Condition),
}

impl BranchMnemonic {
    pub fn parse(mnemonic: &str) -> Option<Self> {
        if mnemonic.eq_ignore_ascii_case("jmp") {
            return Some(BranchMnemonic::Jmp);
        }
        Condition::from_mnemonic(mnemonic).map(BranchMnemonic::Jcc)
    }

    /// rel8 form (2 bytes).
    pub fn short_code(self, arch: Arch) -> Code {
        match (self, arch) {
            (BranchMnemonic::Jmp, Arch::X86) => Code::Jmp_rel8_32,
            (BranchMnemonic::Jmp, Arch::X64) => Code::Jmp_rel8_64,
            (BranchMnemonic::Jcc(cond), _) => cond.short_code(arch),
        }
    }

    /// rel32 form (5 bytes for jmp, 6 for jcc).
    pub fn near_code(self, arch: Arch) -> Code {
        match (self, arch) {
            (BranchMnemonic::Jmp, Arch::X86) => Code::Jmp_rel32_32,
            (BranchMnemonic::Jmp, Arch::X64) => Code::Jmp_rel32_64,
            (BranchMnemonic::Jcc(cond), _) => cond.near_code(arch),
        }
    }
}

const DEFAULT_JUNK_MNEMONICS: [&str; 30] = [
    "jae", "ja", "jbe", "jb", "jc", "je", "jge", "jg", "jle", "jl", "jnae", "jna", "jnbe", "jnb",
    "jnc", "jne", "jnge", "jng", "jnle", "jnl", "jno", "jnp", "jns", "jnz", "jo", "jpe", "jpo",
    "jp", "js", "jz",
];

/// Append-only set of branch mnemonics drawn by the conditional jump-over wrapper.
#[derive(Debug)]
pub struct JunkMnemonicPool {
    mnemonics: RwLock<Vec<String>>,
}

impl JunkMnemonicPool {
    /// Pool with no entries.
    pub fn empty() -> Self {
        Self {
            mnemonics: RwLock::new(Vec::new()),
        }
    }

    /// Process-wide pool seeded with every Jcc spelling.
    pub fn standard() -> &'static JunkMnemonicPool {
        static POOL: OnceLock<JunkMnemonicPool> = OnceLock::new();
        POOL.get_or_init(JunkMnemonicPool::default)
    }

    /// Add a mnemonic. Returns `Ok(false)` if it was already present.
    ///
    /// Any Jcc spelling is accepted, and so is the unconditional `jmp`: it is
    /// always taken, so it satisfies the conditional jump-over contract
    /// trivially. Every other mnemonic is rejected.
    pub fn push(&self, mnemonic: &str) -> EncodeResult<bool> {
        if BranchMnemonic::parse(mnemonic).is_none() {
            return Err(EncodeError::UnknownMnemonic {
                mnemonic: mnemonic.to_string(),
            });
        }
        let mnemonic = mnemonic.to_ascii_lowercase();

        let mut mnemonics = self.mnemonics.write().unwrap_or_else(PoisonError::into_inner);
        if mnemonics.contains(&mnemonic) {
            return Ok(false);
        }
        log::debug!("junk mnemonic pool += {mnemonic}");
        mnemonics.push(mnemonic);
        Ok(true)
    }

    /// Add several mnemonics, stopping at the first invalid one.
    pub fn extend<'a, I>(&self, mnemonics: I) -> EncodeResult<usize>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut added = 0;
        for mnemonic in mnemonics {
            if self.push(mnemonic)? {
                added += 1;
            }
        }
        Ok(added)
    }

    /// Uniformly random mnemonic from the pool.
    pub fn choose<R: Rng + ?Sized>(&self, rng: &mut R) -> EncodeResult<String> {
        let mnemonics = self.mnemonics.read().unwrap_or_else(PoisonError::into_inner);
        mnemonics
            .choose(rng)
            .cloned()
            .ok_or(EncodeError::EmptyMnemonicPool)
    }

    pub fn contains(&self, mnemonic: &str) -> bool {
        let mnemonics = self.mnemonics.read().unwrap_or_else(PoisonError::into_inner);
        mnemonics.iter().any(|m| m.eq_ignore_ascii_case(mnemonic))
    }

    pub fn len(&self) -> usize {
        self.mnemonics.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Copy of the current contents.
    pub fn snapshot(&self) -> Vec<String> {
        self.mnemonics.read().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

impl Default for JunkMnemonicPool {
    fn default() -> Self {
        Self {
            mnemonics: RwLock::new(DEFAULT_JUNK_MNEMONICS.iter().map(|m| m.to_string()).collect()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    #[test]
    fn test_default_pool() {
        let pool = JunkMnemonicPool::default();
        assert_eq!(pool.len(), 30);
        assert!(pool.contains("JNZ"));
        for m in pool.snapshot() {
            assert!(matches!(BranchMnemonic::parse(&m), Some(BranchMnemonic::Jcc(_))));
        }
    }

    #[test]
    fn test_push_validates_and_dedupes() {
        let pool = JunkMnemonicPool::empty();
        assert_eq!(pool.push("JMP"), Ok(true));
        assert_eq!(pool.push("jmp"), Ok(false));
        assert_eq!(
            pool.push("loop"),
            Err(EncodeError::UnknownMnemonic {
                mnemonic: "loop".to_string()
            })
        );
        assert_eq!(pool.extend(["jz", "je", "jz"]), Ok(2));
        assert_eq!(pool.len(), 3);
    }

    #[test]
    fn test_unconditional_jmp_is_the_only_non_jcc() {
        let pool = JunkMnemonicPool::empty();
        assert_eq!(pool.push("JMP"), Ok(true));
        for rejected in ["call", "jecxz", "loop", "ret"] {
            assert!(matches!(pool.push(rejected), Err(EncodeError::UnknownMnemonic { .. })));
        }
        assert_eq!(pool.snapshot(), vec!["jmp".to_string()]);
    }

    #[test]
    fn test_choose() {
        let mut rng = ChaCha20Rng::seed_from_u64(9);
        assert_eq!(
            JunkMnemonicPool::empty().choose(&mut rng),
            Err(EncodeError::EmptyMnemonicPool)
        );

        let pool = JunkMnemonicPool::empty();
        pool.extend(["jz", "jnz"]).unwrap();
        let mut seen = std::collections::HashSet::new();
        for _ in 0..100 {
            let m = pool.choose(&mut rng).unwrap();
            assert!(pool.contains(&m));
            seen.insert(m);
        }
        assert_eq!(seen.len(), 2);
    }

    #[test]
    fn test_aliases_share_condition() {
        assert_eq!(Condition::from_mnemonic("JZ"), Condition::from_mnemonic("je"));
        assert_eq!(Condition::from_mnemonic("jnae"), Some(Condition::B));
        assert_eq!(Condition::from_mnemonic("jpo"), Some(Condition::Np));
        assert_eq!(Condition::from_mnemonic("jmp"), None);
    }
}
