//! Control-flow skip-over wrappers.
//!
//! Each wrapper prepends one relative control transfer to an already-built
//! payload. The branch target is computed from the payload length plus the
//! size of the branch itself, so execution resumes at the first byte past the
//! payload. Payload bytes are copied untouched.
//!
//! The gateway is free to relax a jump to its near form; since the target
//! arithmetic assumes the short form, a size mismatch is reported as
//! [`EncodeError::DisplacementOutOfRange`] instead of emitting a jump that
//! lands inside the payload.

use super::gateway::AssemblerGateway;
use super::mnemonics::JunkMnemonicPool;
use crate::core::{Arch, EncodeError, EncodeResult, GeneratorOptions};
use rand::Rng;
use rand_chacha::ChaCha20Rng;

/// Size of `call rel32`.
pub const CALL_LEN: usize = 5;

/// Size of `jmp rel8` / `jcc rel8`.
pub const SHORT_JMP_LEN: usize = 2;

/// Generates skip-over fragments for one architecture.
pub struct Obfuscator<'p, G, R> {
    arch: Arch,
    gateway: G,
    pool: &'p JunkMnemonicPool,
    rng: R,
}

impl<'p, G: AssemblerGateway> Obfuscator<'p, G, ChaCha20Rng> {
    /// Build from generator options, seeding ChaCha20 as they describe.
    pub fn from_options(options: &GeneratorOptions, gateway: G, pool: &'p JunkMnemonicPool) -> Self {
        Self::new(options.arch, gateway, pool, options.rng())
    }
}

impl<'p, G: AssemblerGateway, R: Rng> Obfuscator<'p, G, R> {
    pub fn new(arch: Arch, gateway: G, pool: &'p JunkMnemonicPool, rng: R) -> Self {
        Self {
            arch,
            gateway,
            pool,
            rng,
        }
    }

    pub fn arch(&self) -> Arch {
        self.arch
    }

    pub fn pool(&self) -> &'p JunkMnemonicPool {
        self.pool
    }

    /// `call` to the byte right after itself.
    ///
    /// Execution continues at the next instruction with that instruction's
    /// address on the stack, which lets position-independent code find where
    /// it was loaded.
    pub fn generate_ip_to_stack(&self) -> EncodeResult<Vec<u8>> {
        let text = format!("call {CALL_LEN}");
        let fragment = self.gateway.assemble(&text, self.arch)?;
        if fragment.len() != CALL_LEN {
            return Err(EncodeError::translation(
                &text,
                format!("expected {CALL_LEN} bytes, got {}", fragment.len()),
            ));
        }
        log::debug!("ip-to-stack ({}): {:02x?}", self.arch, fragment.bytes());
        Ok(fragment.into_bytes())
    }

    /// Prepend a `call` landing right after `payload`.
    ///
    /// The pushed return address is the address of the payload's first byte.
    pub fn add_call_over(&self, payload: &[u8]) -> EncodeResult<Vec<u8>> {
        self.prepend_branch("call", CALL_LEN, payload)
    }

    /// Prepend a short `jmp` landing right after `payload`.
    pub fn add_jmp_over(&self, payload: &[u8]) -> EncodeResult<Vec<u8>> {
        self.prepend_branch("jmp", SHORT_JMP_LEN, payload)
    }

    /// Prepend a short conditional jump, drawn from the junk pool, landing
    /// right after `payload`.
    ///
    /// The caller must guarantee the condition holds when the jump executes;
    /// otherwise control falls through into the payload.
    pub fn add_cond_jmp_over(&mut self, payload: &[u8]) -> EncodeResult<Vec<u8>> {
        let mnemonic = self.pool.choose(&mut self.rng)?;
        log::trace!("conditional jump-over using {mnemonic}");
        self.prepend_branch(&mnemonic, SHORT_JMP_LEN, payload)
    }

    fn prepend_branch(&self, mnemonic: &str, branch_len: usize, payload: &[u8]) -> EncodeResult<Vec<u8>> {
        let displacement = payload.len() + branch_len;
        let text = format!("{mnemonic} {displacement:#x}");
        let fragment = self.gateway.assemble(&text, self.arch)?;

        if fragment.len() != branch_len {
            return Err(EncodeError::DisplacementOutOfRange {
                displacement,
                expected: branch_len,
                actual: fragment.len(),
            });
        }

        let mut out = fragment.into_bytes();
        out.extend_from_slice(payload);
        log::debug!(
            "{mnemonic} over {} payload bytes ({}): {} bytes",
            payload.len(),
            self.arch,
            out.len()
        );
        Ok(out)
    }
}
