//! Register-preservation prologue and epilogue bytes.
//!
//! The prefix saves every general-purpose register to the stack and the suffix
//! restores them, undoing the prefix operation by operation in reverse order.
//! x86 has single save-all/restore-all instructions; x64 does not, so each
//! register is pushed and popped explicitly.

use super::arch::Arch;
use super::error::EncodeResult;

const X86_PREFIX: [u8; 2] = [
    0x60, // pushad
    0x9c, // pushfd
];

const X86_SUFFIX: [u8; 2] = [
    0x9d, // popfd
    0x61, // popad
];

const X64_PREFIX: [u8; 24] = [
    0x50, 0x53, 0x51, 0x52, // push rax, rbx, rcx, rdx
    0x56, 0x57, 0x55, 0x54, // push rsi, rdi, rbp, rsp
    0x41, 0x50, 0x41, 0x51, // push r8, r9
    0x41, 0x52, 0x41, 0x53, // push r10, r11
    0x41, 0x54, 0x41, 0x55, // push r12, r13
    0x41, 0x56, 0x41, 0x57, // push r14, r15
];

const X64_SUFFIX: [u8; 24] = [
    0x41, 0x5f, 0x41, 0x5e, // pop r15, r14
    0x41, 0x5d, 0x41, 0x5c, // pop r13, r12
    0x41, 0x5b, 0x41, 0x5a, // pop r11, r10
    0x41, 0x59, 0x41, 0x58, // pop r9, r8
    0x5c, 0x5d, 0x5f, 0x5e, // pop rsp, rbp, rdi, rsi
    0x5a, 0x59, 0x5b, 0x58, // pop rdx, rcx, rbx, rax
];

/// Static save/restore byte sequences per architecture.
#[derive(Debug, Clone, Copy, Default)]
pub struct SafeContext;

impl SafeContext {
    /// Save-all bytes for architecture `width`.
    pub fn prefix(width: u32) -> EncodeResult<&'static [u8]> {
        Ok(Self::prefix_for(Arch::from_width(width)?))
    }

    /// Restore-all bytes for architecture `width`.
    pub fn suffix(width: u32) -> EncodeResult<&'static [u8]> {
        Ok(Self::suffix_for(Arch::from_width(width)?))
    }

    pub fn prefix_for(arch: Arch) -> &'static [u8] {
        match arch {
            Arch::X86 => &X86_PREFIX,
            Arch::X64 => &X64_PREFIX,
        }
    }

    pub fn suffix_for(arch: Arch) -> &'static [u8] {
        match arch {
            Arch::X86 => &X86_SUFFIX,
            Arch::X64 => &X64_SUFFIX,
        }
    }

    /// Surround `payload` with the save and restore sequences.
    pub fn enclose(arch: Arch, payload: &[u8]) -> Vec<u8> {
        let prefix = Self::prefix_for(arch);
        let suffix = Self::suffix_for(arch);
        let mut out = Vec::with_capacity(prefix.len() + payload.len() + suffix.len());
        out.extend_from_slice(prefix);
        out.extend_from_slice(payload);
        out.extend_from_slice(suffix);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use iced_x86::{Decoder, DecoderOptions, Mnemonic, OpKind, Register};

    /// Decode a byte sequence into (mnemonic, register operand) pairs.
    fn operations(arch: Arch, bytes: &[u8]) -> Vec<(Mnemonic, Register)> {
        let mut decoder = Decoder::new(arch.bitness(), bytes, DecoderOptions::NONE);
        let mut ops = Vec::new();
        for instr in &mut decoder {
            assert!(!instr.is_invalid());
            let reg = if instr.op_count() > 0 && instr.op0_kind() == OpKind::Register {
                instr.op0_register()
            } else {
                Register::None
            };
            ops.push((instr.mnemonic(), reg));
        }
        ops
    }

    fn inverse(mnemonic: Mnemonic) -> Mnemonic {
        match mnemonic {
            Mnemonic::Push => Mnemonic::Pop,
            Mnemonic::Pushad => Mnemonic::Popad,
            Mnemonic::Pushfd => Mnemonic::Popfd,
            other => panic!("not a save instruction: {other:?}"),
        }
    }

    #[test]
    fn test_suffix_mirrors_prefix() {
        for arch in Arch::ALL {
            let saves = operations(arch, SafeContext::prefix_for(arch));
            let mut restores = operations(arch, SafeContext::suffix_for(arch));
            restores.reverse();
            assert_eq!(saves.len(), restores.len());
            for ((save, saved), (restore, restored)) in saves.into_iter().zip(restores) {
                assert_eq!(inverse(save), restore, "{arch}");
                assert_eq!(saved, restored, "{arch}");
            }
        }
    }

    #[test]
    fn test_x64_saves_all_sixteen_registers() {
        let ops = operations(Arch::X64, SafeContext::prefix_for(Arch::X64));
        assert_eq!(ops.len(), 16);
        assert!(ops.iter().all(|(m, _)| *m == Mnemonic::Push));
        assert!(ops.iter().any(|(_, r)| *r == Register::RSP));
        assert!(ops.iter().any(|(_, r)| *r == Register::R15));
    }

    #[test]
    fn test_enclose() {
        let out = SafeContext::enclose(Arch::X86, &[0x90]);
        assert_eq!(out, vec![0x60, 0x9c, 0x90, 0x9d, 0x61]);
        assert!(SafeContext::prefix(16).is_err());
        assert_eq!(SafeContext::suffix(64).unwrap().len(), 24);
    }
}
