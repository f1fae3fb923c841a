// This module is the single translation boundary of sgn: it turns a short textual
// instruction sequence into x86/x64 machine code. AssemblerGateway is the narrow contract
// (text + architecture in, complete bytes or an error out) that wrappers depend on, so an
// alternate backend can be injected. IcedGateway implements it with the iced-x86 encoder
// for the handful of instruction shapes fragment generation needs: relative CALL, relaxed
// JMP/Jcc, register PUSH/POP, the save-all/restore-all forms and RET. Branch targets are
// measured from the start of the fragment, which is always assembled at origin 0. A
// failed translation never yields partial bytes.

//! Assembler gateway backed by iced-x86.

use super::mnemonics::BranchMnemonic;
use crate::core::{Arch, EncodeError, EncodeResult};
use iced_x86::{Code, Encoder, Instruction, Register};

/// Machine code produced by one successful translation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssembledFragment {
    bytes: Vec<u8>,
}

impl AssembledFragment {
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl From<Vec<u8>> for AssembledFragment {
    fn from(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }
}

/// Translates textual instructions into machine code.
///
/// Implementations must be stateless across calls and must either return
/// the complete encoding or an error, never a partial buffer.
pub trait AssemblerGateway {
    fn assemble(&self, mnemonics: &str, arch: Arch) -> EncodeResult<AssembledFragment>;

    /// Same as [`assemble`](Self::assemble), validating a raw width first.
    fn assemble_width(&self, mnemonics: &str, width: u32) -> EncodeResult<AssembledFragment> {
        self.assemble(mnemonics, Arch::from_width(width)?)
    }
}

impl<G: AssemblerGateway + ?Sized> AssemblerGateway for &G {
    fn assemble(&self, mnemonics: &str, arch: Arch) -> EncodeResult<AssembledFragment> {
        (**self).assemble(mnemonics, arch)
    }
}

/// Stateless gateway encoding with iced-x86.
#[derive(Debug, Clone, Copy, Default)]
pub struct IcedGateway;

impl IcedGateway {
    pub fn new() -> Self {
        Self
    }
}

impl AssemblerGateway for IcedGateway {
    fn assemble(&self, mnemonics: &str, arch: Arch) -> EncodeResult<AssembledFragment> {
        let mut encoder = Encoder::new(arch.bitness());
        let mut ip = 0u64;
        let mut count = 0usize;

        for statement in mnemonics
            .split(|c| c == ';' || c == '\n')
            .map(str::trim)
            .filter(|s| !s.is_empty())
        {
            let instr = parse_statement(statement, arch, ip)
                .map_err(|reason| EncodeError::translation(mnemonics, reason))?;
            let len = encoder
                .encode(&instr, ip)
                .map_err(|e| EncodeError::translation(mnemonics, e.to_string()))?;
            ip += len as u64;
            count += 1;
        }

        if count == 0 {
            return Err(EncodeError::translation(mnemonics, "no instructions"));
        }

        let bytes = encoder.take_buffer();
        log::trace!("assembled `{mnemonics}` ({arch}): {bytes:02x?}");
        Ok(AssembledFragment { bytes })
    }
}

/// Build the instruction for one statement placed at `ip`.
fn parse_statement(statement: &str, arch: Arch, ip: u64) -> Result<Instruction, String> {
    let mut parts = statement.split_whitespace();
    let mnemonic = parts.next().unwrap_or_default().to_ascii_lowercase();
    let operand = parts.next();
    if let Some(extra) = parts.next() {
        return Err(format!("unexpected operand `{extra}`"));
    }

    let operand_required = |name: &str| operand.ok_or_else(|| format!("`{name}` needs an operand"));
    let no_operand = |code: Code| match operand {
        None => Ok(Instruction::with(code)),
        Some(op) => Err(format!("`{mnemonic}` takes no operand, got `{op}`")),
    };

    match (mnemonic.as_str(), arch) {
        ("call", _) => {
            let target = parse_target(operand_required("call")?)?;
            let code = match arch {
                Arch::X86 => Code::Call_rel32_32,
                Arch::X64 => Code::Call_rel32_64,
            };
            Instruction::with_branch(code, target).map_err(|e| e.to_string())
        }
        ("push" | "pop", _) => {
            let name = operand_required(mnemonic.as_str())?;
            let reg = full_register(arch, name)
                .ok_or_else(|| format!("`{name}` is not a full-width {arch} register"))?;
            let code = match (mnemonic.as_str(), arch) {
                ("push", Arch::X86) => Code::Push_r32,
                ("push", Arch::X64) => Code::Push_r64,
                (_, Arch::X86) => Code::Pop_r32,
                (_, Arch::X64) => Code::Pop_r64,
            };
            Instruction::with1(code, reg).map_err(|e| e.to_string())
        }
        ("pushad", Arch::X86) => no_operand(Code::Pushad),
        ("popad", Arch::X86) => no_operand(Code::Popad),
        ("pushfd", Arch::X86) => no_operand(Code::Pushfd),
        ("popfd", Arch::X86) => no_operand(Code::Popfd),
        ("pushfq", Arch::X64) => no_operand(Code::Pushfq),
        ("popfq", Arch::X64) => no_operand(Code::Popfq),
        ("ret", Arch::X86) => no_operand(Code::Retnd),
        ("ret", Arch::X64) => no_operand(Code::Retnq),
        ("nop", _) => no_operand(Code::Nopd),
        (other, _) => {
            let branch = BranchMnemonic::parse(other)
                .ok_or_else(|| format!("unsupported mnemonic `{other}` for {arch}"))?;
            let target = parse_target(operand_required(other)?)?;
            Instruction::with_branch(relax(branch, arch, ip, target), target).map_err(|e| e.to_string())
        }
    }
}

/// Pick the rel8 form when the target is reachable from a 2-byte branch.
fn relax(branch: BranchMnemonic, arch: Arch, ip: u64, target: u64) -> Code {
    let rel = target as i128 - (ip as i128 + 2);
    if (i8::MIN as i128..=i8::MAX as i128).contains(&rel) {
        branch.short_code(arch)
    } else {
        branch.near_code(arch)
    }
}

fn parse_target(operand: &str) -> Result<u64, String> {
    let parsed = match operand.strip_prefix("0x").or_else(|| operand.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(hex, 16),
        None => operand.parse::<u64>(),
    };
    parsed.map_err(|_| format!("invalid branch target `{operand}`"))
}

fn full_register(arch: Arch, name: &str) -> Option<Register> {
    let reg = match (arch, name.to_ascii_lowercase().as_str()) {
        (Arch::X86, "eax") => Register::EAX,
        (Arch::X86, "ecx") => Register::ECX,
        (Arch::X86, "edx") => Register::EDX,
        (Arch::X86, "ebx") => Register::EBX,
        (Arch::X86, "esp") => Register::ESP,
        (Arch::X86, "ebp") => Register::EBP,
        (Arch::X86, "esi") => Register::ESI,
        (Arch::X86, "edi") => Register::EDI,
        (Arch::X64, "rax") => Register::RAX,
        (Arch::X64, "rcx") => Register::RCX,
        (Arch::X64, "rdx") => Register::RDX,
        (Arch::X64, "rbx") => Register::RBX,
        (Arch::X64, "rsp") => Register::RSP,
        (Arch::X64, "rbp") => Register::RBP,
        (Arch::X64, "rsi") => Register::RSI,
        (Arch::X64, "rdi") => Register::RDI,
        (Arch::X64, "r8") => Register::R8,
        (Arch::X64, "r9") => Register::R9,
        (Arch::X64, "r10") => Register::R10,
        (Arch::X64, "r11") => Register::R11,
        (Arch::X64, "r12") => Register::R12,
        (Arch::X64, "r13") => Register::R13,
        (Arch::X64, "r14") => Register::R14,
        (Arch::X64, "r15") => Register::R15,
        _ => return None,
    };
    Some(reg)
}
