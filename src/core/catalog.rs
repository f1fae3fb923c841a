//! Per-architecture general-purpose register tables.
//!
//! The catalog is built once and only read afterwards. Every register carries
//! its names for each access width it supports; within a table, any one name
//! identifies exactly one register.
//!
//! ESI and EDI have no byte-width encoding in 32-bit mode (SIL/DIL need a REX
//! prefix). Their `low` field is `None` and asking for it is an error rather
//! than a silent substitution of another register.
//!
//! The x64 table includes RSP and RBP. Code that must keep the stack intact
//! excludes them through exclusion-aware selection.

use super::arch::{Arch, RegisterSize};
use super::error::{EncodeError, EncodeResult};
use std::sync::OnceLock;

/// One physical general-purpose register.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Register {
    /// 64-bit name (x64 only).
    pub full: Option<&'static str>,
    /// 32-bit name.
    pub extended: Option<&'static str>,
    /// 16-bit name.
    pub high: Option<&'static str>,
    /// 8-bit name.
    pub low: Option<&'static str>,
    /// Architecture owning this entry.
    pub arch: Arch,
}

impl Register {
    const fn x86(extended: &'static str, high: &'static str, low: Option<&'static str>) -> Self {
        Self {
            full: None,
            extended: Some(extended),
            high: Some(high),
            low,
            arch: Arch::X86,
        }
    }

    const fn x64(
        full: &'static str,
        extended: &'static str,
        high: &'static str,
        low: &'static str,
    ) -> Self {
        Self {
            full: Some(full),
            extended: Some(extended),
            high: Some(high),
            low: Some(low),
            arch: Arch::X64,
        }
    }

    /// Name of the register at the given access width, if it has one.
    pub fn try_name(&self, size: RegisterSize) -> Option<&'static str> {
        match size {
            RegisterSize::Byte => self.low,
            RegisterSize::Word => self.high,
            RegisterSize::Dword => self.extended,
            RegisterSize::Qword => self.full,
        }
    }

    /// Name of the register at the given access width.
    pub fn name(&self, size: RegisterSize) -> EncodeResult<&'static str> {
        self.try_name(size).ok_or(EncodeError::MissingAccessWidth {
            register: self.widest(),
            size,
        })
    }

    /// Widest populated name, used to refer to the register as a whole.
    pub fn widest(&self) -> &'static str {
        self.full
            .or(self.extended)
            .or(self.high)
            .or(self.low)
            .unwrap_or("?")
    }

    /// All populated names, widest first.
    pub fn names(&self) -> impl Iterator<Item = &'static str> {
        [self.full, self.extended, self.high, self.low]
            .into_iter()
            .flatten()
    }

    /// Whether `name` refers to this register at any width (case-insensitive).
    pub fn matches(&self, name: &str) -> bool {
        self.names().any(|n| n.eq_ignore_ascii_case(name))
    }
}

const X86_REGISTERS: [Register; 6] = [
    Register::x86("EAX", "AX", Some("AL")),
    Register::x86("EBX", "BX", Some("BL")),
    Register::x86("ECX", "CX", Some("CL")),
    Register::x86("EDX", "DX", Some("DL")),
    Register::x86("ESI", "SI", None),
    Register::x86("EDI", "DI", None),
];

const X64_REGISTERS: [Register; 16] = [
    Register::x64("RAX", "EAX", "AX", "AL"),
    Register::x64("RBX", "EBX", "BX", "BL"),
    Register::x64("RCX", "ECX", "CX", "CL"),
    Register::x64("RDX", "EDX", "DX", "DL"),
    Register::x64("RSI", "ESI", "SI", "SIL"),
    Register::x64("RDI", "EDI", "DI", "DIL"),
    Register::x64("RBP", "EBP", "BP", "BPL"),
    Register::x64("RSP", "ESP", "SP", "SPL"),
    Register::x64("R8", "R8D", "R8W", "R8B"),
    Register::x64("R9", "R9D", "R9W", "R9B"),
    Register::x64("R10", "R10D", "R10W", "R10B"),
    Register::x64("R11", "R11D", "R11W", "R11B"),
    Register::x64("R12", "R12D", "R12W", "R12B"),
    Register::x64("R13", "R13D", "R13W", "R13B"),
    Register::x64("R14", "R14D", "R14W", "R14B"),
    Register::x64("R15", "R15D", "R15W", "R15B"),
];

/// Immutable mapping from architecture to its ordered register table.
#[derive(Debug, Clone)]
pub struct RegisterCatalog {
    x86: Vec<Register>,
    x64: Vec<Register>,
}

impl RegisterCatalog {
    /// Build a catalog from explicit tables.
    pub fn new(x86: Vec<Register>, x64: Vec<Register>) -> Self {
        Self { x86, x64 }
    }

    /// Process-wide catalog with the standard x86/x64 tables.
    pub fn standard() -> &'static RegisterCatalog {
        static CATALOG: OnceLock<RegisterCatalog> = OnceLock::new();
        CATALOG.get_or_init(|| RegisterCatalog::new(X86_REGISTERS.to_vec(), X64_REGISTERS.to_vec()))
    }

    /// Registers for an architecture width (32 or 64).
    pub fn registers(&self, width: u32) -> EncodeResult<&[Register]> {
        Ok(self.table(Arch::from_width(width)?))
    }

    /// Registers for an architecture.
    pub fn table(&self, arch: Arch) -> &[Register] {
        match arch {
            Arch::X86 => &self.x86,
            Arch::X64 => &self.x64,
        }
    }

    /// Look up a register by any of its names.
    pub fn find(&self, arch: Arch, name: &str) -> Option<&Register> {
        self.table(arch).iter().find(|reg| reg.matches(name))
    }
}

impl Default for RegisterCatalog {
    fn default() -> Self {
        RegisterCatalog::standard().clone()
    }
}
