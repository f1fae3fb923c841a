//! Target architecture and register access widths.
//!
//! Widths arrive from callers as plain integers (32/64 for the architecture,
//! 1/2/4/8 bytes for a register access). Both are validated once here and
//! carried as enums everywhere else.

use super::error::{EncodeError, EncodeResult};
use std::fmt;
use std::str::FromStr;

/// x86 execution mode a fragment is generated for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Arch {
    /// 32-bit protected mode.
    X86,
    /// 64-bit long mode.
    X64,
}

impl Arch {
    pub const ALL: [Arch; 2] = [Arch::X86, Arch::X64];

    /// Validate an architecture width.
    pub fn from_width(width: u32) -> EncodeResult<Self> {
        match width {
            32 => Ok(Arch::X86),
            64 => Ok(Arch::X64),
            _ => Err(EncodeError::InvalidArchitecture { width }),
        }
    }

    /// Bitness as understood by the encoder (32 or 64).
    pub const fn bitness(self) -> u32 {
        match self {
            Arch::X86 => 32,
            Arch::X64 => 64,
        }
    }
}

impl TryFrom<u32> for Arch {
    type Error = EncodeError;

    fn try_from(width: u32) -> EncodeResult<Self> {
        Arch::from_width(width)
    }
}

impl fmt::Display for Arch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arch::X86 => write!(f, "x86"),
            Arch::X64 => write!(f, "x64"),
        }
    }
}

impl FromStr for Arch {
    type Err = EncodeError;

    fn from_str(s: &str) -> EncodeResult<Self> {
        match s.to_ascii_lowercase().as_str() {
            "x86" | "32" => Ok(Arch::X86),
            "x64" | "x86_64" | "amd64" | "64" => Ok(Arch::X64),
            _ => Err(EncodeError::UnknownArchitecture {
                name: s.to_string(),
            }),
        }
    }
}

/// Width of a single register access.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RegisterSize {
    /// 8-bit (AL, R8B).
    Byte = 1,
    /// 16-bit (AX, R8W).
    Word = 2,
    /// 32-bit (EAX, R8D).
    Dword = 4,
    /// 64-bit (RAX, R8).
    Qword = 8,
}

impl RegisterSize {
    /// Validate a size given in bytes.
    pub fn from_bytes(size: usize) -> EncodeResult<Self> {
        match size {
            1 => Ok(RegisterSize::Byte),
            2 => Ok(RegisterSize::Word),
            4 => Ok(RegisterSize::Dword),
            8 => Ok(RegisterSize::Qword),
            _ => Err(EncodeError::UnsupportedWidth { size }),
        }
    }

    pub const fn bytes(self) -> usize {
        self as usize
    }
}

impl TryFrom<usize> for RegisterSize {
    type Error = EncodeError;

    fn try_from(size: usize) -> EncodeResult<Self> {
        RegisterSize::from_bytes(size)
    }
}

impl fmt::Display for RegisterSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-bit", self.bytes() * 8)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arch_from_width() {
        assert_eq!(Arch::from_width(32), Ok(Arch::X86));
        assert_eq!(Arch::try_from(64), Ok(Arch::X64));
        assert_eq!(
            Arch::from_width(16),
            Err(EncodeError::InvalidArchitecture { width: 16 })
        );
    }

    #[test]
    fn test_arch_parse() {
        assert_eq!("X86_64".parse::<Arch>(), Ok(Arch::X64));
        assert_eq!("32".parse::<Arch>(), Ok(Arch::X86));
        assert_eq!(
            "arm".parse::<Arch>(),
            Err(EncodeError::UnknownArchitecture {
                name: "arm".to_string()
            })
        );
        assert!("i386".parse::<Arch>().is_err());
    }

    #[test]
    fn test_register_size() {
        for size in [1, 2, 4, 8] {
            assert_eq!(RegisterSize::from_bytes(size).unwrap().bytes(), size);
        }
        for size in [0, 3, 5, 16] {
            assert_eq!(
                RegisterSize::from_bytes(size),
                Err(EncodeError::UnsupportedWidth { size })
            );
        }
    }
}
