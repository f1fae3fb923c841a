// This module defines the error type shared by every sgn component, using the thiserror
// crate for idiomatic Rust error handling. EncodeError covers the failure scenarios of
// fragment generation: unknown architecture widths, register sizes outside the x86 access
// widths, registers lacking a requested access width, exhausted exclusion-aware register
// selection, assembler gateway translation failures, relaxed branches that break the
// wrappers' displacement arithmetic, and junk mnemonic pool misuse. Each variant carries
// the context needed to diagnose the failed generation attempt. EncodeResult<T> is the
// convenience alias for Result<T, EncodeError>.

//! Error types for fragment generation.
//!
//! Using thiserror for more idiomatic error handling.

use super::arch::{Arch, RegisterSize};
use thiserror::Error;

/// Main error type for register selection, assembly and wrapping.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EncodeError {
    #[error("Invalid architecture width {width} (expected 32 or 64)")]
    InvalidArchitecture {
        width: u32,
    },

    #[error("Unknown architecture name `{name}` (expected x86 or x64)")]
    UnknownArchitecture {
        name: String,
    },

    #[error("Unsupported register size {size} bytes (expected 1, 2, 4 or 8)")]
    UnsupportedWidth {
        size: usize,
    },

    #[error("No {size} register exists on {arch}")]
    UnsupportedOperandSize {
        arch: Arch,
        size: RegisterSize,
    },

    #[error("Register {register} has no {size} encoding")]
    MissingAccessWidth {
        register: &'static str,
        size: RegisterSize,
    },

    #[error("Every {arch} register is excluded by {excluded:?}")]
    ExhaustedSelection {
        arch: Arch,
        excluded: Vec<String>,
    },

    #[error("Failed to assemble `{mnemonics}`: {reason}")]
    TranslationFailure {
        mnemonics: String,
        reason: String,
    },

    #[error("Displacement {displacement:#x} needs a {actual}-byte branch, expected {expected} bytes")]
    DisplacementOutOfRange {
        displacement: usize,
        expected: usize,
        actual: usize,
    },

    #[error("Not a relative branch mnemonic: {mnemonic}")]
    UnknownMnemonic {
        mnemonic: String,
    },

    #[error("Junk mnemonic pool is empty")]
    EmptyMnemonicPool,
}

impl EncodeError {
    pub(crate) fn translation(mnemonics: &str, reason: impl Into<String>) -> Self {
        EncodeError::TranslationFailure {
            mnemonics: mnemonics.to_string(),
            reason: reason.into(),
        }
    }
}

/// Result type alias for generation operations.
pub type EncodeResult<T> = Result<T, EncodeError>;
