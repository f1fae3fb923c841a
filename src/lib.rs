//! sgn - polymorphic x86/x64 fragment primitives.
//!
//! Building blocks for a polymorphic shellcode encoder: every call may emit
//! different bytes while the generated code stays functionally equivalent.
//!
//! # Primary Usage
//!
//! ```
//! use sgn::{Arch, GeneratorOptions, IcedGateway, JunkMnemonicPool, Obfuscator, SafeContext};
//!
//! let options = GeneratorOptions::new(Arch::X64).with_seed(7);
//! let mut obfuscator = Obfuscator::from_options(&options, IcedGateway, JunkMnemonicPool::standard());
//!
//! let payload = SafeContext::enclose(Arch::X64, &[0x90]);
//! let wrapped = obfuscator.add_cond_jmp_over(&payload)?;
//! assert_eq!(wrapped.len(), payload.len() + 2);
//! # Ok::<(), sgn::EncodeError>(())
//! ```
//!
//! # Architecture
//!
//! - [`core`] - Register catalog, random allocation, safe context, errors
//! - [`x86`] - Assembler gateway, junk mnemonic pool, skip-over wrappers

pub mod core;
pub mod x86;

pub use crate::core::{
    // Architecture model
    Arch, RegisterSize,
    // Registers
    Register, RegisterCatalog, RegisterAllocator,
    // Preservation
    SafeContext,
    // Configuration and errors
    GeneratorOptions, EncodeError, EncodeResult,
};
pub use crate::x86::{
    AssembledFragment, AssemblerGateway, BranchMnemonic, Condition, IcedGateway, JunkMnemonicPool,
    Obfuscator,
};
