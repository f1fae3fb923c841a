//! x86/x64 specific components.
//!
//! This module contains everything that emits or names machine instructions:
//! - Assembler gateway (text to bytes) using iced-x86
//! - Relative branch mnemonics and the junk conditional-jump pool
//! - Skip-over wrappers built on the gateway

pub mod gateway;
pub mod mnemonics;
pub mod wrappers;

pub use gateway::{AssembledFragment, AssemblerGateway, IcedGateway};
pub use mnemonics::{BranchMnemonic, Condition, JunkMnemonicPool};
pub use wrappers::{Obfuscator, CALL_LEN, SHORT_JMP_LEN};
