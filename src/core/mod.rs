// This module collects the architecture-independent building blocks of sgn: the
// architecture and access-width model, the immutable per-architecture register catalog,
// randomized register allocation with exclusion constraints, the register-preservation
// prologue/epilogue bytes, generator options, and the shared error type. The catalog and
// safe context are process-wide read-only data; allocators own their random source so
// independent callers never share RNG state.

//! Core sgn infrastructure.
//!
//! # Key Components
//!
//! ## Register Catalog (`catalog`)
//! - Per-architecture general-purpose register tables
//! - Lookup by any access-width name
//!
//! ## Register Allocation (`allocator`)
//! - Uniform random selection by access width
//! - Exclusion-aware selection that fails instead of spinning
//!
//! ## Safe Context (`context`)
//! - Save-all / restore-all byte sequences per architecture

pub mod allocator;
pub mod arch;
pub mod catalog;
pub mod context;
pub mod error;
pub mod options;

pub use allocator::RegisterAllocator;
pub use arch::{Arch, RegisterSize};
pub use catalog::{Register, RegisterCatalog};
pub use context::SafeContext;
pub use error::{EncodeError, EncodeResult};
pub use options::GeneratorOptions;
