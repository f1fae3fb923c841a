//! Test random and exclusion-aware register selection.

use sgn::{Arch, EncodeError, RegisterAllocator, RegisterCatalog, RegisterSize};
use std::collections::HashMap;

const X86_EXTENDED: [&str; 6] = ["EAX", "EBX", "ECX", "EDX", "ESI", "EDI"];

#[test]
fn test_random_register_names_come_from_catalog() {
    let _ = env_logger::builder().is_test(true).try_init();

    let catalog = RegisterCatalog::standard();
    let mut alloc = RegisterAllocator::seeded(0x5eed);

    for (width, arch) in [(32, Arch::X86), (64, Arch::X64)] {
        for size_bytes in [1, 2, 4, 8] {
            let size = RegisterSize::from_bytes(size_bytes).unwrap();
            let supported = catalog
                .table(arch)
                .iter()
                .any(|reg| reg.try_name(size).is_some());

            for _ in 0..50 {
                match alloc.random_register(width, size_bytes) {
                    Ok(name) => {
                        assert!(supported);
                        let reg = catalog.find(arch, name).expect("name not in catalog");
                        assert_eq!(reg.try_name(size), Some(name));
                    }
                    Err(err) => {
                        assert!(!supported);
                        assert_eq!(err, EncodeError::UnsupportedOperandSize { arch, size });
                    }
                }
            }
        }
    }
}

#[test]
fn test_x86_dword_distribution_is_roughly_uniform() {
    let _ = env_logger::builder().is_test(true).try_init();

    let mut alloc = RegisterAllocator::seeded(1000);
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for _ in 0..1000 {
        let name = alloc.random_register(32, 4).unwrap();
        assert!(X86_EXTENDED.contains(&name), "unexpected {name}");
        *counts.entry(name).or_default() += 1;
    }

    // Expected ~167 each; a fixed seed keeps this deterministic.
    assert_eq!(counts.len(), 6);
    for (name, count) in counts {
        assert!((100..=240).contains(&count), "{name} drawn {count} times");
    }
}

#[test]
fn test_safe_random_register_never_returns_excluded() {
    let _ = env_logger::builder().is_test(true).try_init();

    let mut alloc = RegisterAllocator::from_entropy();
    for _ in 0..1000 {
        assert_ne!(alloc.safe_random_register(64, 8, &["RAX"]).unwrap(), "RAX");
    }
}

#[test]
fn test_safe_random_register_exhausted_instead_of_hanging() {
    let _ = env_logger::builder().is_test(true).try_init();

    let mut alloc = RegisterAllocator::seeded(2);
    let err = alloc.safe_random_register(32, 4, &X86_EXTENDED).unwrap_err();
    assert_eq!(
        err,
        EncodeError::ExhaustedSelection {
            arch: Arch::X86,
            excluded: X86_EXTENDED.iter().map(|s| s.to_string()).collect(),
        }
    );
}

#[test]
fn test_injected_catalog() {
    let standard = RegisterCatalog::standard();
    let x86: Vec<_> = standard.table(Arch::X86)[..1].to_vec();
    let x64: Vec<_> = standard.table(Arch::X64)[..2].to_vec();
    let catalog = RegisterCatalog::new(x86, x64);

    let mut alloc = RegisterAllocator::new(&catalog, rand::thread_rng());
    assert_eq!(alloc.random_register(32, 2), Ok("AX"));
    assert_eq!(alloc.safe_random_register(64, 1, &["rax"]), Ok("BL"));
    assert!(matches!(
        alloc.safe_random_register(64, 8, &["RAX", "EBX"]),
        Err(EncodeError::ExhaustedSelection { arch: Arch::X64, .. })
    ));
}

#[test]
fn test_invalid_inputs() {
    let mut alloc = RegisterAllocator::seeded(3);
    assert_eq!(
        alloc.safe_random_register(128, 4, &[]),
        Err(EncodeError::InvalidArchitecture { width: 128 })
    );
    assert_eq!(
        alloc.safe_random_register(64, 16, &[]),
        Err(EncodeError::UnsupportedWidth { size: 16 })
    );
}
