// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Structural guard for the central isolation invariant: the isolation core
//! (domain + application layers) holds no shared mutable collection that
//! could accumulate profile-keyed state. The only intentionally shared
//! structures are the append-only audit log and the counter-only rate
//! limiter, both in the infrastructure layer; the offline adapters emulate
//! external collaborators and are likewise outside the core.

use std::fs;
use std::path::{Path, PathBuf};

/// Shared-mutable-collection shapes that must not appear in the core.
const BANNED_PATTERNS: [&str; 7] = [
    "DashMap",
    "Mutex<HashMap",
    "RwLock<HashMap",
    "Mutex<BTreeMap",
    "RwLock<BTreeMap",
    "Mutex<Vec",
    "RwLock<Vec",
];

fn rust_sources(dir: &Path, out: &mut Vec<PathBuf>) {
    for entry in fs::read_dir(dir).expect("source directory must be readable") {
        let path = entry.expect("directory entry must be readable").path();
        if path.is_dir() {
            rust_sources(&path, out);
        } else if path.extension().is_some_and(|ext| ext == "rs") {
            out.push(path);
        }
    }
}

#[test]
fn test_isolation_core_holds_no_shared_mutable_collections() {
    let manifest = Path::new(env!("CARGO_MANIFEST_DIR"));
    for layer in ["src/domain", "src/application"] {
        let mut sources = Vec::new();
        rust_sources(&manifest.join(layer), &mut sources);
        assert!(!sources.is_empty(), "no sources found under {layer}");

        for file in sources {
            let source = fs::read_to_string(&file).expect("source file must be readable");
            for pattern in BANNED_PATTERNS {
                assert!(
                    !source.contains(pattern),
                    "{} contains shared mutable collection pattern '{}': \
                     profile-keyed state may only live in the audit log or \
                     the rate limiter",
                    file.display(),
                    pattern
                );
            }
        }
    }
}

#[test]
fn test_the_two_shared_structures_use_per_key_maps() {
    let manifest = Path::new(env!("CARGO_MANIFEST_DIR"));
    for file in [
        "src/infrastructure/audit_log.rs",
        "src/infrastructure/rate_limiter.rs",
    ] {
        let source =
            fs::read_to_string(manifest.join(file)).expect("source file must be readable");
        assert!(
            source.contains("DashMap"),
            "{file} is expected to use per-key concurrent maps"
        );
    }
}
