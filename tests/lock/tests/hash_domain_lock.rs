//! Hash domain governance lock tests.
//!
//! Proves:
//! 1. The domain set has the expected count (catches additions missing from `ALL`)
//! 2. All domain byte strings are unique
//! 3. All domains are null-terminated
//! 4. All domains follow the `HOP::*::V1\0` naming convention
//! 5. No raw `HOP::` domain literals in production source outside `hash_domain.rs`

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use hop_kernel::proof::hash_domain::HashDomain;

#[test]
fn hash_domain_canonical_set_count() {
    assert_eq!(
        HashDomain::ALL.len(),
        8,
        "expected 8 domain variants; if you added a new domain, update this count"
    );
}

#[test]
fn hash_domain_all_unique_bytes() {
    let mut seen = BTreeSet::new();
    for domain in HashDomain::ALL {
        assert!(seen.insert(domain.as_bytes()), "duplicate domain bytes: {domain}");
    }
}

#[test]
fn hash_domain_all_null_terminated() {
    for domain in HashDomain::ALL {
        let bytes = domain.as_bytes();
        assert!(bytes.ends_with(&[0]), "{domain} is not null-terminated");
        assert_eq!(
            bytes.iter().filter(|&&b| b == 0).count(),
            1,
            "{domain} has an interior NUL"
        );
    }
}

#[test]
fn hash_domain_all_follow_naming_convention() {
    for domain in HashDomain::ALL {
        let bytes = domain.as_bytes();
        assert!(bytes.starts_with(b"HOP::"), "{domain} does not start with HOP::");
        assert!(bytes.ends_with(b"::V1\0"), "{domain} does not end with ::V1\\0");
        assert!(
            bytes[..bytes.len() - 1]
                .iter()
                .all(|b| b.is_ascii_uppercase() || *b == b':' || *b == b'_' || b.is_ascii_digit()),
            "{domain} has characters outside [A-Z0-9_:]"
        );
    }
}

// ---------------------------------------------------------------------------
// No raw HOP:: domain literals in production source
// ---------------------------------------------------------------------------

/// Only `hash_domain.rs` may spell out domain bytes; everything else goes
/// through the enum.
#[test]
fn no_raw_domain_literals_outside_authority() {
    let root = Path::new(env!("CARGO_MANIFEST_DIR")).join("../..");
    let pattern = "b\"HOP::";
    let authority_file = "hash_domain.rs";
    let mut violations = Vec::new();

    for dir in ["kernel/src", "search/src", "harness/src"] {
        for path in rust_files(&root.join(dir)) {
            if path.file_name().and_then(|n| n.to_str()) == Some(authority_file) {
                continue;
            }
            let Ok(content) = std::fs::read_to_string(&path) else {
                continue;
            };
            for (i, line) in production_lines(&content) {
                if line.contains(pattern) {
                    violations.push(format!("  {}:{}: {}", path.display(), i + 1, line.trim()));
                }
            }
        }
    }

    assert!(
        violations.is_empty(),
        "raw HOP:: domain literals found outside {authority_file}:\n{}",
        violations.join("\n")
    );
}

/// Non-comment lines outside `#[cfg(test)]` blocks, with their indices.
fn production_lines(content: &str) -> Vec<(usize, &str)> {
    let mut out = Vec::new();
    let mut depth: usize = 0;
    let mut skip_above: Option<usize> = None;
    let mut cfg_test_pending = false;

    for (i, line) in content.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.contains("#[cfg(test)]") {
            cfg_test_pending = true;
            continue;
        }
        let opens = line.matches('{').count();
        let closes = line.matches('}').count();
        if cfg_test_pending && opens > 0 {
            skip_above = Some(depth);
            cfg_test_pending = false;
        }
        depth = depth.saturating_add(opens).saturating_sub(closes);

        if let Some(limit) = skip_above {
            if depth <= limit {
                skip_above = None;
            }
            continue;
        }
        if !trimmed.starts_with("//") {
            out.push((i, line));
        }
    }
    out
}

fn rust_files(dir: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();
    let Ok(entries) = std::fs::read_dir(dir) else {
        return files;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            files.extend(rust_files(&path));
        } else if path.extension().is_some_and(|e| e == "rs") {
            files.push(path);
        }
    }
    files
}

#[test]
fn scanner_skips_test_modules_and_comments() {
    let source = "fn a() {}\n// b\"HOP::X\n#[cfg(test)]\nmod tests {\n    const X: &[u8] = b\"HOP::Y\";\n}\nconst Z: &[u8] = b\"HOP::Z\";\n";
    let hits: Vec<usize> = production_lines(source)
        .into_iter()
        .filter(|(_, l)| l.contains("b\"HOP::"))
        .map(|(i, _)| i)
        .collect();
    assert_eq!(hits, [6]);
}
