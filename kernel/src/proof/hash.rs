//! Canonical hashing: SHA-256 with typed domain separation.
//!
//! `canonical_hash(domain, data) = sha256(domain.as_bytes() || data)`,
//! rendered as `"sha256:<lowercase hex>"`.

use sha2::{Digest, Sha256};

use crate::model::state::WorldStateV1;
use crate::model::task::TaskV1;
use crate::model::describe::{state_to_json, tasks_to_json};
use crate::proof::canon::{canonical_json_bytes, CanonError};
use crate::proof::hash_domain::HashDomain;

/// A content-addressed hash with algorithm identifier.
///
/// Format: `"algorithm:hex_digest"` (e.g., `"sha256:abcdef..."`).
///
/// Invariant: exactly one `:` separator with non-empty halves (enforced by
/// [`ContentHash::parse`]).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContentHash {
    full: String,
    colon: usize,
}

impl ContentHash {
    /// Parse from `"algorithm:hex"` format.
    ///
    /// Returns `None` if the colon is missing or either half is empty.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        let colon = s.find(':')?;
        if colon == 0 || colon == s.len() - 1 || s[colon + 1..].contains(':') {
            return None;
        }
        Some(Self {
            full: s.to_string(),
            colon,
        })
    }

    /// The algorithm portion (e.g., "sha256").
    #[must_use]
    pub fn algorithm(&self) -> &str {
        &self.full[..self.colon]
    }

    /// The hex digest portion.
    #[must_use]
    pub fn hex_digest(&self) -> &str {
        &self.full[self.colon + 1..]
    }

    /// The full `"algorithm:hex_digest"` string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.full
    }
}

impl std::fmt::Display for ContentHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.full)
    }
}

/// Compute the canonical hash of `data` under `domain`.
#[must_use]
pub fn canonical_hash(domain: HashDomain, data: &[u8]) -> ContentHash {
    let mut hasher = Sha256::new();
    hasher.update(domain.as_bytes());
    hasher.update(data);
    let digest = hasher.finalize();
    let full = format!("sha256:{}", hex::encode(digest));
    ContentHash { full, colon: 6 }
}

/// Fingerprint of a world state (canonical JSON of its structured form).
///
/// # Errors
///
/// Returns [`CanonError`] if canonicalization fails.
pub fn state_fingerprint(state: &WorldStateV1) -> Result<ContentHash, CanonError> {
    let bytes = canonical_json_bytes(&state_to_json(state))?;
    Ok(canonical_hash(HashDomain::WorldState, &bytes))
}

/// Fingerprint of an ordered task list.
///
/// # Errors
///
/// Returns [`CanonError`] if canonicalization fails.
pub fn task_list_fingerprint(tasks: &[TaskV1]) -> Result<ContentHash, CanonError> {
    let bytes = canonical_json_bytes(&tasks_to_json(tasks))?;
    Ok(canonical_hash(HashDomain::TaskList, &bytes))
}
