//! Bundle directory persistence: write and read [`PlanBundleV1`] on disk.
//!
//! # Directory layout
//!
//! ```text
//! <dir>/
//!   bundle_manifest.json      canonical JSON, full artifact listing + world_id
//!   bundle_digest.txt         ASCII digest string ("sha256:...")
//!   initial_state.json        artifact files, one per manifest entry
//!   plan.json
//!   ...
//! ```
//!
//! The digest basis is not stored: it is a projection of the manifest and is
//! recomputed on read. The directory path is never part of any hash surface.
//!
//! # Fail-closed reads
//!
//! Missing declared artifacts, undeclared extra files, a stored digest that
//! disagrees with the recomputed one, and any [`verify_bundle`] failure are
//! all errors.

use std::collections::BTreeSet;
use std::path::Path;

use hop_kernel::proof::hash::{canonical_hash, ContentHash};
use hop_kernel::proof::hash_domain::HashDomain;

use crate::bundle::{
    build_bundle, verify_bundle, ArtifactInput, BundleVerifyError, PlanBundleV1,
    PLAN_BUNDLE_SCHEMA_VERSION,
};

const MANIFEST_FILENAME: &str = "bundle_manifest.json";
const DIGEST_FILENAME: &str = "bundle_digest.txt";
const TEMP_PREFIX: &str = ".tmp_";

/// Error persisting or loading a bundle directory.
#[derive(Debug)]
pub enum BundleDirError {
    Io { detail: String },
    MissingMetadata { filename: String },
    MissingArtifact { name: String },
    ExtraFile { name: String },
    ManifestInvalid { detail: String },
    /// An artifact file does not hash to its manifest entry.
    ArtifactHashMismatch { name: String },
    DigestMismatch { stored: String, recomputed: String },
    Verify(BundleVerifyError),
}

impl std::fmt::Display for BundleDirError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { detail } => write!(f, "I/O error: {detail}"),
            Self::MissingMetadata { filename } => write!(f, "missing metadata file: {filename}"),
            Self::MissingArtifact { name } => write!(f, "missing artifact: {name}"),
            Self::ExtraFile { name } => write!(f, "undeclared extra file: {name}"),
            Self::ManifestInvalid { detail } => write!(f, "invalid manifest: {detail}"),
            Self::ArtifactHashMismatch { name } => {
                write!(f, "artifact does not match its manifest hash: {name}")
            }
            Self::DigestMismatch { stored, recomputed } => {
                write!(f, "digest mismatch: stored={stored}, recomputed={recomputed}")
            }
            Self::Verify(e) => write!(f, "bundle verification failed: {e}"),
        }
    }
}

impl std::error::Error for BundleDirError {}

/// Write `bundle` into `dir` (created if absent).
///
/// # Errors
///
/// Returns [`BundleDirError::Io`] on any filesystem failure.
pub fn write_bundle_dir(bundle: &PlanBundleV1, dir: &Path) -> Result<(), BundleDirError> {
    std::fs::create_dir_all(dir).map_err(|e| BundleDirError::Io {
        detail: format!("create {}: {e}", dir.display()),
    })?;
    for artifact in bundle.artifacts.values() {
        write_atomic(dir, &artifact.name, &artifact.content)?;
    }
    write_atomic(dir, MANIFEST_FILENAME, &bundle.manifest)?;
    write_atomic(dir, DIGEST_FILENAME, bundle.digest.as_str().as_bytes())?;
    tracing::debug!(dir = %dir.display(), digest = %bundle.digest, "bundle written");
    Ok(())
}

/// Read and verify a bundle directory.
///
/// The bundle is rebuilt from the artifact files, so the manifest on disk
/// must match the rebuilt manifest byte for byte.
///
/// # Errors
///
/// Returns [`BundleDirError`] on any validation failure.
pub fn read_bundle_dir(dir: &Path) -> Result<PlanBundleV1, BundleDirError> {
    let manifest_bytes = read_required(dir, MANIFEST_FILENAME)?;
    let stored_digest = String::from_utf8_lossy(&read_required(dir, DIGEST_FILENAME)?)
        .trim()
        .to_string();

    let manifest: serde_json::Value =
        serde_json::from_slice(&manifest_bytes).map_err(|e| BundleDirError::ManifestInvalid {
            detail: e.to_string(),
        })?;
    let version = manifest["schema_version"].as_str().unwrap_or_default();
    if version != PLAN_BUNDLE_SCHEMA_VERSION {
        return Err(BundleDirError::ManifestInvalid {
            detail: format!("unsupported schema_version {version:?}"),
        });
    }
    let world_id = manifest["world_id"]
        .as_str()
        .ok_or_else(|| invalid("missing \"world_id\""))?;
    let entries = manifest["artifacts"]
        .as_array()
        .ok_or_else(|| invalid("\"artifacts\" is not an array"))?;

    let mut declared = BTreeSet::new();
    let mut inputs = Vec::with_capacity(entries.len());
    for entry in entries {
        let name = entry["name"]
            .as_str()
            .ok_or_else(|| invalid("entry without \"name\""))?;
        let normative = entry["normative"]
            .as_bool()
            .ok_or_else(|| invalid(&format!("missing \"normative\" for {name}")))?;
        let hash = entry["content_hash"]
            .as_str()
            .and_then(ContentHash::parse)
            .ok_or_else(|| invalid(&format!("bad \"content_hash\" for {name}")))?;
        if name.contains(['/', '\\']) || name == MANIFEST_FILENAME || name == DIGEST_FILENAME {
            return Err(invalid(&format!("illegal artifact name {name:?}")));
        }

        let content = std::fs::read(dir.join(name)).map_err(|_| BundleDirError::MissingArtifact {
            name: name.to_string(),
        })?;
        let input = ArtifactInput {
            name: name.to_string(),
            content,
            normative,
        };
        if canonical_hash(HashDomain::BundleArtifact, &input.content) != hash {
            return Err(BundleDirError::ArtifactHashMismatch {
                name: name.to_string(),
            });
        }
        declared.insert(name.to_string());
        inputs.push(input);
    }

    for file in list_files(dir)? {
        if !declared.contains(&file) && file != MANIFEST_FILENAME && file != DIGEST_FILENAME {
            return Err(BundleDirError::ExtraFile { name: file });
        }
    }

    let bundle = build_bundle(world_id, inputs).map_err(|e| BundleDirError::ManifestInvalid {
        detail: e.to_string(),
    })?;
    if bundle.manifest != manifest_bytes {
        return Err(invalid("manifest is not the canonical listing of its artifacts"));
    }
    if bundle.digest.as_str() != stored_digest {
        return Err(BundleDirError::DigestMismatch {
            stored: stored_digest,
            recomputed: bundle.digest.as_str().to_string(),
        });
    }
    verify_bundle(&bundle).map_err(BundleDirError::Verify)?;
    Ok(bundle)
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

fn invalid(detail: &str) -> BundleDirError {
    BundleDirError::ManifestInvalid {
        detail: detail.to_string(),
    }
}

/// Write via temp file + rename in the same directory.
fn write_atomic(dir: &Path, name: &str, content: &[u8]) -> Result<(), BundleDirError> {
    let path = dir.join(name);
    let temp = dir.join(format!("{TEMP_PREFIX}{name}"));
    std::fs::write(&temp, content).map_err(|e| BundleDirError::Io {
        detail: format!("write {}: {e}", temp.display()),
    })?;
    std::fs::rename(&temp, &path).map_err(|e| BundleDirError::Io {
        detail: format!("rename {} -> {}: {e}", temp.display(), path.display()),
    })
}

fn read_required(dir: &Path, filename: &str) -> Result<Vec<u8>, BundleDirError> {
    std::fs::read(dir.join(filename)).map_err(|_| BundleDirError::MissingMetadata {
        filename: filename.to_string(),
    })
}

/// Regular files in `dir`, excluding leftover temp files.
fn list_files(dir: &Path) -> Result<BTreeSet<String>, BundleDirError> {
    let io = |e: std::io::Error| BundleDirError::Io {
        detail: format!("list {}: {e}", dir.display()),
    };
    let mut files = BTreeSet::new();
    for entry in std::fs::read_dir(dir).map_err(io)? {
        let entry = entry.map_err(io)?;
        if !entry.file_type().map_err(io)?.is_file() {
            continue;
        }
        if let Some(name) = entry.file_name().to_str() {
            if !name.starts_with(TEMP_PREFIX) {
                files.insert(name.to_string());
            }
        }
    }
    Ok(files)
}
