//! In-memory plan bundle: the content-addressed output of a world run.
//!
//! No file I/O in this module (see [`crate::bundle_dir`] for persistence).
//!
//! # Normative vs observational artifacts
//!
//! Each artifact is tagged `normative` (participates in the bundle digest)
//! or observational (listed in the manifest, excluded from the digest).
//! Everything that follows from the domain and the goal is normative.
//! `policy.json` and `stats.json` are observational: the timeout only
//! changes how the search is sliced, and slice/suspension counters follow
//! from wall-clock time.
//!
//! The bundle digest is computed over the **digest basis**: a canonical JSON
//! projection of `world_id` plus the normative artifact hashes.

use std::collections::BTreeMap;

use hop_kernel::proof::canon::{canonical_json_bytes, is_canonical};
use hop_kernel::proof::hash::{canonical_hash, ContentHash};
use hop_kernel::proof::hash_domain::HashDomain;

pub const PLAN_BUNDLE_SCHEMA_VERSION: &str = "plan_bundle.v1";
const DIGEST_BASIS_SCHEMA_VERSION: &str = "plan_bundle_digest_basis.v1";

pub const INITIAL_STATE_ARTIFACT: &str = "initial_state.json";
pub const GOAL_TASKS_ARTIFACT: &str = "goal_tasks.json";
pub const REGISTRY_ARTIFACT: &str = "registry.json";
pub const OUTCOME_ARTIFACT: &str = "outcome.json";
pub const PLAN_ARTIFACT: &str = "plan.json";
pub const FINAL_STATE_ARTIFACT: &str = "final_state.json";
pub const FAILURE_TRACE_ARTIFACT: &str = "failure_trace.json";
pub const POLICY_ARTIFACT: &str = "policy.json";
pub const STATS_ARTIFACT: &str = "stats.json";

/// A single artifact in the bundle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundleArtifactV1 {
    pub name: String,
    pub content: Vec<u8>,
    /// `canonical_hash(HashDomain::BundleArtifact, content)`.
    pub content_hash: ContentHash,
    pub normative: bool,
}

/// The complete artifact bundle from one world run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanBundleV1 {
    pub world_id: String,
    /// Artifacts by name, sorted.
    pub artifacts: BTreeMap<String, BundleArtifactV1>,
    /// Canonical JSON listing every artifact with its normative flag.
    pub manifest: Vec<u8>,
    /// Canonical JSON projection over normative artifacts only.
    pub digest_basis: Vec<u8>,
    /// `canonical_hash(HashDomain::BundleDigest, digest_basis)`.
    pub digest: ContentHash,
}

impl PlanBundleV1 {
    #[must_use]
    pub fn artifact(&self, name: &str) -> Option<&BundleArtifactV1> {
        self.artifacts.get(name)
    }

    /// Parse a JSON artifact.
    #[must_use]
    pub fn artifact_json(&self, name: &str) -> Option<serde_json::Value> {
        serde_json::from_slice(&self.artifacts.get(name)?.content).ok()
    }
}

/// Artifact bytes and metadata handed to [`build_bundle`].
#[derive(Debug, Clone)]
pub struct ArtifactInput {
    pub name: String,
    pub content: Vec<u8>,
    pub normative: bool,
}

impl ArtifactInput {
    #[must_use]
    pub fn normative(name: &str, content: Vec<u8>) -> Self {
        Self {
            name: name.to_string(),
            content,
            normative: true,
        }
    }

    #[must_use]
    pub fn observational(name: &str, content: Vec<u8>) -> Self {
        Self {
            name: name.to_string(),
            content,
            normative: false,
        }
    }
}

/// Error building a bundle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BundleBuildError {
    CanonError { detail: String },
    /// Two inputs share a name.
    DuplicateArtifact { name: String },
}

impl std::fmt::Display for BundleBuildError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::CanonError { detail } => write!(f, "canonical JSON error: {detail}"),
            Self::DuplicateArtifact { name } => write!(f, "duplicate artifact: {name}"),
        }
    }
}

impl std::error::Error for BundleBuildError {}

/// Assemble a bundle: hash each artifact, then derive manifest, digest
/// basis, and digest.
///
/// # Errors
///
/// Returns [`BundleBuildError`] on duplicate names or canonicalization failure.
pub fn build_bundle(
    world_id: &str,
    inputs: Vec<ArtifactInput>,
) -> Result<PlanBundleV1, BundleBuildError> {
    let mut artifacts = BTreeMap::new();
    for input in inputs {
        if artifacts.contains_key(&input.name) {
            return Err(BundleBuildError::DuplicateArtifact { name: input.name });
        }
        let content_hash = canonical_hash(HashDomain::BundleArtifact, &input.content);
        artifacts.insert(
            input.name.clone(),
            BundleArtifactV1 {
                name: input.name,
                content: input.content,
                content_hash,
                normative: input.normative,
            },
        );
    }

    let manifest = manifest_bytes(world_id, &artifacts)
        .map_err(|detail| BundleBuildError::CanonError { detail })?;
    let digest_basis = digest_basis_bytes(world_id, &artifacts)
        .map_err(|detail| BundleBuildError::CanonError { detail })?;
    let digest = canonical_hash(HashDomain::BundleDigest, &digest_basis);

    Ok(PlanBundleV1 {
        world_id: world_id.to_string(),
        artifacts,
        manifest,
        digest_basis,
        digest,
    })
}

/// Error from bundle integrity verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BundleVerifyError {
    ContentHashMismatch {
        artifact: String,
        expected: String,
        actual: String,
    },
    ManifestMismatch,
    DigestBasisMismatch,
    DigestMismatch { expected: String, actual: String },
    /// A normative JSON artifact is not in canonical form.
    ArtifactNotCanonical { artifact: String },
    /// An artifact the outcome requires is absent, or one it forbids is present.
    OutcomeArtifactSet { detail: String },
    /// `outcome.json` names a plan digest that `plan.json` does not hash to.
    PlanDigestMismatch { declared: String, recomputed: String },
    /// `plan.json` and `final_state.json` disagree on the final state.
    FinalStateMismatch,
    ArtifactParseError { artifact: String, detail: String },
    CanonError { detail: String },
}

impl std::fmt::Display for BundleVerifyError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ContentHashMismatch {
                artifact,
                expected,
                actual,
            } => write!(
                f,
                "content hash mismatch for {artifact}: expected {expected}, got {actual}"
            ),
            Self::ManifestMismatch => write!(f, "manifest does not match artifacts"),
            Self::DigestBasisMismatch => write!(f, "digest basis does not match artifacts"),
            Self::DigestMismatch { expected, actual } => {
                write!(f, "bundle digest mismatch: expected {expected}, got {actual}")
            }
            Self::ArtifactNotCanonical { artifact } => {
                write!(f, "artifact is not canonical JSON: {artifact}")
            }
            Self::OutcomeArtifactSet { detail } => write!(f, "outcome artifact set: {detail}"),
            Self::PlanDigestMismatch {
                declared,
                recomputed,
            } => write!(
                f,
                "plan digest mismatch: declared {declared}, recomputed {recomputed}"
            ),
            Self::FinalStateMismatch => {
                write!(f, "plan.json and final_state.json disagree on the final state")
            }
            Self::ArtifactParseError { artifact, detail } => {
                write!(f, "cannot parse {artifact}: {detail}")
            }
            Self::CanonError { detail } => write!(f, "canonical JSON error: {detail}"),
        }
    }
}

impl std::error::Error for BundleVerifyError {}

/// Verify bundle integrity.
///
/// Checks, in order: artifact content hashes, manifest, digest basis,
/// digest, canonical form of normative JSON artifacts, then the outcome
/// bindings between `outcome.json`, `plan.json`, and `final_state.json`.
///
/// # Errors
///
/// Returns the first [`BundleVerifyError`] found.
pub fn verify_bundle(bundle: &PlanBundleV1) -> Result<(), BundleVerifyError> {
    for artifact in bundle.artifacts.values() {
        let recomputed = canonical_hash(HashDomain::BundleArtifact, &artifact.content);
        if recomputed != artifact.content_hash {
            return Err(BundleVerifyError::ContentHashMismatch {
                artifact: artifact.name.clone(),
                expected: artifact.content_hash.as_str().to_string(),
                actual: recomputed.as_str().to_string(),
            });
        }
    }

    // Recomputed forms are canonical by construction, so byte equality also
    // proves the stored forms are canonical.
    let manifest = manifest_bytes(&bundle.world_id, &bundle.artifacts)
        .map_err(|detail| BundleVerifyError::CanonError { detail })?;
    if manifest != bundle.manifest {
        return Err(BundleVerifyError::ManifestMismatch);
    }
    let basis = digest_basis_bytes(&bundle.world_id, &bundle.artifacts)
        .map_err(|detail| BundleVerifyError::CanonError { detail })?;
    if basis != bundle.digest_basis {
        return Err(BundleVerifyError::DigestBasisMismatch);
    }

    let digest = canonical_hash(HashDomain::BundleDigest, &bundle.digest_basis);
    if digest != bundle.digest {
        return Err(BundleVerifyError::DigestMismatch {
            expected: bundle.digest.as_str().to_string(),
            actual: digest.as_str().to_string(),
        });
    }

    for artifact in bundle.artifacts.values() {
        let is_json = std::path::Path::new(&artifact.name)
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        if artifact.normative && is_json && !is_canonical(&artifact.content) {
            return Err(BundleVerifyError::ArtifactNotCanonical {
                artifact: artifact.name.clone(),
            });
        }
    }

    verify_outcome_bindings(bundle)
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

fn manifest_bytes(
    world_id: &str,
    artifacts: &BTreeMap<String, BundleArtifactV1>,
) -> Result<Vec<u8>, String> {
    let entries: Vec<serde_json::Value> = artifacts
        .values()
        .map(|a| {
            serde_json::json!({
                "content_hash": a.content_hash.as_str(),
                "name": a.name,
                "normative": a.normative,
            })
        })
        .collect();
    let value = serde_json::json!({
        "artifacts": entries,
        "schema_version": PLAN_BUNDLE_SCHEMA_VERSION,
        "world_id": world_id,
    });
    canonical_json_bytes(&value).map_err(|e| e.to_string())
}

fn digest_basis_bytes(
    world_id: &str,
    artifacts: &BTreeMap<String, BundleArtifactV1>,
) -> Result<Vec<u8>, String> {
    let entries: Vec<serde_json::Value> = artifacts
        .values()
        .filter(|a| a.normative)
        .map(|a| {
            serde_json::json!({
                "content_hash": a.content_hash.as_str(),
                "name": a.name,
            })
        })
        .collect();
    let value = serde_json::json!({
        "artifacts": entries,
        "schema_version": DIGEST_BASIS_SCHEMA_VERSION,
        "world_id": world_id,
    });
    canonical_json_bytes(&value).map_err(|e| e.to_string())
}

fn parse_artifact(artifact: &BundleArtifactV1) -> Result<serde_json::Value, BundleVerifyError> {
    serde_json::from_slice(&artifact.content).map_err(|e| BundleVerifyError::ArtifactParseError {
        artifact: artifact.name.clone(),
        detail: e.to_string(),
    })
}

/// If `outcome.json` is present: a success must carry `plan.json` (hashing
/// to the declared plan digest) and a matching `final_state.json`; a
/// failure must carry neither.
fn verify_outcome_bindings(bundle: &PlanBundleV1) -> Result<(), BundleVerifyError> {
    let Some(outcome_artifact) = bundle.artifacts.get(OUTCOME_ARTIFACT) else {
        return Ok(());
    };
    let outcome = parse_artifact(outcome_artifact)?;
    let plan = bundle.artifacts.get(PLAN_ARTIFACT);
    let final_state = bundle.artifacts.get(FINAL_STATE_ARTIFACT);

    match outcome["outcome"].as_str() {
        Some("success") => {
            let (Some(plan), Some(final_state)) = (plan, final_state) else {
                return Err(BundleVerifyError::OutcomeArtifactSet {
                    detail: "success without plan.json and final_state.json".into(),
                });
            };
            let declared = outcome["plan_digest"].as_str().unwrap_or_default();
            let recomputed = canonical_hash(HashDomain::Plan, &plan.content);
            if declared != recomputed.as_str() {
                return Err(BundleVerifyError::PlanDigestMismatch {
                    declared: declared.to_string(),
                    recomputed: recomputed.as_str().to_string(),
                });
            }
            let plan_value = parse_artifact(plan)?;
            if plan_value["final_state"] != parse_artifact(final_state)? {
                return Err(BundleVerifyError::FinalStateMismatch);
            }
            Ok(())
        }
        Some("failure") => {
            if plan.is_some() || final_state.is_some() {
                return Err(BundleVerifyError::OutcomeArtifactSet {
                    detail: "failure with a plan artifact".into(),
                });
            }
            Ok(())
        }
        other => Err(BundleVerifyError::OutcomeArtifactSet {
            detail: format!("unknown outcome {other:?}"),
        }),
    }
}
