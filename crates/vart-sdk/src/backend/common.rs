//! Pieces shared by both backends.

use vart_crypto::{ContentHasher, HasherError};
use vart_store::{ObjectHead, ObjectStore, PutOptions, StoreError};
use vart_types::{validate_artifact_name, Artifact, Version};

use crate::error::{RepoError, RepoResult};

/// Metadata key holding the artifact name on every payload object.
pub(crate) const METADATA_KEY_NAME: &str = "artifact_name";

pub(crate) fn validate_name(name: &str) -> RepoResult<()> {
    validate_artifact_name(name)?;
    Ok(())
}

/// The requested version with `None` meaning `LATEST`, range-checked.
pub(crate) fn requested_version(version: Option<Version>) -> RepoResult<Version> {
    Ok(version.unwrap_or_default().validated()?)
}

/// Caller options plus the system metadata keys. System keys win.
pub(crate) fn payload_options(
    name: &str,
    hash: &str,
    hasher: &ContentHasher,
    options: &PutOptions,
) -> PutOptions {
    let mut out = options.clone();
    out.metadata
        .insert(METADATA_KEY_NAME.to_string(), name.to_string());
    out.metadata.insert(hasher.metadata_key(), hash.to_string());
    out
}

/// The payload hash recorded in an object's metadata.
pub(crate) fn recorded_hash(
    head: &ObjectHead,
    hasher: &ContentHasher,
    locator: &str,
) -> RepoResult<String> {
    let key = hasher.metadata_key();
    head.metadata
        .get(&key)
        .cloned()
        .ok_or_else(|| RepoError::corrupt(locator, format!("missing metadata {key:?}")))
}

/// Read a payload and check it against the artifact's recorded hash.
pub(crate) fn read_verified(
    store: &dyn ObjectStore,
    hasher: &ContentHasher,
    key: &str,
    artifact: &Artifact,
) -> RepoResult<Vec<u8>> {
    let data = store.get(key).map_err(|e| match e {
        StoreError::NotFound { .. } => RepoError::artifact_not_found(&artifact.name, artifact.version),
        other => other.into(),
    })?;
    hasher
        .check(&data.bytes, &artifact.content_hash)
        .map_err(|e| match e {
            HasherError::Mismatch { expected, computed } => RepoError::IntegrityMismatch {
                locator: artifact.locator.clone(),
                expected,
                computed,
            },
            other => RepoError::corrupt(&artifact.locator, other.to_string()),
        })?;
    Ok(data.bytes)
}

/// Map a store miss on `version` to `ArtifactNotFound`.
pub(crate) fn artifact_miss(name: &str, version: Version) -> impl FnOnce(StoreError) -> RepoError + '_ {
    move |e| match e {
        StoreError::NotFound { .. } => RepoError::artifact_not_found(name, version),
        other => other.into(),
    }
}
