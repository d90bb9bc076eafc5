use std::fmt;

use serde::{Deserialize, Serialize};
use vart_store::PutOptions;
use vart_types::{Alias, AliasTarget, Artifact, Version};

use crate::error::RepoResult;
use crate::retention::{PurgeReport, RetentionPolicy};

/// Which storage strategy a repository uses.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Payloads, version metadata and aliases all live in object storage.
    Object,
    /// Payloads in object storage; metadata and aliases in an index.
    Hybrid,
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Object => f.write_str("object"),
            Self::Hybrid => f.write_str("hybrid"),
        }
    }
}

/// Payload read through an alias.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AliasContent {
    /// The version the weighted draw selected.
    pub version: Version,
    pub bytes: Vec<u8>,
}

/// The versioned artifact repository.
///
/// Implementations hold no state beyond configuration and collaborator
/// handles, so one instance can be shared freely across threads. No call is
/// atomic across more than one collaborator write.
///
/// `version: None` always means `LATEST`.
pub trait Repository: Send + Sync {
    /// The storage strategy behind this repository.
    fn backend(&self) -> BackendKind;

    /// `true` when `delete_artifact_version` hides a version but keeps its
    /// data; `false` when deletion is permanent.
    ///
    /// Without soft delete, removing the newest numbered version frees its
    /// number and the next publish reuses it.
    fn supports_soft_delete(&self) -> bool;

    // ---- Artifacts ----

    /// Upload `content` as the new `LATEST`.
    ///
    /// When `LATEST` already holds identical bytes nothing is written and the
    /// existing record is returned.
    fn put_artifact(&self, name: &str, content: &[u8], options: &PutOptions)
        -> RepoResult<Artifact>;

    /// Look up one version.
    fn get_artifact_version(&self, name: &str, version: Option<Version>) -> RepoResult<Artifact>;

    /// Read one version's payload, verified against its recorded hash.
    fn get_artifact_content(&self, name: &str, version: Option<Version>) -> RepoResult<Vec<u8>>;

    /// Names of all artifacts in the repository, ascending.
    fn list_artifact_names(&self) -> RepoResult<Vec<String>>;

    /// Live versions of an artifact: `LATEST` first, then newest first.
    fn list_artifact_versions(&self, name: &str) -> RepoResult<Vec<Artifact>>;

    /// The highest version number ever published, or `None` if none was.
    fn latest_published_version(&self, name: &str) -> RepoResult<Option<Version>>;

    /// Snapshot `LATEST` as the next numbered version.
    fn publish_artifact_version(&self, name: &str) -> RepoResult<Artifact>;

    /// Delete one version. See [`Repository::supports_soft_delete`].
    fn delete_artifact_version(&self, name: &str, version: Option<Version>) -> RepoResult<()>;

    // ---- Aliases ----

    /// Create or replace an alias. Both target versions must exist.
    fn put_alias(&self, name: &str, alias: &str, target: &AliasTarget) -> RepoResult<Alias>;

    fn get_alias(&self, name: &str, alias: &str) -> RepoResult<Alias>;

    fn list_aliases(&self, name: &str) -> RepoResult<Vec<Alias>>;

    /// Remove an alias permanently. The target versions are untouched.
    fn delete_alias(&self, name: &str, alias: &str) -> RepoResult<()>;

    /// Resolve an alias with a weighted draw and read the chosen payload.
    fn get_alias_content(&self, name: &str, alias: &str) -> RepoResult<AliasContent> {
        let resolved = self.get_alias(name, alias)?;
        let version = resolved.random_version();
        let bytes = self.get_artifact_content(name, Some(version))?;
        Ok(AliasContent { version, bytes })
    }

    // ---- Purge ----

    /// Permanently remove old versions according to `policy`.
    fn purge_artifact_versions(&self, name: &str, policy: &RetentionPolicy)
        -> RepoResult<PurgeReport>;

    /// Permanently remove an artifact: every version and every alias.
    fn purge_artifact(&self, name: &str) -> RepoResult<()>;

    /// Permanently remove everything in the repository.
    fn purge_all(&self) -> RepoResult<()>;
}
