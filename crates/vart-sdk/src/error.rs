use thiserror::Error;

use vart_types::{TypeError, Version};

/// Errors surfaced by repository operations.
///
/// `ArtifactNotFound`, `AliasNotFound` and `Validation` are the caller-facing
/// taxonomy. Validation is always raised before the first storage call.
/// Collaborator failures pass through unmodified as `Store` and `Index`.
#[derive(Debug, Error)]
pub enum RepoError {
    #[error("artifact not found: name = {name:?}, version = {version}")]
    ArtifactNotFound { name: String, version: Version },

    #[error("alias not found: name = {name:?}, alias = {alias:?}")]
    AliasNotFound { name: String, alias: String },

    #[error("validation failed: {0}")]
    Validation(#[from] TypeError),

    #[error("version {version} of {name:?} was created concurrently")]
    VersionConflict { name: String, version: Version },

    #[error("integrity check failed for {locator}: expected {expected}, computed {computed}")]
    IntegrityMismatch {
        locator: String,
        expected: String,
        computed: String,
    },

    #[error("corrupt record at {locator}: {reason}")]
    CorruptRecord { locator: String, reason: String },

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("store error: {0}")]
    Store(#[from] vart_store::StoreError),

    #[error("index error: {0}")]
    Index(#[from] vart_index::IndexError),

    #[error("serialization error: {0}")]
    Serialization(String),
}

impl RepoError {
    pub(crate) fn artifact_not_found(name: &str, version: Version) -> Self {
        Self::ArtifactNotFound {
            name: name.to_string(),
            version,
        }
    }

    pub(crate) fn alias_not_found(name: &str, alias: &str) -> Self {
        Self::AliasNotFound {
            name: name.to_string(),
            alias: alias.to_string(),
        }
    }

    pub(crate) fn corrupt(locator: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::CorruptRecord {
            locator: locator.into(),
            reason: reason.into(),
        }
    }

    /// Returns `true` for either not-found variant.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::ArtifactNotFound { .. } | Self::AliasNotFound { .. }
        )
    }
}

pub type RepoResult<T> = Result<T, RepoError>;
