use thiserror::Error;

/// Errors produced by type operations and input validation.
///
/// Every variant is raised before any storage call is made, so a rejected
/// request never leaves partial state behind.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid version {input:?}: {reason}")]
    InvalidVersion { input: String, reason: String },

    #[error("version {0} exceeds the maximum encodable version")]
    VersionOverflow(u64),

    #[error("invalid artifact name {name:?}: {reason}")]
    InvalidArtifactName { name: String, reason: String },

    #[error("invalid alias name {alias:?}: {reason}")]
    InvalidAliasName { alias: String, reason: String },

    #[error("secondary_version_weight must satisfy 0 <= x < 100, got {0}")]
    InvalidWeight(u32),

    #[error("secondary_version_weight is required when secondary_version is set")]
    MissingWeight,

    #[error("secondary_version_weight given without a secondary_version")]
    UnexpectedWeight,

    #[error("version {0} and secondary_version {0} cannot be the same")]
    DuplicateVersion(String),

    #[error("invalid storage key {key:?}: {reason}")]
    InvalidKey { key: String, reason: String },

    #[error("serialization error: {0}")]
    Serialization(String),
}
