use std::path::Path;

use serde::{Deserialize, Serialize};
use vart_crypto::HashAlgorithm;

use crate::error::{RepoError, RepoResult};

/// Default key prefix under which a repository keeps its objects.
pub const DEFAULT_PREFIX: &str = "versioned-artifacts";

/// Repository settings shared by both backends.
///
/// ```
/// use vart_sdk::RepositoryConfig;
///
/// let config = RepositoryConfig::from_toml_str(r#"
///     prefix = "releases"
///     suffix = ".zip"
/// "#).unwrap();
/// assert_eq!(config.prefix, "releases");
/// assert_eq!(config.hash_algorithm.name(), "sha256");
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RepositoryConfig {
    /// Key prefix (folder) that holds every artifact of this repository.
    pub prefix: String,
    /// File extension appended to payload keys, e.g. `.zip`.
    pub suffix: String,
    /// Digest used for deduplication and integrity checks.
    pub hash_algorithm: HashAlgorithm,
}

impl Default for RepositoryConfig {
    fn default() -> Self {
        Self {
            prefix: DEFAULT_PREFIX.to_string(),
            suffix: String::new(),
            hash_algorithm: HashAlgorithm::default(),
        }
    }
}

impl RepositoryConfig {
    /// Parse from TOML text. Missing fields take their defaults.
    pub fn from_toml_str(text: &str) -> RepoResult<Self> {
        let config: Self = toml::from_str(text).map_err(|e| RepoError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a TOML file.
    pub fn load(path: impl AsRef<Path>) -> RepoResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| RepoError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&text)
    }

    pub fn to_toml_string(&self) -> RepoResult<String> {
        toml::to_string_pretty(self).map_err(|e| RepoError::Serialization(e.to_string()))
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    pub fn with_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.suffix = suffix.into();
        self
    }

    pub fn with_hash_algorithm(mut self, algorithm: HashAlgorithm) -> Self {
        self.hash_algorithm = algorithm;
        self
    }

    /// Check that the prefix and suffix produce well-formed object keys.
    pub fn validate(&self) -> RepoResult<()> {
        let prefix = self.prefix.trim_matches('/');
        if !prefix.is_empty() {
            vart_store::validate_key(prefix)
                .map_err(|e| RepoError::Config(format!("prefix: {e}")))?;
        }
        if self.suffix.contains('/') {
            return Err(RepoError::Config("suffix must not contain '/'".into()));
        }
        Ok(())
    }
}
