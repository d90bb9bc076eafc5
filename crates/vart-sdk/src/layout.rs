//! Object key layout for both backends.
//!
//! ```text
//! object-store-only:  {prefix}/{name}/versions/{encode_filename(v)}{suffix}
//!                     {prefix}/{name}/aliases/{alias}.json
//! hybrid:             {prefix}/{name}/{encode_version(v)}{suffix}
//! ```

use vart_store::join_key;
use vart_types::{codec, TypeError, Version};

use crate::config::RepositoryConfig;

const VERSIONS_DIR: &str = "versions";
const ALIASES_DIR: &str = "aliases";
const ALIAS_EXT: &str = ".json";

/// Derives object keys from artifact names and versions.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StorageLayout {
    prefix: String,
    suffix: String,
}

impl StorageLayout {
    pub fn new(prefix: &str, suffix: &str) -> Self {
        Self {
            prefix: prefix.trim_matches('/').to_string(),
            suffix: suffix.to_string(),
        }
    }

    pub fn from_config(config: &RepositoryConfig) -> Self {
        Self::new(&config.prefix, &config.suffix)
    }

    /// Prefix that covers every object of the repository.
    pub fn root_prefix(&self) -> String {
        dir(&self.prefix)
    }

    /// Prefix that covers every object of one artifact.
    pub fn artifact_prefix(&self, name: &str) -> String {
        dir(&join_key([self.prefix.as_str(), name]))
    }

    pub fn versions_prefix(&self, name: &str) -> String {
        dir(&join_key([self.prefix.as_str(), name, VERSIONS_DIR]))
    }

    pub fn aliases_prefix(&self, name: &str) -> String {
        dir(&join_key([self.prefix.as_str(), name, ALIASES_DIR]))
    }

    /// Payload key in the object-store-only layout.
    pub fn version_file_key(&self, name: &str, version: Version) -> String {
        format!(
            "{}{}{}",
            self.versions_prefix(name),
            codec::encode_filename(Some(version)),
            self.suffix
        )
    }

    /// Recover the version from an object-store-only payload key.
    pub fn decode_version_file_key(&self, name: &str, key: &str) -> Result<Version, TypeError> {
        let filename = key
            .strip_prefix(&self.versions_prefix(name))
            .and_then(|rest| rest.strip_suffix(self.suffix.as_str()))
            .ok_or_else(|| TypeError::InvalidKey {
                key: key.to_string(),
                reason: format!("not a version key of {name:?}"),
            })?;
        codec::decode_filename(filename)
    }

    /// Alias document key in the object-store-only layout.
    pub fn alias_key(&self, name: &str, alias: &str) -> String {
        format!("{}{alias}{ALIAS_EXT}", self.aliases_prefix(name))
    }

    /// Alias name from an alias document key, if it is one.
    pub fn decode_alias_key<'a>(&self, name: &str, key: &'a str) -> Option<&'a str> {
        key.strip_prefix(&self.aliases_prefix(name))?
            .strip_suffix(ALIAS_EXT)
            .filter(|alias| !alias.contains('/'))
    }

    /// Payload key in the hybrid layout.
    pub fn hybrid_key(&self, name: &str, version: Version) -> String {
        format!(
            "{}{}{}",
            self.artifact_prefix(name),
            codec::encode_version(Some(version)),
            self.suffix
        )
    }
}

fn dir(path: &str) -> String {
    if path.is_empty() {
        String::new()
    } else {
        format!("{path}/")
    }
}
