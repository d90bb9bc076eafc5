//! Object-store-only backend.
//!
//! Everything lives in object storage. Payload objects carry the artifact
//! name and content hash as metadata, and their filenames encode the version
//! so that a plain ascending listing yields `LATEST` first and then versions
//! newest-first. Aliases are JSON documents next to the versions.
//!
//! Deletion here is physical; there is no flag to hide a version behind.

use std::sync::Arc;

use tracing::{debug, info, warn};

use vart_crypto::ContentHasher;
use vart_store::{ObjectHead, ObjectStore, PutOptions, StoreError};
use vart_types::{validate_alias_name, Alias, AliasTarget, Artifact, Clock, SystemClock, Version};

use super::common::{
    artifact_miss, payload_options, read_verified, recorded_hash, requested_version, validate_name,
};
use crate::config::RepositoryConfig;
use crate::error::{RepoError, RepoResult};
use crate::layout::StorageLayout;
use crate::repository::{BackendKind, Repository};
use crate::retention::{select_purge_candidates, PurgeReport, RetentionPolicy};

const ALIAS_CONTENT_TYPE: &str = "application/json";

/// Repository backed by a single object store.
pub struct ObjectRepository {
    store: Arc<dyn ObjectStore>,
    layout: StorageLayout,
    hasher: ContentHasher,
    clock: Arc<dyn Clock>,
}

impl ObjectRepository {
    pub fn new(store: Arc<dyn ObjectStore>, config: &RepositoryConfig) -> RepoResult<Self> {
        Self::with_clock(store, config, Arc::new(SystemClock))
    }

    pub fn with_clock(
        store: Arc<dyn ObjectStore>,
        config: &RepositoryConfig,
        clock: Arc<dyn Clock>,
    ) -> RepoResult<Self> {
        config.validate()?;
        Ok(Self {
            store,
            layout: StorageLayout::from_config(config),
            hasher: ContentHasher::new(config.hash_algorithm),
            clock,
        })
    }

    pub fn layout(&self) -> &StorageLayout {
        &self.layout
    }

    fn artifact_from_head(
        &self,
        name: &str,
        version: Version,
        head: &ObjectHead,
    ) -> RepoResult<Artifact> {
        let locator = self.store.locator(&head.key);
        let content_hash = recorded_hash(head, &self.hasher, &locator)?;
        Ok(Artifact {
            name: name.to_string(),
            version,
            updated_at: head.last_modified,
            locator,
            content_hash,
        })
    }

    fn head_version(&self, name: &str, version: Version) -> RepoResult<Artifact> {
        let key = self.layout.version_file_key(name, version);
        let head = self.store.head(&key).map_err(artifact_miss(name, version))?;
        self.artifact_from_head(name, version, &head)
    }

    /// Versions present in storage, in listing order (`LATEST` first, then
    /// newest first), at most `limit` of them.
    fn listed_versions(
        &self,
        name: &str,
        limit: Option<usize>,
    ) -> RepoResult<Vec<(Version, String, String)>> {
        let listing = self.store.list(&self.layout.versions_prefix(name), limit)?;
        let mut out = Vec::with_capacity(listing.len());
        for summary in listing {
            match self.layout.decode_version_file_key(name, &summary.key) {
                Ok(version) => out.push((version, summary.key, summary.etag)),
                Err(e) => warn!(key = %summary.key, error = %e, "ignoring unrecognized object"),
            }
        }
        Ok(out)
    }

    fn read_alias(&self, name: &str, alias: &str) -> RepoResult<Alias> {
        let key = self.layout.alias_key(name, alias);
        let data = self.store.get(&key).map_err(|e| match e {
            StoreError::NotFound { .. } => RepoError::alias_not_found(name, alias),
            other => other.into(),
        })?;
        let mut doc: Alias = serde_json::from_slice(&data.bytes)
            .map_err(|e| RepoError::corrupt(self.store.locator(&key), e.to_string()))?;
        doc.updated_at = data.head.last_modified;
        Ok(doc)
    }

    /// Locator of a version that must exist at alias-write time.
    fn existing_locator(&self, name: &str, version: Version) -> RepoResult<String> {
        let key = self.layout.version_file_key(name, version);
        if !self.store.exists(&key)? {
            return Err(RepoError::artifact_not_found(name, version));
        }
        Ok(self.store.locator(&key))
    }
}

impl Repository for ObjectRepository {
    fn backend(&self) -> BackendKind {
        BackendKind::Object
    }

    fn supports_soft_delete(&self) -> bool {
        false
    }

    fn put_artifact(
        &self,
        name: &str,
        content: &[u8],
        options: &PutOptions,
    ) -> RepoResult<Artifact> {
        validate_name(name)?;
        let hash = self.hasher.hash_hex(content);
        let key = self.layout.version_file_key(name, Version::Latest);

        if let Some(head) = self.store.try_head(&key)? {
            if head.metadata.get(&self.hasher.metadata_key()) == Some(&hash) {
                debug!(name, "content unchanged; skipping upload");
                return self.artifact_from_head(name, Version::Latest, &head);
            }
        }

        let options = payload_options(name, &hash, &self.hasher, options);
        self.store.put(&key, content, &options)?;
        let head = self.store.head(&key)?;
        info!(name, size = content.len(), "uploaded artifact");
        self.artifact_from_head(name, Version::Latest, &head)
    }

    fn get_artifact_version(&self, name: &str, version: Option<Version>) -> RepoResult<Artifact> {
        validate_name(name)?;
        self.head_version(name, requested_version(version)?)
    }

    fn get_artifact_content(&self, name: &str, version: Option<Version>) -> RepoResult<Vec<u8>> {
        let artifact = self.get_artifact_version(name, version)?;
        let key = self.layout.version_file_key(name, artifact.version);
        read_verified(self.store.as_ref(), &self.hasher, &key, &artifact)
    }

    fn list_artifact_names(&self) -> RepoResult<Vec<String>> {
        Ok(self.store.list_dirs(&self.layout.root_prefix())?)
    }

    fn list_artifact_versions(&self, name: &str) -> RepoResult<Vec<Artifact>> {
        validate_name(name)?;
        let mut out = Vec::new();
        for (version, key, _) in self.listed_versions(name, None)? {
            match self.store.head(&key) {
                Ok(head) => out.push(self.artifact_from_head(name, version, &head)?),
                // Deleted between the listing and the head.
                Err(StoreError::NotFound { .. }) => continue,
                Err(e) => return Err(e.into()),
            }
        }
        Ok(out)
    }

    fn latest_published_version(&self, name: &str) -> RepoResult<Option<Version>> {
        validate_name(name)?;
        Ok(self
            .listed_versions(name, Some(2))?
            .into_iter()
            .map(|(version, _, _)| version)
            .find(|v| !v.is_latest()))
    }

    fn publish_artifact_version(&self, name: &str) -> RepoResult<Artifact> {
        validate_name(name)?;
        let listed = self.listed_versions(name, Some(2))?;
        let Some((first, latest_key, latest_etag)) = listed.first().cloned() else {
            return Err(RepoError::artifact_not_found(name, Version::Latest));
        };
        if !first.is_latest() {
            return Err(RepoError::artifact_not_found(name, Version::Latest));
        }

        let next = match listed.get(1) {
            None => Version::FIRST,
            Some((previous, _, previous_etag)) => {
                if *previous_etag == latest_etag {
                    debug!(name, version = %previous, "LATEST unchanged since last publish");
                    return self.head_version(name, *previous);
                }
                previous.successor()?
            }
        };

        let new_key = self.layout.version_file_key(name, next);
        self.store
            .copy_if_absent(&latest_key, &new_key)
            .map_err(|e| match e {
                StoreError::AlreadyExists { .. } => RepoError::VersionConflict {
                    name: name.to_string(),
                    version: next,
                },
                StoreError::NotFound { .. } => RepoError::artifact_not_found(name, Version::Latest),
                other => other.into(),
            })?;
        let artifact = self.head_version(name, next)?;
        info!(name, version = %next, "published artifact version");
        Ok(artifact)
    }

    /// Removes the object. Deleting the newest numbered version lets the next
    /// publish take its number again.
    fn delete_artifact_version(&self, name: &str, version: Option<Version>) -> RepoResult<()> {
        validate_name(name)?;
        let version = requested_version(version)?;
        let existed = self
            .store
            .delete(&self.layout.version_file_key(name, version))?;
        info!(name, version = %version, existed, "deleted artifact version");
        Ok(())
    }

    fn put_alias(&self, name: &str, alias: &str, target: &AliasTarget) -> RepoResult<Alias> {
        validate_name(name)?;
        validate_alias_name(alias)?;
        target.validate()?;

        let version_locator = self.existing_locator(name, target.version)?;
        let secondary_version_locator = match target.secondary_version {
            Some(secondary) => Some(self.existing_locator(name, secondary)?),
            None => None,
        };

        let mut doc = Alias {
            name: name.to_string(),
            alias: alias.to_string(),
            updated_at: self.clock.now(),
            version: target.version,
            secondary_version: target.secondary_version,
            secondary_version_weight: target.secondary_version_weight,
            version_locator,
            secondary_version_locator,
        };
        let body =
            serde_json::to_vec(&doc).map_err(|e| RepoError::Serialization(e.to_string()))?;
        let key = self.layout.alias_key(name, alias);
        self.store.put(
            &key,
            &body,
            &PutOptions::new().with_content_type(ALIAS_CONTENT_TYPE),
        )?;
        doc.updated_at = self.store.head(&key)?.last_modified;
        info!(name, alias, version = %doc.version, "put alias");
        Ok(doc)
    }

    fn get_alias(&self, name: &str, alias: &str) -> RepoResult<Alias> {
        validate_name(name)?;
        self.read_alias(name, alias)
    }

    fn list_aliases(&self, name: &str) -> RepoResult<Vec<Alias>> {
        validate_name(name)?;
        let mut out = Vec::new();
        for summary in self.store.list(&self.layout.aliases_prefix(name), None)? {
            let Some(alias) = self.layout.decode_alias_key(name, &summary.key) else {
                continue;
            };
            match self.read_alias(name, alias) {
                Ok(doc) => out.push(doc),
                Err(RepoError::AliasNotFound { .. }) => continue,
                Err(e) => return Err(e),
            }
        }
        Ok(out)
    }

    fn delete_alias(&self, name: &str, alias: &str) -> RepoResult<()> {
        validate_name(name)?;
        self.store.delete(&self.layout.alias_key(name, alias))?;
        info!(name, alias, "deleted alias");
        Ok(())
    }

    fn purge_artifact_versions(
        &self,
        name: &str,
        policy: &RetentionPolicy,
    ) -> RepoResult<PurgeReport> {
        let versions = self.list_artifact_versions(name)?;
        let purged_at = self.clock.now();
        let purged = select_purge_candidates(&versions, policy, purged_at);
        for artifact in &purged {
            self.store
                .delete(&self.layout.version_file_key(name, artifact.version))?;
        }
        info!(name, purged = purged.len(), "purged artifact versions");
        Ok(PurgeReport {
            purged_at,
            cutoff: policy.cutoff(purged_at),
            purged,
        })
    }

    fn purge_artifact(&self, name: &str) -> RepoResult<()> {
        validate_name(name)?;
        let removed = self.store.delete_prefix(&self.layout.artifact_prefix(name))?;
        info!(name, removed, "purged artifact");
        Ok(())
    }

    fn purge_all(&self) -> RepoResult<()> {
        let removed = self.store.delete_prefix(&self.layout.root_prefix())?;
        info!(removed, "purged repository");
        Ok(())
    }
}

impl std::fmt::Debug for ObjectRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObjectRepository")
            .field("layout", &self.layout)
            .field("hash", &self.hasher.algorithm())
            .finish()
    }
}
