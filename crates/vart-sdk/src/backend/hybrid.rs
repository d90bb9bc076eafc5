//! Object storage for payloads, a strongly consistent index for metadata.
//!
//! Artifact rows live at `(name, encode_version(v))` and carry `updated_at`,
//! `deleted` and `hash`. Alias rows live in a separate partition,
//! `(encode_alias_key(name), alias)`. Payload keys are derived from the
//! row key, so the index never stores locators.
//!
//! Writes go storage first, index second. A crash between the two leaves
//! storage ahead of the index; replaying the same `put_artifact` repairs it.
//! Publish reserves its number with a hidden row before copying and reveals
//! the row once the copy has landed.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use vart_crypto::ContentHasher;
use vart_index::{AttributeUpdate, AttributeValue, Filter, Item, MetadataIndex, Query};
use vart_store::{ObjectStore, PutOptions};
use vart_types::{
    codec, validate_alias_name, Alias, AliasTarget, Artifact, Clock, SystemClock, Version,
};

use super::common::{
    payload_options, read_verified, recorded_hash, requested_version, validate_name,
};
use crate::config::RepositoryConfig;
use crate::error::{RepoError, RepoResult};
use crate::layout::StorageLayout;
use crate::repository::{BackendKind, Repository};
use crate::retention::{select_purge_candidates, PurgeReport, RetentionPolicy};

const ATTR_UPDATED_AT: &str = "updated_at";
const ATTR_DELETED: &str = "deleted";
const ATTR_HASH: &str = "hash";
const ATTR_PRIMARY: &str = "primary_version";
const ATTR_SECONDARY: &str = "secondary_version";
const ATTR_SECONDARY_WEIGHT: &str = "secondary_weight";

/// Repository backed by an object store plus a metadata index.
pub struct HybridRepository {
    store: Arc<dyn ObjectStore>,
    index: Arc<dyn MetadataIndex>,
    layout: StorageLayout,
    hasher: ContentHasher,
    clock: Arc<dyn Clock>,
}

impl HybridRepository {
    pub fn new(
        store: Arc<dyn ObjectStore>,
        index: Arc<dyn MetadataIndex>,
        config: &RepositoryConfig,
    ) -> RepoResult<Self> {
        Self::with_clock(store, index, config, Arc::new(SystemClock))
    }

    pub fn with_clock(
        store: Arc<dyn ObjectStore>,
        index: Arc<dyn MetadataIndex>,
        config: &RepositoryConfig,
        clock: Arc<dyn Clock>,
    ) -> RepoResult<Self> {
        config.validate()?;
        Ok(Self {
            store,
            index,
            layout: StorageLayout::from_config(config),
            hasher: ContentHasher::new(config.hash_algorithm),
            clock,
        })
    }

    pub fn layout(&self) -> &StorageLayout {
        &self.layout
    }

    fn locator(&self, name: &str, version: Version) -> String {
        self.store.locator(&self.layout.hybrid_key(name, version))
    }

    fn artifact_row(name: &str, version: Version, hash: &str, at: DateTime<Utc>) -> Item {
        Item::new(name, codec::encode_version(Some(version)))
            .with(ATTR_UPDATED_AT, at.to_rfc3339())
            .with(ATTR_DELETED, false)
            .with(ATTR_HASH, hash)
    }

    fn artifact_from_row(&self, name: &str, row: &Item) -> RepoResult<Artifact> {
        let version = Version::parse(&row.sort_key)?;
        let locator = self.locator(name, version);
        let updated_at = parse_timestamp(row, &locator)?;
        let content_hash = row
            .get_str(ATTR_HASH)?
            .ok_or_else(|| RepoError::corrupt(&locator, "missing hash"))?
            .to_string();
        Ok(Artifact {
            name: name.to_string(),
            version,
            updated_at,
            locator,
            content_hash,
        })
    }

    /// The live row of a version, or `None` if absent or soft-deleted.
    fn live_row(&self, name: &str, version: Version) -> RepoResult<Option<Item>> {
        let row = self
            .index
            .get_item(name, &codec::encode_version(Some(version)))?;
        match row {
            Some(row) if !row.get_bool(ATTR_DELETED)? => Ok(Some(row)),
            _ => Ok(None),
        }
    }

    /// `LATEST` plus the newest numbered row, deleted or not.
    fn newest_rows(&self, name: &str) -> RepoResult<Vec<Item>> {
        Ok(self.index.query(name, &Query::all().descending().limit(2))?)
    }

    fn require_live(&self, name: &str, version: Version) -> RepoResult<()> {
        match self.live_row(name, version)? {
            Some(_) => Ok(()),
            None => Err(RepoError::artifact_not_found(name, version)),
        }
    }

    fn alias_from_row(&self, name: &str, row: &Item) -> RepoResult<Alias> {
        let origin = format!("index row ({}, {})", row.partition_key, row.sort_key);
        let version = Version::parse(row.require_str(ATTR_PRIMARY)?)?;
        let secondary_version = row
            .get_str(ATTR_SECONDARY)?
            .map(Version::parse)
            .transpose()?;
        let secondary_version_weight = row
            .get_number(ATTR_SECONDARY_WEIGHT)?
            .map(|w| u32::try_from(w).map_err(|_| RepoError::corrupt(&origin, "weight out of range")))
            .transpose()?;
        Ok(Alias {
            name: name.to_string(),
            alias: row.sort_key.clone(),
            updated_at: parse_timestamp(row, &origin)?,
            version,
            secondary_version,
            secondary_version_weight,
            version_locator: self.locator(name, version),
            secondary_version_locator: secondary_version.map(|v| self.locator(name, v)),
        })
    }

    /// Bring the `LATEST` row in line with an unchanged payload object.
    fn repair_latest_row(&self, name: &str, hash: &str, at: DateTime<Utc>) -> RepoResult<()> {
        let current = self.index.get_item(name, &codec::encode_version(None))?;
        let in_sync = match &current {
            Some(row) => {
                !row.get_bool(ATTR_DELETED)?
                    && row.get_str(ATTR_HASH)? == Some(hash)
                    && row.get_str(ATTR_UPDATED_AT)? == Some(at.to_rfc3339().as_str())
            }
            None => false,
        };
        if !in_sync {
            warn!(name, "LATEST index row out of sync with storage; repairing");
            self.index
                .put_item(&Self::artifact_row(name, Version::Latest, hash, at))?;
        }
        Ok(())
    }
}

fn parse_timestamp(row: &Item, locator: &str) -> RepoResult<DateTime<Utc>> {
    let raw = row.require_str(ATTR_UPDATED_AT)?;
    DateTime::parse_from_rfc3339(raw)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| RepoError::corrupt(locator, format!("bad updated_at {raw:?}: {e}")))
}

impl Repository for HybridRepository {
    fn backend(&self) -> BackendKind {
        BackendKind::Hybrid
    }

    fn supports_soft_delete(&self) -> bool {
        true
    }

    fn put_artifact(
        &self,
        name: &str,
        content: &[u8],
        options: &PutOptions,
    ) -> RepoResult<Artifact> {
        validate_name(name)?;
        let hash = self.hasher.hash_hex(content);
        let key = self.layout.hybrid_key(name, Version::Latest);
        let locator = self.store.locator(&key);

        if let Some(head) = self.store.try_head(&key)? {
            if recorded_hash(&head, &self.hasher, &locator).ok().as_deref() == Some(hash.as_str()) {
                debug!(name, "content unchanged; skipping upload");
                self.repair_latest_row(name, &hash, head.last_modified)?;
                return Ok(Artifact {
                    name: name.to_string(),
                    version: Version::Latest,
                    updated_at: head.last_modified,
                    locator,
                    content_hash: hash,
                });
            }
        }

        let options = payload_options(name, &hash, &self.hasher, options);
        self.store.put(&key, content, &options)?;
        let head = self.store.head(&key)?;
        self.index
            .put_item(&Self::artifact_row(name, Version::Latest, &hash, head.last_modified))?;
        info!(name, size = content.len(), "uploaded artifact");
        Ok(Artifact {
            name: name.to_string(),
            version: Version::Latest,
            updated_at: head.last_modified,
            locator,
            content_hash: hash,
        })
    }

    fn get_artifact_version(&self, name: &str, version: Option<Version>) -> RepoResult<Artifact> {
        validate_name(name)?;
        let version = requested_version(version)?;
        match self.live_row(name, version)? {
            Some(row) => self.artifact_from_row(name, &row),
            None => Err(RepoError::artifact_not_found(name, version)),
        }
    }

    fn get_artifact_content(&self, name: &str, version: Option<Version>) -> RepoResult<Vec<u8>> {
        let artifact = self.get_artifact_version(name, version)?;
        let key = self.layout.hybrid_key(name, artifact.version);
        read_verified(self.store.as_ref(), &self.hasher, &key, &artifact)
    }

    fn list_artifact_names(&self) -> RepoResult<Vec<String>> {
        Ok(self.store.list_dirs(&self.layout.root_prefix())?)
    }

    fn list_artifact_versions(&self, name: &str) -> RepoResult<Vec<Artifact>> {
        validate_name(name)?;
        let query = Query::all()
            .descending()
            .filter(Filter::NotEquals(ATTR_DELETED.into(), AttributeValue::Bool(true)));
        self.index
            .query(name, &query)?
            .iter()
            .map(|row| self.artifact_from_row(name, row))
            .collect()
    }

    fn latest_published_version(&self, name: &str) -> RepoResult<Option<Version>> {
        validate_name(name)?;
        for row in self.newest_rows(name)? {
            let version = Version::parse(&row.sort_key)?;
            if !version.is_latest() {
                return Ok(Some(version));
            }
        }
        Ok(None)
    }

    fn publish_artifact_version(&self, name: &str) -> RepoResult<Artifact> {
        validate_name(name)?;
        let rows = self.newest_rows(name)?;
        let latest = match rows.first() {
            Some(row) if row.sort_key == codec::encode_version(None) => row,
            _ => return Err(RepoError::artifact_not_found(name, Version::Latest)),
        };
        if latest.get_bool(ATTR_DELETED)? {
            return Err(RepoError::artifact_not_found(name, Version::Latest));
        }
        let next = match rows.get(1) {
            None => Version::FIRST,
            Some(previous) => Version::parse(&previous.sort_key)?.successor()?,
        };
        let hash = latest
            .get_str(ATTR_HASH)?
            .ok_or_else(|| RepoError::corrupt(self.locator(name, Version::Latest), "missing hash"))?;

        // The claim stays hidden until the payload exists, so a crash after
        // the claim reserves the number without exposing a version.
        let claim =
            Self::artifact_row(name, next, hash, self.clock.now()).with(ATTR_DELETED, true);
        if !self.index.put_item_if_absent(&claim)? {
            return Err(RepoError::VersionConflict {
                name: name.to_string(),
                version: next,
            });
        }

        let new_key = self.layout.hybrid_key(name, next);
        if let Err(e) = self
            .store
            .copy(&self.layout.hybrid_key(name, Version::Latest), &new_key)
        {
            warn!(name, version = %next, error = %e, "copy failed; releasing claimed version");
            self.index.delete_item(&claim.partition_key, &claim.sort_key)?;
            return Err(e.into());
        }

        let head = self.store.head(&new_key)?;
        let row = self
            .index
            .update_item(
                &claim.partition_key,
                &claim.sort_key,
                &[
                    AttributeUpdate::set(ATTR_UPDATED_AT, head.last_modified.to_rfc3339()),
                    AttributeUpdate::set(ATTR_DELETED, false),
                ],
            )?
            .ok_or_else(|| RepoError::artifact_not_found(name, next))?;
        info!(name, version = %next, "published artifact version");
        self.artifact_from_row(name, &row)
    }

    fn delete_artifact_version(&self, name: &str, version: Option<Version>) -> RepoResult<()> {
        validate_name(name)?;
        let version = requested_version(version)?;
        let updated = self.index.update_item(
            name,
            &codec::encode_version(Some(version)),
            &[AttributeUpdate::set(ATTR_DELETED, true)],
        )?;
        match updated {
            Some(_) => info!(name, version = %version, "soft-deleted artifact version"),
            None => debug!(name, version = %version, "nothing to delete"),
        }
        Ok(())
    }

    fn put_alias(&self, name: &str, alias: &str, target: &AliasTarget) -> RepoResult<Alias> {
        validate_name(name)?;
        validate_alias_name(alias)?;
        target.validate()?;

        self.require_live(name, target.version)?;
        if let Some(secondary) = target.secondary_version {
            self.require_live(name, secondary)?;
        }

        let row = Item::new(codec::encode_alias_key(name), alias)
            .with(ATTR_UPDATED_AT, self.clock.now().to_rfc3339())
            .with(ATTR_PRIMARY, codec::encode_version(Some(target.version)))
            .with_opt(
                ATTR_SECONDARY,
                target.secondary_version.map(|v| codec::encode_version(Some(v))),
            )
            .with_opt(
                ATTR_SECONDARY_WEIGHT,
                target.secondary_version_weight.map(i64::from),
            );
        self.index.put_item(&row)?;
        info!(name, alias, version = %target.version, "put alias");
        self.alias_from_row(name, &row)
    }

    fn get_alias(&self, name: &str, alias: &str) -> RepoResult<Alias> {
        validate_name(name)?;
        let row = self
            .index
            .get_item(&codec::encode_alias_key(name), alias)?
            .ok_or_else(|| RepoError::alias_not_found(name, alias))?;
        self.alias_from_row(name, &row)
    }

    fn list_aliases(&self, name: &str) -> RepoResult<Vec<Alias>> {
        validate_name(name)?;
        self.index
            .query(&codec::encode_alias_key(name), &Query::all())?
            .iter()
            .map(|row| self.alias_from_row(name, row))
            .collect()
    }

    fn delete_alias(&self, name: &str, alias: &str) -> RepoResult<()> {
        validate_name(name)?;
        self.index.delete_item(&codec::encode_alias_key(name), alias)?;
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
                .delete(&self.layout.hybrid_key(name, artifact.version))?;
            self.index
                .delete_item(name, &codec::encode_version(Some(artifact.version)))?;
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
        let objects = self.store.delete_prefix(&self.layout.artifact_prefix(name))?;
        let rows = self.index.delete_partition(name)?
            + self.index.delete_partition(&codec::encode_alias_key(name))?;
        info!(name, objects, rows, "purged artifact");
        Ok(())
    }

    fn purge_all(&self) -> RepoResult<()> {
        let objects = self.store.delete_prefix(&self.layout.root_prefix())?;
        let keys: Vec<(String, String)> = self
            .index
            .scan(None)?
            .into_iter()
            .map(|row| (row.partition_key, row.sort_key))
            .collect();
        let rows = self.index.batch_delete(&keys)?;
        info!(objects, rows, "purged repository");
        Ok(())
    }
}

impl std::fmt::Debug for HybridRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HybridRepository")
            .field("layout", &self.layout)
            .field("hash", &self.hasher.algorithm())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::panic::{self, AssertUnwindSafe};
    use std::sync::atomic::{AtomicBool, Ordering};

    use chrono::{Duration, TimeZone};
    use vart_index::InMemoryIndex;
    use vart_store::{
        InMemoryObjectStore, ObjectData, ObjectHead, ObjectSummary, PutReceipt, StoreResult,
    };
    use vart_types::ManualClock;

    struct Fixture {
        repo: HybridRepository,
        store: Arc<InMemoryObjectStore>,
        index: Arc<InMemoryIndex>,
        clock: Arc<ManualClock>,
    }

    fn fixture() -> Fixture {
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        ));
        let store = Arc::new(InMemoryObjectStore::with_clock("bucket", clock.clone()));
        let index = Arc::new(InMemoryIndex::new());
        let repo = HybridRepository::with_clock(
            store.clone(),
            index.clone(),
            &RepositoryConfig::default(),
            clock.clone(),
        )
        .unwrap();
        Fixture {
            repo,
            store,
            index,
            clock,
        }
    }

    fn versions(repo: &HybridRepository, name: &str) -> Vec<Version> {
        repo.list_artifact_versions(name)
            .unwrap()
            .into_iter()
            .map(|a| a.version)
            .collect()
    }

    // -----------------------------------------------------------------------
    // put
    // -----------------------------------------------------------------------

    #[test]
    fn put_writes_object_then_row() {
        let f = fixture();
        let artifact = f.repo.put_artifact("app", b"v1", &PutOptions::default()).unwrap();
        assert_eq!(artifact.locator, "mem://bucket/versioned-artifacts/app/LATEST");
        assert!(f.store.exists("versioned-artifacts/app/LATEST").unwrap());

        let row = f.index.get_item("app", "LATEST").unwrap().unwrap();
        assert_eq!(row.get_str("hash").unwrap(), Some(artifact.content_hash.as_str()));
        assert!(!row.get_bool("deleted").unwrap());
    }

    #[test]
    fn put_identical_content_writes_nothing() {
        let f = fixture();
        let first = f.repo.put_artifact("app", b"same", &PutOptions::default()).unwrap();
        let row_before = f.index.get_item("app", "LATEST").unwrap();
        f.clock.advance(Duration::hours(1));
        let second = f.repo.put_artifact("app", b"same", &PutOptions::default()).unwrap();
        assert_eq!(first, second);
        assert_eq!(f.index.get_item("app", "LATEST").unwrap(), row_before);
    }

    #[test]
    fn put_replay_repairs_missing_row() {
        let f = fixture();
        f.repo.put_artifact("app", b"v1", &PutOptions::default()).unwrap();
        // Crash after the object write: the row never landed.
        f.index.delete_item("app", "LATEST").unwrap();
        assert!(f.repo.get_artifact_version("app", None).is_err());

        f.repo.put_artifact("app", b"v1", &PutOptions::default()).unwrap();
        assert!(f.repo.get_artifact_version("app", None).is_ok());
    }

    #[test]
    fn put_replay_revives_soft_deleted_latest() {
        let f = fixture();
        f.repo.put_artifact("app", b"v1", &PutOptions::default()).unwrap();
        f.repo.delete_artifact_version("app", None).unwrap();
        f.repo.put_artifact("app", b"v1", &PutOptions::default()).unwrap();
        assert_eq!(versions(&f.repo, "app"), vec![Version::Latest]);
    }

    // -----------------------------------------------------------------------
    // publish
    // -----------------------------------------------------------------------

    #[test]
    fn publish_sequence_and_repeat() {
        let f = fixture();
        f.repo.put_artifact("app", b"v1", &PutOptions::default()).unwrap();
        let one = f.repo.publish_artifact_version("app").unwrap();
        assert_eq!(one.version, Version::Number(1));
        assert_eq!(one.locator, "mem://bucket/versioned-artifacts/app/000001");
        // No dedup here: an unchanged LATEST still yields a new version.
        let two = f.repo.publish_artifact_version("app").unwrap();
        assert_eq!(two.version, Version::Number(2));
        assert_eq!(two.content_hash, one.content_hash);
        assert_eq!(
            f.repo.latest_published_version("app").unwrap(),
            Some(Version::Number(2))
        );
    }

    #[test]
    fn publish_uses_post_copy_timestamp() {
        let f = fixture();
        f.repo.put_artifact("app", b"v1", &PutOptions::default()).unwrap();
        f.clock.advance(Duration::days(1));
        let published = f.repo.publish_artifact_version("app").unwrap();
        let head = f.store.head("versioned-artifacts/app/000001").unwrap();
        assert_eq!(published.updated_at, head.last_modified);
    }

    #[test]
    fn publish_requires_live_latest() {
        let f = fixture();
        assert!(matches!(
            f.repo.publish_artifact_version("app"),
            Err(RepoError::ArtifactNotFound { .. })
        ));
        f.repo.put_artifact("app", b"v1", &PutOptions::default()).unwrap();
        f.repo.delete_artifact_version("app", None).unwrap();
        assert!(matches!(
            f.repo.publish_artifact_version("app"),
            Err(RepoError::ArtifactNotFound { .. })
        ));
    }

    /// An index where another publisher always wins the conditional put.
    struct RacingIndex(InMemoryIndex);

    impl MetadataIndex for RacingIndex {
        fn put_item(&self, item: &Item) -> vart_index::IndexResult<()> {
            self.0.put_item(item)
        }
        fn put_item_if_absent(&self, item: &Item) -> vart_index::IndexResult<bool> {
            let rival = item.clone().with(ATTR_HASH, "rival");
            self.0.put_item_if_absent(&rival)?;
            self.0.put_item_if_absent(item)
        }
        fn get_item(&self, pk: &str, sk: &str) -> vart_index::IndexResult<Option<Item>> {
            self.0.get_item(pk, sk)
        }
        fn query(&self, pk: &str, query: &Query) -> vart_index::IndexResult<Vec<Item>> {
            self.0.query(pk, query)
        }
        fn update_item(
            &self,
            pk: &str,
            sk: &str,
            updates: &[AttributeUpdate],
        ) -> vart_index::IndexResult<Option<Item>> {
            self.0.update_item(pk, sk, updates)
        }
        fn delete_item(&self, pk: &str, sk: &str) -> vart_index::IndexResult<bool> {
            self.0.delete_item(pk, sk)
        }
        fn scan(&self, filter: Option<&Filter>) -> vart_index::IndexResult<Vec<Item>> {
            self.0.scan(filter)
        }
    }

    #[test]
    fn publish_conflict_leaves_winner_untouched() {
        let store = Arc::new(InMemoryObjectStore::new("bucket"));
        let index = Arc::new(RacingIndex(InMemoryIndex::new()));
        let repo =
            HybridRepository::new(store.clone(), index.clone(), &RepositoryConfig::default())
                .unwrap();
        repo.put_artifact("app", b"v1", &PutOptions::default()).unwrap();

        let err = repo.publish_artifact_version("app").unwrap_err();
        assert!(matches!(
            err,
            RepoError::VersionConflict {
                version: Version::Number(1),
                ..
            }
        ));
        assert!(!store.exists("versioned-artifacts/app/000001").unwrap());
        let winner = index.get_item("app", "000001").unwrap().unwrap();
        assert_eq!(winner.get_str("hash").unwrap(), Some("rival"));
    }

    /// A store that dies mid-copy while armed.
    struct DyingCopy {
        inner: InMemoryObjectStore,
        armed: AtomicBool,
    }

    impl ObjectStore for DyingCopy {
        fn put(&self, key: &str, data: &[u8], options: &PutOptions) -> StoreResult<PutReceipt> {
            self.inner.put(key, data, options)
        }
        fn get(&self, key: &str) -> StoreResult<ObjectData> {
            self.inner.get(key)
        }
        fn head(&self, key: &str) -> StoreResult<ObjectHead> {
            self.inner.head(key)
        }
        fn list(&self, prefix: &str, limit: Option<usize>) -> StoreResult<Vec<ObjectSummary>> {
            self.inner.list(prefix, limit)
        }
        fn list_dirs(&self, prefix: &str) -> StoreResult<Vec<String>> {
            self.inner.list_dirs(prefix)
        }
        fn copy(&self, src: &str, dst: &str) -> StoreResult<PutReceipt> {
            if self.armed.load(Ordering::SeqCst) {
                panic!("process died during copy");
            }
            self.inner.copy(src, dst)
        }
        fn copy_if_absent(&self, src: &str, dst: &str) -> StoreResult<PutReceipt> {
            self.inner.copy_if_absent(src, dst)
        }
        fn delete(&self, key: &str) -> StoreResult<bool> {
            self.inner.delete(key)
        }
        fn delete_prefix(&self, prefix: &str) -> StoreResult<usize> {
            self.inner.delete_prefix(prefix)
        }
        fn locator(&self, key: &str) -> String {
            self.inner.locator(key)
        }
    }

    #[test]
    fn crash_during_publish_copy_leaves_no_visible_version() {
        let store = Arc::new(DyingCopy {
            inner: InMemoryObjectStore::new("bucket"),
            armed: AtomicBool::new(true),
        });
        let index = Arc::new(InMemoryIndex::new());
        let repo =
            HybridRepository::new(store.clone(), index.clone(), &RepositoryConfig::default())
                .unwrap();
        repo.put_artifact("app", b"x", &PutOptions::default()).unwrap();

        let crashed =
            panic::catch_unwind(AssertUnwindSafe(|| repo.publish_artifact_version("app")));
        assert!(crashed.is_err());

        assert!(matches!(
            repo.get_artifact_version("app", Some(Version::Number(1))),
            Err(RepoError::ArtifactNotFound { .. })
        ));
        assert_eq!(versions(&repo, "app"), vec![Version::Latest]);
        assert!(matches!(
            repo.put_alias("app", "prod", &AliasTarget::new(Version::Number(1))),
            Err(RepoError::ArtifactNotFound { .. })
        ));
        assert_eq!(repo.latest_published_version("app").unwrap(), Some(Version::Number(1)));

        // The hidden row still holds its number.
        store.armed.store(false, Ordering::SeqCst);
        let next = repo.publish_artifact_version("app").unwrap();
        assert_eq!(next.version, Version::Number(2));
        assert_eq!(repo.get_artifact_content("app", Some(next.version)).unwrap(), b"x");
    }

    #[test]
    fn published_row_is_live() {
        let f = fixture();
        f.repo.put_artifact("app", b"v1", &PutOptions::default()).unwrap();
        f.repo.publish_artifact_version("app").unwrap();
        let row = f.index.get_item("app", "000001").unwrap().unwrap();
        assert!(!row.get_bool("deleted").unwrap());
    }

    #[test]
    fn soft_deleted_newest_still_advances_numbering() {
        let f = fixture();
        f.repo.put_artifact("app", b"v1", &PutOptions::default()).unwrap();
        f.repo.publish_artifact_version("app").unwrap();
        f.repo.delete_artifact_version("app", Some(Version::Number(1))).unwrap();
        let next = f.repo.publish_artifact_version("app").unwrap();
        assert_eq!(next.version, Version::Number(2));
    }

    // -----------------------------------------------------------------------
    // delete / list
    // -----------------------------------------------------------------------

    #[test]
    fn soft_delete_hides_but_keeps_payload() {
        let f = fixture();
        f.repo.put_artifact("app", b"v1", &PutOptions::default()).unwrap();
        f.repo.publish_artifact_version("app").unwrap();
        f.repo.delete_artifact_version("app", Some(Version::Number(1))).unwrap();

        assert!(f.repo.supports_soft_delete());
        assert!(matches!(
            f.repo.get_artifact_version("app", Some(Version::Number(1))),
            Err(RepoError::ArtifactNotFound { .. })
        ));
        assert_eq!(versions(&f.repo, "app"), vec![Version::Latest]);
        assert!(f.store.exists("versioned-artifacts/app/000001").unwrap());
        assert!(f.index.get_item("app", "000001").unwrap().is_some());
    }

    #[test]
    fn delete_of_missing_version_is_ok() {
        let f = fixture();
        f.repo.delete_artifact_version("app", Some(Version::Number(7))).unwrap();
        assert!(f.index.is_empty());
    }

    #[test]
    fn corrupt_timestamp_is_reported() {
        let f = fixture();
        f.index
            .put_item(
                &Item::new("app", "LATEST")
                    .with("updated_at", "yesterday")
                    .with("hash", "abc"),
            )
            .unwrap();
        assert!(matches!(
            f.repo.get_artifact_version("app", None),
            Err(RepoError::CorruptRecord { .. })
        ));
    }

    // -----------------------------------------------------------------------
    // aliases
    // -----------------------------------------------------------------------

    #[test]
    fn alias_rows_live_in_their_own_partition() {
        let f = fixture();
        f.repo.put_artifact("app", b"v1", &PutOptions::default()).unwrap();
        f.repo.publish_artifact_version("app").unwrap();
        f.repo.put_artifact("app", b"v2", &PutOptions::default()).unwrap();
        f.repo.publish_artifact_version("app").unwrap();

        let target = AliasTarget::new(Version::Number(1)).with_secondary(Version::Number(2), 20);
        let alias = f.repo.put_alias("app", "prod", &target).unwrap();
        assert_eq!(alias.target(), target);
        assert_eq!(
            alias.secondary_version_locator.as_deref(),
            Some("mem://bucket/versioned-artifacts/app/000002")
        );

        let row = f.index.get_item("__app-alias", "prod").unwrap().unwrap();
        assert_eq!(row.get_str("primary_version").unwrap(), Some("000001"));
        assert_eq!(row.get_number("secondary_weight").unwrap(), Some(20));
        assert_eq!(f.repo.get_alias("app", "prod").unwrap(), alias);
        assert_eq!(versions(&f.repo, "app").len(), 3);
    }

    #[test]
    fn alias_rejects_soft_deleted_target() {
        let f = fixture();
        f.repo.put_artifact("app", b"v1", &PutOptions::default()).unwrap();
        f.repo.publish_artifact_version("app").unwrap();
        f.repo.delete_artifact_version("app", Some(Version::Number(1))).unwrap();
        assert!(matches!(
            f.repo.put_alias("app", "prod", &AliasTarget::new(Version::Number(1))),
            Err(RepoError::ArtifactNotFound { .. })
        ));
    }

    #[test]
    fn alias_list_and_delete() {
        let f = fixture();
        f.repo.put_artifact("app", b"v1", &PutOptions::default()).unwrap();
        f.repo.put_alias("app", "beta", &AliasTarget::latest()).unwrap();
        f.repo.put_alias("app", "alpha", &AliasTarget::latest()).unwrap();
        let names: Vec<String> = f
            .repo
            .list_aliases("app")
            .unwrap()
            .into_iter()
            .map(|a| a.alias)
            .collect();
        assert_eq!(names, vec!["alpha", "beta"]);

        f.repo.delete_alias("app", "alpha").unwrap();
        assert!(matches!(
            f.repo.get_alias("app", "alpha"),
            Err(RepoError::AliasNotFound { .. })
        ));
    }

    // -----------------------------------------------------------------------
    // purge
    // -----------------------------------------------------------------------

    #[test]
    fn retention_purge_removes_object_and_row() {
        let f = fixture();
        for i in 0..4u8 {
            f.repo.put_artifact("app", &[i], &PutOptions::default()).unwrap();
            f.repo.publish_artifact_version("app").unwrap();
            f.clock.advance(Duration::days(40));
        }
        // Ages: v1 160d, v2 120d, v3 80d, v4 40d.
        let report = f
            .repo
            .purge_artifact_versions("app", &RetentionPolicy::new(1, Duration::days(100)))
            .unwrap();
        let purged: Vec<Version> = report.purged.iter().map(|a| a.version).collect();
        assert_eq!(purged, vec![Version::Number(2), Version::Number(1)]);
        assert!(!f.store.exists("versioned-artifacts/app/000001").unwrap());
        assert!(f.index.get_item("app", "000001").unwrap().is_none());
        assert_eq!(
            versions(&f.repo, "app"),
            vec![Version::Latest, Version::Number(4), Version::Number(3)]
        );
    }

    #[test]
    fn purge_artifact_and_all_clear_both_sides() {
        let f = fixture();
        for name in ["app", "lib"] {
            f.repo.put_artifact(name, b"x", &PutOptions::default()).unwrap();
            f.repo.put_alias(name, "dev", &AliasTarget::latest()).unwrap();
        }
        assert_eq!(f.repo.list_artifact_names().unwrap(), vec!["app", "lib"]);

        f.repo.purge_artifact("app").unwrap();
        assert_eq!(f.repo.list_artifact_names().unwrap(), vec!["lib"]);
        assert!(f.repo.list_aliases("app").unwrap().is_empty());
        assert_eq!(f.index.len(), 2);

        f.repo.purge_all().unwrap();
        assert!(f.store.is_empty());
        assert!(f.index.is_empty());
    }
}
