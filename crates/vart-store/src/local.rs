//! Filesystem-backed object store.
//!
//! On-disk layout under the store root:
//!
//! ```text
//! objects/<key>   payload bytes
//! meta/<key>      JSON sidecar: etag, timestamp, content type, metadata, tags
//! tmp/            staging area for atomic writes
//! ```
//!
//! Every file lands through a temp file in `tmp/` and a rename, so readers
//! never observe a half-written payload or sidecar. Conditional copies use a
//! no-clobber persist, which fails atomically when the destination exists.

use std::collections::BTreeMap;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tracing::{debug, warn};
use walkdir::WalkDir;

use vart_types::{Clock, SystemClock};

use crate::error::{StoreError, StoreResult};
use crate::key::validate_key;
use crate::object::{compute_etag, ObjectData, ObjectHead, ObjectSummary, PutOptions, PutReceipt};
use crate::traits::ObjectStore;

const OBJECTS_DIR: &str = "objects";
const META_DIR: &str = "meta";
const TMP_DIR: &str = "tmp";

/// Sidecar record persisted next to each payload.
#[derive(Clone, Debug, Serialize, Deserialize)]
struct Sidecar {
    etag: String,
    size: u64,
    last_modified: DateTime<Utc>,
    #[serde(default)]
    content_type: Option<String>,
    #[serde(default)]
    metadata: BTreeMap<String, String>,
    #[serde(default)]
    tags: BTreeMap<String, String>,
}

impl Sidecar {
    fn into_head(self, key: &str) -> ObjectHead {
        ObjectHead {
            key: key.to_string(),
            size: self.size,
            etag: self.etag,
            last_modified: self.last_modified,
            content_type: self.content_type,
            metadata: self.metadata,
            tags: self.tags,
        }
    }
}

/// Object store rooted at a local directory.
pub struct LocalObjectStore {
    root: PathBuf,
    clock: Arc<dyn Clock>,
}

impl LocalObjectStore {
    /// Open (or create) a store rooted at `root`.
    pub fn open(root: impl AsRef<Path>) -> StoreResult<Self> {
        Self::open_with_clock(root, Arc::new(SystemClock))
    }

    /// Open (or create) a store that stamps writes with `clock`.
    pub fn open_with_clock(root: impl AsRef<Path>, clock: Arc<dyn Clock>) -> StoreResult<Self> {
        let root = root.as_ref().to_path_buf();
        for dir in [OBJECTS_DIR, META_DIR, TMP_DIR] {
            fs::create_dir_all(root.join(dir))?;
        }
        debug!(root = %root.display(), "opened local object store");
        Ok(Self { root, clock })
    }

    /// The store root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn object_path(&self, key: &str) -> PathBuf {
        key.split('/')
            .fold(self.root.join(OBJECTS_DIR), |path, segment| path.join(segment))
    }

    fn meta_path(&self, key: &str) -> PathBuf {
        key.split('/')
            .fold(self.root.join(META_DIR), |path, segment| path.join(segment))
    }

    fn read_sidecar(&self, key: &str) -> StoreResult<Sidecar> {
        let raw = fs::read(self.meta_path(key)).map_err(|e| map_io(key, e))?;
        serde_json::from_slice(&raw).map_err(|e| StoreError::Serialization(e.to_string()))
    }

    fn staged(&self, data: &[u8]) -> StoreResult<NamedTempFile> {
        let mut tmp = NamedTempFile::new_in(self.root.join(TMP_DIR))?;
        tmp.write_all(data)?;
        tmp.as_file().sync_all()?;
        Ok(tmp)
    }

    fn write_sidecar(&self, key: &str, sidecar: &Sidecar) -> StoreResult<()> {
        let raw =
            serde_json::to_vec_pretty(sidecar).map_err(|e| StoreError::Serialization(e.to_string()))?;
        let dest = self.meta_path(key);
        ensure_parent(&dest)?;
        self.staged(&raw)?
            .persist(&dest)
            .map_err(|e| StoreError::Io(e.error))?;
        Ok(())
    }

    /// Stage `data` and move it into place at `key`. With `no_clobber` the
    /// move fails with [`StoreError::AlreadyExists`] if `key` is taken.
    fn write_object(&self, key: &str, data: &[u8], no_clobber: bool) -> StoreResult<()> {
        let dest = self.object_path(key);
        ensure_parent(&dest)?;
        let tmp = self.staged(data)?;
        let persisted = if no_clobber {
            tmp.persist_noclobber(&dest)
        } else {
            tmp.persist(&dest)
        };
        match persisted {
            Ok(_) => Ok(()),
            Err(e) if e.error.kind() == io::ErrorKind::AlreadyExists => {
                Err(StoreError::AlreadyExists {
                    key: key.to_string(),
                })
            }
            Err(e) => Err(StoreError::Io(e.error)),
        }
    }

    fn store(
        &self,
        key: &str,
        data: &[u8],
        sidecar: Sidecar,
        no_clobber: bool,
    ) -> StoreResult<PutReceipt> {
        self.write_object(key, data, no_clobber)?;
        let receipt = PutReceipt {
            etag: sidecar.etag.clone(),
            last_modified: sidecar.last_modified,
        };
        self.write_sidecar(key, &sidecar)?;
        Ok(receipt)
    }

    fn copy_object(&self, src: &str, dst: &str, no_clobber: bool) -> StoreResult<PutReceipt> {
        validate_key(src)?;
        validate_key(dst)?;
        let source = self.get(src)?;
        let sidecar = Sidecar {
            etag: source.head.etag,
            size: source.head.size,
            last_modified: self.clock.now(),
            content_type: source.head.content_type,
            metadata: source.head.metadata,
            tags: source.head.tags,
        };
        let receipt = self.store(dst, &source.bytes, sidecar, no_clobber)?;
        debug!(src, dst, "copied object");
        Ok(receipt)
    }

    /// Remove empty directories from `path` upward, stopping at `stop`.
    fn prune_empty_dirs(path: &Path, stop: &Path) {
        let mut current = path.parent();
        while let Some(dir) = current {
            if dir == stop || !dir.starts_with(stop) {
                break;
            }
            // Fails on non-empty directories, which ends the walk.
            if fs::remove_dir(dir).is_err() {
                break;
            }
            current = dir.parent();
        }
    }

    fn keys_with_prefix(&self, prefix: &str) -> StoreResult<Vec<String>> {
        let objects_root = self.root.join(OBJECTS_DIR);
        let mut keys = Vec::new();
        for entry in WalkDir::new(&objects_root).min_depth(1) {
            let entry = entry.map_err(|e| {
                StoreError::Io(e.into_io_error().unwrap_or_else(|| {
                    io::Error::new(io::ErrorKind::Other, "filesystem loop while listing")
                }))
            })?;
            if !entry.file_type().is_file() {
                continue;
            }
            let Ok(relative) = entry.path().strip_prefix(&objects_root) else {
                continue;
            };
            let key = relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");
            if key.starts_with(prefix) {
                keys.push(key);
            }
        }
        keys.sort();
        Ok(keys)
    }
}

impl ObjectStore for LocalObjectStore {
    fn put(&self, key: &str, data: &[u8], options: &PutOptions) -> StoreResult<PutReceipt> {
        validate_key(key)?;
        let sidecar = Sidecar {
            etag: compute_etag(data),
            size: data.len() as u64,
            last_modified: self.clock.now(),
            content_type: options.content_type.clone(),
            metadata: options.metadata.clone(),
            tags: options.tags.clone(),
        };
        let receipt = self.store(key, data, sidecar, false)?;
        debug!(key, size = data.len(), "stored object");
        Ok(receipt)
    }

    fn get(&self, key: &str) -> StoreResult<ObjectData> {
        validate_key(key)?;
        let bytes = fs::read(self.object_path(key)).map_err(|e| map_io(key, e))?;
        let head = self.read_sidecar(key)?.into_head(key);
        Ok(ObjectData { head, bytes })
    }

    fn head(&self, key: &str) -> StoreResult<ObjectHead> {
        validate_key(key)?;
        if !self.object_path(key).is_file() {
            return Err(StoreError::not_found(key));
        }
        Ok(self.read_sidecar(key)?.into_head(key))
    }

    fn list(&self, prefix: &str, limit: Option<usize>) -> StoreResult<Vec<ObjectSummary>> {
        let mut out = Vec::new();
        for key in self.keys_with_prefix(prefix)? {
            if limit.is_some_and(|n| out.len() >= n) {
                break;
            }
            match self.read_sidecar(&key) {
                Ok(sidecar) => out.push(ObjectSummary::from(&sidecar.into_head(&key))),
                // Payload landed but its sidecar has not yet.
                Err(StoreError::NotFound { .. }) => {
                    warn!(key, "object without metadata sidecar; skipping");
                }
                Err(e) => return Err(e),
            }
        }
        Ok(out)
    }

    fn list_dirs(&self, prefix: &str) -> StoreResult<Vec<String>> {
        let dir = prefix
            .trim_end_matches('/')
            .split('/')
            .filter(|s| !s.is_empty())
            .fold(self.root.join(OBJECTS_DIR), |path, segment| path.join(segment));
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        let mut dirs = Vec::new();
        for entry in entries {
            let entry = entry?;
            if entry.file_type()?.is_dir() {
                dirs.push(entry.file_name().to_string_lossy().into_owned());
            }
        }
        dirs.sort();
        Ok(dirs)
    }

    fn copy(&self, src: &str, dst: &str) -> StoreResult<PutReceipt> {
        self.copy_object(src, dst, false)
    }

    fn copy_if_absent(&self, src: &str, dst: &str) -> StoreResult<PutReceipt> {
        self.copy_object(src, dst, true)
    }

    fn delete(&self, key: &str) -> StoreResult<bool> {
        validate_key(key)?;
        let object = self.object_path(key);
        let existed = match fs::remove_file(&object) {
            Ok(()) => true,
            Err(e) if e.kind() == io::ErrorKind::NotFound => false,
            Err(e) => return Err(e.into()),
        };
        let meta = self.meta_path(key);
        if let Err(e) = fs::remove_file(&meta) {
            if e.kind() != io::ErrorKind::NotFound {
                return Err(e.into());
            }
        }
        Self::prune_empty_dirs(&object, &self.root.join(OBJECTS_DIR));
        Self::prune_empty_dirs(&meta, &self.root.join(META_DIR));
        if existed {
            debug!(key, "deleted object");
        }
        Ok(existed)
    }

    fn delete_prefix(&self, prefix: &str) -> StoreResult<usize> {
        let mut removed = 0;
        for key in self.keys_with_prefix(prefix)? {
            if self.delete(&key)? {
                removed += 1;
            }
        }
        debug!(prefix, removed, "deleted objects by prefix");
        Ok(removed)
    }

    fn locator(&self, key: &str) -> String {
        format!("file://{}", self.object_path(key).display())
    }
}

impl std::fmt::Debug for LocalObjectStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalObjectStore")
            .field("root", &self.root)
            .finish()
    }
}

fn ensure_parent(path: &Path) -> StoreResult<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    Ok(())
}

fn map_io(key: &str, e: io::Error) -> StoreError {
    if e.kind() == io::ErrorKind::NotFound {
        StoreError::not_found(key)
    } else {
        StoreError::Io(e)
    }
}
