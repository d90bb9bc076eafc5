use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

use vart_types::{Clock, SystemClock};

use crate::error::{StoreError, StoreResult};
use crate::key::validate_key;
use crate::object::{
    child_dir, compute_etag, ObjectData, ObjectHead, ObjectSummary, PutOptions, PutReceipt,
};
use crate::traits::ObjectStore;

/// In-memory, BTreeMap-based object store.
///
/// Intended for tests and embedding. Objects live behind a `RwLock` and are
/// cloned on read/write. The map is ordered, so listing is a range scan.
pub struct InMemoryObjectStore {
    bucket: String,
    objects: RwLock<BTreeMap<String, ObjectData>>,
    clock: Arc<dyn Clock>,
}

impl InMemoryObjectStore {
    /// Create an empty store named `bucket` on the system clock.
    pub fn new(bucket: impl Into<String>) -> Self {
        Self::with_clock(bucket, Arc::new(SystemClock))
    }

    /// Create an empty store that stamps writes with `clock`.
    pub fn with_clock(bucket: impl Into<String>, clock: Arc<dyn Clock>) -> Self {
        Self {
            bucket: bucket.into(),
            objects: RwLock::new(BTreeMap::new()),
            clock,
        }
    }

    /// Number of objects currently stored.
    pub fn len(&self) -> usize {
        self.objects.read().expect("lock poisoned").len()
    }

    /// Returns `true` if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.objects.read().expect("lock poisoned").is_empty()
    }

    /// All keys, ascending.
    pub fn keys(&self) -> Vec<String> {
        self.objects
            .read()
            .expect("lock poisoned")
            .keys()
            .cloned()
            .collect()
    }

    fn copied(&self, source: &ObjectData, dst: &str) -> ObjectData {
        let mut copy = source.clone();
        copy.head.key = dst.to_string();
        copy.head.last_modified = self.clock.now();
        copy
    }
}

impl Default for InMemoryObjectStore {
    fn default() -> Self {
        Self::new("default")
    }
}

impl ObjectStore for InMemoryObjectStore {
    fn put(&self, key: &str, data: &[u8], options: &PutOptions) -> StoreResult<PutReceipt> {
        validate_key(key)?;
        let head = ObjectHead {
            key: key.to_string(),
            size: data.len() as u64,
            etag: compute_etag(data),
            last_modified: self.clock.now(),
            content_type: options.content_type.clone(),
            metadata: options.metadata.clone(),
            tags: options.tags.clone(),
        };
        let receipt = PutReceipt {
            etag: head.etag.clone(),
            last_modified: head.last_modified,
        };
        let object = ObjectData {
            head,
            bytes: data.to_vec(),
        };
        self.objects
            .write()
            .expect("lock poisoned")
            .insert(key.to_string(), object);
        Ok(receipt)
    }

    fn get(&self, key: &str) -> StoreResult<ObjectData> {
        validate_key(key)?;
        let map = self.objects.read().expect("lock poisoned");
        map.get(key).cloned().ok_or_else(|| StoreError::not_found(key))
    }

    fn head(&self, key: &str) -> StoreResult<ObjectHead> {
        validate_key(key)?;
        let map = self.objects.read().expect("lock poisoned");
        map.get(key)
            .map(|obj| obj.head.clone())
            .ok_or_else(|| StoreError::not_found(key))
    }

    fn list(&self, prefix: &str, limit: Option<usize>) -> StoreResult<Vec<ObjectSummary>> {
        let map = self.objects.read().expect("lock poisoned");
        let matching = map
            .range(prefix.to_string()..)
            .take_while(|(k, _)| k.starts_with(prefix))
            .map(|(_, obj)| ObjectSummary::from(&obj.head));
        Ok(match limit {
            Some(n) => matching.take(n).collect(),
            None => matching.collect(),
        })
    }

    fn list_dirs(&self, prefix: &str) -> StoreResult<Vec<String>> {
        let map = self.objects.read().expect("lock poisoned");
        let mut dirs: Vec<String> = map
            .keys()
            .filter_map(|k| child_dir(prefix, k))
            .map(str::to_string)
            .collect();
        dirs.sort();
        dirs.dedup();
        Ok(dirs)
    }

    fn copy(&self, src: &str, dst: &str) -> StoreResult<PutReceipt> {
        validate_key(src)?;
        validate_key(dst)?;
        let mut map = self.objects.write().expect("lock poisoned");
        let source = map.get(src).ok_or_else(|| StoreError::not_found(src))?;
        let copy = self.copied(source, dst);
        let receipt = PutReceipt {
            etag: copy.head.etag.clone(),
            last_modified: copy.head.last_modified,
        };
        map.insert(dst.to_string(), copy);
        Ok(receipt)
    }

    fn copy_if_absent(&self, src: &str, dst: &str) -> StoreResult<PutReceipt> {
        validate_key(src)?;
        validate_key(dst)?;
        let mut map = self.objects.write().expect("lock poisoned");
        if map.contains_key(dst) {
            return Err(StoreError::AlreadyExists {
                key: dst.to_string(),
            });
        }
        let source = map.get(src).ok_or_else(|| StoreError::not_found(src))?;
        let copy = self.copied(source, dst);
        let receipt = PutReceipt {
            etag: copy.head.etag.clone(),
            last_modified: copy.head.last_modified,
        };
        map.insert(dst.to_string(), copy);
        Ok(receipt)
    }

    fn delete(&self, key: &str) -> StoreResult<bool> {
        validate_key(key)?;
        let mut map = self.objects.write().expect("lock poisoned");
        Ok(map.remove(key).is_some())
    }

    fn delete_prefix(&self, prefix: &str) -> StoreResult<usize> {
        let mut map = self.objects.write().expect("lock poisoned");
        let before = map.len();
        map.retain(|k, _| !k.starts_with(prefix));
        Ok(before - map.len())
    }

    fn locator(&self, key: &str) -> String {
        format!("mem://{}/{}", self.bucket, key)
    }
}

impl std::fmt::Debug for InMemoryObjectStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryObjectStore")
            .field("bucket", &self.bucket)
            .field("object_count", &self.len())
            .finish()
    }
}
