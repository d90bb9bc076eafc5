use crate::error::{StoreError, StoreResult};
use crate::object::{ObjectData, ObjectHead, ObjectSummary, PutOptions, PutReceipt};

/// Key/value object storage with prefix listing and server-side copy.
///
/// All implementations must satisfy these invariants:
/// - Keys are validated with [`crate::validate_key`] before any I/O.
/// - Writes to a single key are atomic; a reader never sees a torn object.
/// - `list` returns keys in ascending byte order.
/// - The entity tag is a pure function of the payload bytes, and `copy`
///   preserves payload, metadata, tags, content type and entity tag while
///   stamping a fresh `last_modified`.
/// - A missing key is reported as [`StoreError::NotFound`].
pub trait ObjectStore: Send + Sync {
    /// Write (create or replace) an object.
    fn put(&self, key: &str, data: &[u8], options: &PutOptions) -> StoreResult<PutReceipt>;

    /// Read an object and its attributes.
    fn get(&self, key: &str) -> StoreResult<ObjectData>;

    /// Read an object's attributes without the payload.
    fn head(&self, key: &str) -> StoreResult<ObjectHead>;

    /// List objects whose key starts with `prefix`, ascending, at most
    /// `limit` entries when given.
    fn list(&self, prefix: &str, limit: Option<usize>) -> StoreResult<Vec<ObjectSummary>>;

    /// Names of the immediate sub-"directories" under `prefix`, ascending.
    fn list_dirs(&self, prefix: &str) -> StoreResult<Vec<String>>;

    /// Server-side copy, overwriting `dst`.
    fn copy(&self, src: &str, dst: &str) -> StoreResult<PutReceipt>;

    /// Server-side copy that fails with [`StoreError::AlreadyExists`] when
    /// `dst` is taken. The check and the write are one atomic step.
    fn copy_if_absent(&self, src: &str, dst: &str) -> StoreResult<PutReceipt>;

    /// Delete an object. Returns `true` if it existed.
    fn delete(&self, key: &str) -> StoreResult<bool>;

    /// Delete every object whose key starts with `prefix`. Returns the count.
    fn delete_prefix(&self, prefix: &str) -> StoreResult<usize>;

    /// A human-readable address for `key` (`mem://bucket/key`, `file:///...`).
    fn locator(&self, key: &str) -> String;

    /// Check whether an object exists.
    fn exists(&self, key: &str) -> StoreResult<bool> {
        match self.head(key) {
            Ok(_) => Ok(true),
            Err(StoreError::NotFound { .. }) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Like [`ObjectStore::head`], mapping a missing key to `None`.
    fn try_head(&self, key: &str) -> StoreResult<Option<ObjectHead>> {
        match self.head(key) {
            Ok(head) => Ok(Some(head)),
            Err(StoreError::NotFound { .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }
}
