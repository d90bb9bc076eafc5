use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Optional attributes attached to an object on upload.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PutOptions {
    /// MIME type recorded with the object.
    pub content_type: Option<String>,
    /// User metadata; returned by `head`.
    pub metadata: BTreeMap<String, String>,
    /// Object tags; returned by `head`.
    pub tags: BTreeMap<String, String>,
}

impl PutOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }
}

/// What the store reports after a successful write.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PutReceipt {
    pub etag: String,
    pub last_modified: DateTime<Utc>,
}

/// Object attributes without the payload.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectHead {
    pub key: String,
    pub size: u64,
    pub etag: String,
    pub last_modified: DateTime<Utc>,
    pub content_type: Option<String>,
    pub metadata: BTreeMap<String, String>,
    pub tags: BTreeMap<String, String>,
}

/// A full object read.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ObjectData {
    pub head: ObjectHead,
    pub bytes: Vec<u8>,
}

/// One entry of a listing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ObjectSummary {
    pub key: String,
    pub size: u64,
    pub etag: String,
    pub last_modified: DateTime<Utc>,
}

impl From<&ObjectHead> for ObjectSummary {
    fn from(head: &ObjectHead) -> Self {
        Self {
            key: head.key.clone(),
            size: head.size,
            etag: head.etag.clone(),
            last_modified: head.last_modified,
        }
    }
}

/// Entity tag of a payload. Depends only on the bytes.
pub(crate) fn compute_etag(data: &[u8]) -> String {
    blake3::hash(data).to_hex().to_string()
}

/// The immediate child "directory" of `key` under `prefix`, if any.
///
/// `prefix` is treated as a directory: `a/b` and `a/b/` both list children
/// of `a/b`. An empty prefix lists top-level directories.
pub(crate) fn child_dir<'a>(prefix: &str, key: &'a str) -> Option<&'a str> {
    let rest = if prefix.is_empty() {
        key
    } else {
        let dir = prefix.trim_end_matches('/');
        key.strip_prefix(dir)?.strip_prefix('/')?
    };
    let (child, _) = rest.split_once('/')?;
    Some(child)
}
