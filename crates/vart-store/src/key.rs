//! Object key helpers.
//!
//! Keys are relative, `/`-separated paths. The filesystem backend maps them
//! straight onto directories, so empty, `.` and `..` segments are refused
//! everywhere to keep both backends in agreement.

use crate::error::{StoreError, StoreResult};

/// Validate an object key.
pub fn validate_key(key: &str) -> StoreResult<()> {
    let invalid = |reason: &str| StoreError::InvalidKey {
        key: key.to_string(),
        reason: reason.to_string(),
    };

    if key.is_empty() {
        return Err(invalid("key must not be empty"));
    }
    if key.starts_with('/') || key.ends_with('/') {
        return Err(invalid("key must not start or end with '/'"));
    }
    for segment in key.split('/') {
        match segment {
            "" => return Err(invalid("key contains an empty segment")),
            "." | ".." => return Err(invalid("key contains a relative segment")),
            _ => {}
        }
    }
    if key.contains('\\') || key.chars().any(char::is_control) {
        return Err(invalid("key contains a forbidden character"));
    }
    Ok(())
}

/// Join key segments with `/`, skipping empty ones.
pub fn join_key<I, S>(parts: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    parts
        .into_iter()
        .map(|p| p.as_ref().trim_matches('/').to_string())
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join("/")
}
