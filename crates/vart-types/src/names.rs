//! Artifact and alias name validation.
//!
//! Valid artifact names:
//! - Must be non-empty and must not be `.` or `..`
//! - Must not contain whitespace, `/` or `\`
//! - Must not start with `__` (reserved for alias partition keys)
//! - Must not be the `LATEST` token
//!
//! Valid alias names:
//! - Must start with an ASCII letter
//! - Must not contain `-`, whitespace, `/` or `\`
//! - Must not be the `LATEST` token

use crate::codec::ALIAS_KEY_PREFIX;
use crate::error::TypeError;
use crate::version::LATEST;

/// Characters that are forbidden anywhere in an artifact or alias name.
const FORBIDDEN_CHARS: &[char] = &[' ', '\t', '\n', '\r', '/', '\\'];

/// Validate an artifact name, returning `Ok(())` if valid.
///
/// Artifact names become a storage path segment and an index partition key,
/// so they must be a single path component that cannot be confused with an
/// alias partition key.
///
/// # Examples
///
/// ```
/// use vart_types::validate_artifact_name;
///
/// assert!(validate_artifact_name("my-app").is_ok());
/// assert!(validate_artifact_name("").is_err());
/// assert!(validate_artifact_name("__my-app-alias").is_err());
/// ```
pub fn validate_artifact_name(name: &str) -> Result<(), TypeError> {
    let reject = |reason: String| -> Result<(), TypeError> {
        Err(TypeError::InvalidArtifactName {
            name: name.to_string(),
            reason,
        })
    };

    if name.is_empty() {
        return reject("artifact name must not be empty".into());
    }
    if name == "." || name == ".." {
        return reject("artifact name must not be a relative path".into());
    }
    if name == LATEST {
        return reject(format!("{LATEST:?} is reserved"));
    }
    if name.starts_with(ALIAS_KEY_PREFIX) {
        return reject(format!("must not start with {ALIAS_KEY_PREFIX:?}"));
    }
    if let Some(ch) = name.chars().find(|c| FORBIDDEN_CHARS.contains(c) || c.is_control()) {
        return reject(format!("contains forbidden character: {ch:?}"));
    }
    Ok(())
}

/// Validate an alias name, returning `Ok(())` if valid.
///
/// # Examples
///
/// ```
/// use vart_types::validate_alias_name;
///
/// assert!(validate_alias_name("prod").is_ok());
/// assert!(validate_alias_name("blue_green").is_ok());
/// assert!(validate_alias_name("my-alias").is_err());
/// assert!(validate_alias_name("LATEST").is_err());
/// ```
pub fn validate_alias_name(alias: &str) -> Result<(), TypeError> {
    let reject = |reason: String| -> Result<(), TypeError> {
        Err(TypeError::InvalidAliasName {
            alias: alias.to_string(),
            reason,
        })
    };

    if alias == LATEST {
        return reject(format!("alias name cannot be {LATEST:?}"));
    }
    if alias.contains('-') {
        return reject("alias name cannot contain '-'".into());
    }
    match alias.chars().next() {
        Some(first) if first.is_ascii_alphabetic() => {}
        _ => return reject("alias name must start with a letter".into()),
    }
    if let Some(ch) = alias.chars().find(|c| FORBIDDEN_CHARS.contains(c) || c.is_control()) {
        return reject(format!("contains forbidden character: {ch:?}"));
    }
    Ok(())
}
