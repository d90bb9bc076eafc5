//! Order-preserving codec between logical versions and storage keys.
//!
//! Three encodings live here, one per place a version ends up in storage:
//!
//! - **Sort keys** ([`encode_version`]): `LATEST` stays `LATEST`, numbers are
//!   zero-padded to [`VERSION_WIDTH`] digits. For `a < b`, the encoding of `a`
//!   sorts before the encoding of `b`, and every padded number sorts before
//!   `LATEST` (`'0'..'9'` < `'L'`), so a descending index query returns
//!   `LATEST` first and then versions newest-first.
//! - **Filenames** ([`encode_filename`]): object listings are ascending only,
//!   so the filename leads with the complement `10^W - n`. `LATEST` maps to
//!   complement zero and always lists first; higher versions list earlier.
//! - **Alias partition keys** ([`encode_alias_key`]): `__{name}-alias`, so
//!   alias rows never share a partition with the artifact's version rows.
//!
//! ```
//! use vart_types::{codec, Version};
//!
//! assert_eq!(codec::encode_version(Some(Version::Number(2))), "000002");
//! assert_eq!(codec::encode_filename(Some(Version::Number(2))), "999998_000002");
//! assert_eq!(codec::encode_filename(None), "000000_LATEST");
//! assert_eq!(codec::encode_alias_key("my-app"), "__my-app-alias");
//! ```

use crate::error::TypeError;
use crate::version::{Version, LATEST, VERSION_WIDTH};

/// Leading marker of an alias partition key.
pub const ALIAS_KEY_PREFIX: &str = "__";

/// Trailing marker of an alias partition key.
pub const ALIAS_KEY_SUFFIX: &str = "-alias";

/// Separator between the complement and the literal version in a filename.
const FILENAME_SEPARATOR: char = '_';

/// `10^W`, the base of the filename complement.
const COMPLEMENT_BASE: u32 = 10u32.pow(VERSION_WIDTH as u32);

/// Encode a version as an index sort key. `None` means `LATEST`.
pub fn encode_version(version: Option<Version>) -> String {
    match version.unwrap_or_default() {
        Version::Latest => LATEST.to_string(),
        Version::Number(n) => format!("{n:0width$}", width = VERSION_WIDTH),
    }
}

/// Inverse of [`encode_version`] at the string level.
///
/// Leading zeros are stripped, so the all-zero key `"000000"` decodes to the
/// empty string. Zero is never a valid version; use [`Version::parse`] when a
/// typed value is needed.
pub fn decode_version(key: &str) -> String {
    if key == LATEST {
        return LATEST.to_string();
    }
    key.trim_start_matches('0').to_string()
}

/// Encode a version as an object filename that lists newest-first.
///
/// ```text
/// LATEST -> 000000_LATEST
/// 999999 -> 000001_999999
/// 2      -> 999998_000002
/// 1      -> 999999_000001
/// ```
///
/// Numbers outside `1..=MAX_VERSION` yield a key that [`decode_filename`]
/// rejects; callers validate versions first.
pub fn encode_filename(version: Option<Version>) -> String {
    match version.unwrap_or_default() {
        Version::Latest => format!(
            "{zeros}{FILENAME_SEPARATOR}{LATEST}",
            zeros = "0".repeat(VERSION_WIDTH)
        ),
        Version::Number(n) => format!(
            "{complement:0width$}{FILENAME_SEPARATOR}{n:0width$}",
            complement = COMPLEMENT_BASE.saturating_sub(n),
            width = VERSION_WIDTH
        ),
    }
}

/// Inverse of [`encode_filename`]. The filename must not carry a suffix.
///
/// Both halves are checked against each other, so a hand-written or
/// truncated key is rejected instead of silently mis-sorting.
pub fn decode_filename(filename: &str) -> Result<Version, TypeError> {
    let invalid = |reason: &str| TypeError::InvalidKey {
        key: filename.to_string(),
        reason: reason.to_string(),
    };

    let (complement, literal) = filename
        .split_once(FILENAME_SEPARATOR)
        .ok_or_else(|| invalid("missing '_' separator"))?;
    if complement.len() != VERSION_WIDTH || !complement.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid("complement must be a zero-padded number"));
    }

    if literal == LATEST {
        if complement.bytes().all(|b| b == b'0') {
            return Ok(Version::Latest);
        }
        return Err(invalid("LATEST must carry a zero complement"));
    }

    if literal.len() != VERSION_WIDTH {
        return Err(invalid("version must be zero-padded"));
    }
    let version = Version::parse(literal)?;
    let expected = encode_filename(Some(version));
    if expected != filename {
        return Err(invalid("complement does not match version"));
    }
    Ok(version)
}

/// Encode the partition key under which an artifact's aliases are stored.
pub fn encode_alias_key(name: &str) -> String {
    format!("{ALIAS_KEY_PREFIX}{name}{ALIAS_KEY_SUFFIX}")
}

/// Recover the artifact name from an alias partition key.
///
/// Strips the fixed markers rather than splitting on `-`, so names that
/// contain hyphens survive the round trip. Artifact names may not start
/// with [`ALIAS_KEY_PREFIX`] (see [`crate::validate_artifact_name`]), which
/// keeps alias keys and artifact names from colliding.
pub fn decode_alias_key(key: &str) -> Result<String, TypeError> {
    key.strip_prefix(ALIAS_KEY_PREFIX)
        .and_then(|rest| rest.strip_suffix(ALIAS_KEY_SUFFIX))
        .map(str::to_string)
        .ok_or_else(|| TypeError::InvalidKey {
            key: key.to_string(),
            reason: format!("alias keys look like {ALIAS_KEY_PREFIX}<name>{ALIAS_KEY_SUFFIX}"),
        })
}
