use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// The sentinel token for the mutable "most recent upload" slot.
pub const LATEST: &str = "LATEST";

/// Width of the zero-padded decimal rendering of a numbered version.
pub const VERSION_WIDTH: usize = 6;

/// Largest version number that fits in [`VERSION_WIDTH`] digits.
pub const MAX_VERSION: u32 = 10u32.pow(VERSION_WIDTH as u32) - 1;

/// A logical artifact version.
///
/// `Latest` is the mutable pointer to the most recently uploaded payload.
/// `Number(n)` is an immutable snapshot created by publishing `Latest`;
/// numbers start at 1, increase monotonically per artifact, and are never
/// reused, even after the version is deleted.
///
/// Serializes as its canonical string form (`"LATEST"`, `"7"`).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Version {
    #[default]
    Latest,
    Number(u32),
}

impl Version {
    /// The first published version.
    pub const FIRST: Self = Self::Number(1);

    /// Create a numbered version, rejecting zero and values wider than
    /// [`VERSION_WIDTH`] digits.
    pub fn number(n: u32) -> Result<Self, TypeError> {
        if n == 0 {
            return Err(TypeError::InvalidVersion {
                input: "0".into(),
                reason: "numbered versions start at 1".into(),
            });
        }
        if n > MAX_VERSION {
            return Err(TypeError::VersionOverflow(u64::from(n)));
        }
        Ok(Self::Number(n))
    }

    /// Parse a caller-supplied version: `LATEST`, a plain number (`"7"`), or
    /// an already padded number (`"000007"`).
    pub fn parse(input: &str) -> Result<Self, TypeError> {
        if input == LATEST {
            return Ok(Self::Latest);
        }
        if input.is_empty() || !input.bytes().all(|b| b.is_ascii_digit()) {
            return Err(TypeError::InvalidVersion {
                input: input.to_string(),
                reason: format!("expected {LATEST:?} or a decimal number"),
            });
        }
        let n: u64 = input.parse().map_err(|_| TypeError::VersionOverflow(u64::MAX))?;
        let n = u32::try_from(n).map_err(|_| TypeError::VersionOverflow(n))?;
        Self::number(n).map_err(|e| match e {
            TypeError::InvalidVersion { reason, .. } => TypeError::InvalidVersion {
                input: input.to_string(),
                reason,
            },
            other => other,
        })
    }

    /// Re-check a value built directly from the `Number` variant.
    ///
    /// [`Version::number`] and [`Version::parse`] already enforce the range;
    /// repository entry points call this on every version they are handed.
    pub fn validated(self) -> Result<Self, TypeError> {
        match self {
            Self::Latest => Ok(self),
            Self::Number(n) => Self::number(n),
        }
    }

    /// Returns `true` for the `LATEST` sentinel.
    pub fn is_latest(&self) -> bool {
        matches!(self, Self::Latest)
    }

    /// The version number, or `None` for `LATEST`.
    pub fn as_number(&self) -> Option<u32> {
        match self {
            Self::Latest => None,
            Self::Number(n) => Some(*n),
        }
    }

    /// The version that follows this one when publishing.
    ///
    /// `Latest` has no successor of its own; publishing over an artifact with
    /// no numbered versions yields [`Version::FIRST`] instead.
    pub fn successor(&self) -> Result<Self, TypeError> {
        match self {
            Self::Latest => Ok(Self::FIRST),
            Self::Number(n) => {
                let next = u64::from(*n) + 1;
                if next > u64::from(MAX_VERSION) {
                    return Err(TypeError::VersionOverflow(next));
                }
                Ok(Self::Number(next as u32))
            }
        }
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Latest => f.write_str(LATEST),
            Self::Number(n) => write!(f, "{n}"),
        }
    }
}

impl FromStr for Version {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<u32> for Version {
    type Error = TypeError;

    fn try_from(n: u32) -> Result<Self, Self::Error> {
        Self::number(n)
    }
}

impl TryFrom<String> for Version {
    type Error = TypeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<Version> for String {
    fn from(v: Version) -> Self {
        v.to_string()
    }
}
