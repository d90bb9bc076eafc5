use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::TypeError;
use crate::version::Version;

/// Upper bound (exclusive) of a secondary version weight, in percent.
pub const WEIGHT_SCALE: u32 = 100;

/// One version of an artifact as returned to callers.
///
/// This is a public-facing snapshot, not the stored representation: each
/// backend reassembles it from object metadata or index rows.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artifact {
    /// Artifact name.
    pub name: String,
    /// `LATEST` or the published version number.
    pub version: Version,
    /// When this version's payload was last written.
    pub updated_at: DateTime<Utc>,
    /// Address of the payload in object storage.
    pub locator: String,
    /// Hex digest of the payload under the repository's hash algorithm.
    pub content_hash: String,
}

/// The versions an alias should point at, as supplied to `put_alias`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AliasTarget {
    pub version: Version,
    pub secondary_version: Option<Version>,
    pub secondary_version_weight: Option<u32>,
}

impl AliasTarget {
    /// Point at a single version.
    pub fn new(version: Version) -> Self {
        Self {
            version,
            secondary_version: None,
            secondary_version_weight: None,
        }
    }

    /// Point at `LATEST`.
    pub fn latest() -> Self {
        Self::default()
    }

    /// Route `weight` percent of selections to `version`.
    pub fn with_secondary(mut self, version: Version, weight: u32) -> Self {
        self.secondary_version = Some(version);
        self.secondary_version_weight = Some(weight);
        self
    }

    /// Check the traffic-split parameters.
    ///
    /// Both versions must be in range, a secondary version needs a weight
    /// in `0..100`, a weight needs a secondary version, and the two versions
    /// must differ.
    pub fn validate(&self) -> Result<(), TypeError> {
        self.version.validated()?;
        if let Some(secondary) = self.secondary_version {
            secondary.validated()?;
        }
        match (self.secondary_version, self.secondary_version_weight) {
            (None, None) => Ok(()),
            (None, Some(_)) => Err(TypeError::UnexpectedWeight),
            (Some(_), None) => Err(TypeError::MissingWeight),
            (Some(secondary), Some(weight)) => {
                if weight >= WEIGHT_SCALE {
                    return Err(TypeError::InvalidWeight(weight));
                }
                if secondary == self.version {
                    return Err(TypeError::DuplicateVersion(secondary.to_string()));
                }
                Ok(())
            }
        }
    }
}

/// A named pointer to one or two versions of an artifact.
///
/// When a secondary version is set, [`Alias::random_artifact`] routes
/// `secondary_version_weight` percent of calls to it and the rest to the
/// primary. Each call draws independently.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alias {
    pub name: String,
    pub alias: String,
    pub updated_at: DateTime<Utc>,
    pub version: Version,
    pub secondary_version: Option<Version>,
    pub secondary_version_weight: Option<u32>,
    pub version_locator: String,
    pub secondary_version_locator: Option<String>,
}

impl Alias {
    /// The target this alias was written with.
    pub fn target(&self) -> AliasTarget {
        AliasTarget {
            version: self.version,
            secondary_version: self.secondary_version,
            secondary_version_weight: self.secondary_version_weight,
        }
    }

    /// Percentage of selections that go to the primary version.
    pub fn primary_weight(&self) -> u32 {
        match (&self.secondary_version_locator, self.secondary_version_weight) {
            (Some(_), Some(w)) => WEIGHT_SCALE.saturating_sub(w),
            _ => WEIGHT_SCALE,
        }
    }

    /// Pick a locator using the thread-local RNG.
    pub fn random_artifact(&self) -> &str {
        self.random_version_with(&mut rand::thread_rng()).1
    }

    /// Pick a version using the thread-local RNG.
    pub fn random_version(&self) -> Version {
        self.random_version_with(&mut rand::thread_rng()).0
    }

    /// Pick a version and its locator: draw `r` uniformly from `1..=100` and
    /// take the primary when `r <= 100 - secondary_version_weight`.
    pub fn random_version_with<R: Rng>(&self, rng: &mut R) -> (Version, &str) {
        let roll: u32 = rng.gen_range(1..=WEIGHT_SCALE);
        match (&self.secondary_version, &self.secondary_version_locator) {
            (Some(secondary), Some(locator)) if roll > self.primary_weight() => {
                (*secondary, locator.as_str())
            }
            _ => (self.version, self.version_locator.as_str()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn split_alias(weight: u32) -> Alias {
        Alias {
            name: "app".into(),
            alias: "prod".into(),
            updated_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            version: Version::Number(1),
            secondary_version: Some(Version::Number(2)),
            secondary_version_weight: Some(weight),
            version_locator: "mem://bucket/app/v1".into(),
            secondary_version_locator: Some("mem://bucket/app/v2".into()),
        }
    }

    // -----------------------------------------------------------------------
    // AliasTarget validation
    // -----------------------------------------------------------------------

    #[test]
    fn single_version_target_is_valid() {
        assert!(AliasTarget::latest().validate().is_ok());
        assert!(AliasTarget::new(Version::Number(3)).validate().is_ok());
    }

    #[test]
    fn split_target_is_valid() {
        let target = AliasTarget::new(Version::Number(1)).with_secondary(Version::Number(2), 20);
        assert!(target.validate().is_ok());
        let zero = AliasTarget::new(Version::Number(1)).with_secondary(Version::Number(2), 0);
        assert!(zero.validate().is_ok());
    }

    #[test]
    fn weight_out_of_range_rejected() {
        let target = AliasTarget::new(Version::Number(1)).with_secondary(Version::Number(2), 100);
        assert_eq!(target.validate(), Err(TypeError::InvalidWeight(100)));
    }

    #[test]
    fn duplicate_versions_rejected() {
        let target = AliasTarget::new(Version::Number(2)).with_secondary(Version::Number(2), 10);
        assert!(matches!(
            target.validate(),
            Err(TypeError::DuplicateVersion(_))
        ));
        let latest = AliasTarget::latest().with_secondary(Version::Latest, 10);
        assert!(latest.validate().is_err());
    }

    #[test]
    fn out_of_range_versions_rejected() {
        let primary = AliasTarget::new(Version::Number(2_000_000));
        assert_eq!(primary.validate(), Err(TypeError::VersionOverflow(2_000_000)));
        let secondary = AliasTarget::latest().with_secondary(Version::Number(0), 10);
        assert!(matches!(
            secondary.validate(),
            Err(TypeError::InvalidVersion { .. })
        ));
    }

    #[test]
    fn weight_and_secondary_must_come_together() {
        let missing = AliasTarget {
            version: Version::Number(1),
            secondary_version: Some(Version::Number(2)),
            secondary_version_weight: None,
        };
        assert_eq!(missing.validate(), Err(TypeError::MissingWeight));

        let orphan = AliasTarget {
            version: Version::Number(1),
            secondary_version: None,
            secondary_version_weight: Some(20),
        };
        assert_eq!(orphan.validate(), Err(TypeError::UnexpectedWeight));
    }

    // -----------------------------------------------------------------------
    // Traffic splitting
    // -----------------------------------------------------------------------

    #[test]
    fn no_secondary_always_returns_primary() {
        let mut alias = split_alias(0);
        alias.secondary_version = None;
        alias.secondary_version_weight = None;
        alias.secondary_version_locator = None;
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..200 {
            assert_eq!(alias.random_version_with(&mut rng).1, "mem://bucket/app/v1");
        }
        assert_eq!(alias.primary_weight(), 100);
    }

    #[test]
    fn zero_weight_never_selects_secondary() {
        let alias = split_alias(0);
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..500 {
            assert_eq!(alias.random_version_with(&mut rng).1, alias.version_locator);
        }
    }

    #[test]
    fn weighted_split_is_close_to_requested() {
        let alias = split_alias(20);
        let mut rng = StdRng::seed_from_u64(42);
        let n = 10_000;
        let secondary = (0..n)
            .filter(|_| alias.random_version_with(&mut rng).1 == "mem://bucket/app/v2")
            .count();
        let share = secondary as f64 / n as f64;
        assert!((0.17..=0.23).contains(&share), "secondary share was {share}");
    }

    #[test]
    fn random_version_reports_choice() {
        let alias = split_alias(99);
        let mut rng = StdRng::seed_from_u64(3);
        let picks: Vec<Version> = (0..50)
            .map(|_| alias.random_version_with(&mut rng).0)
            .collect();
        assert!(picks.contains(&Version::Number(2)));
        assert_eq!(alias.target().secondary_version_weight, Some(99));
    }

    // -----------------------------------------------------------------------
    // Serialization
    // -----------------------------------------------------------------------

    #[test]
    fn alias_document_field_names() {
        let json = serde_json::to_value(split_alias(20)).unwrap();
        let obj = json.as_object().unwrap();
        for field in [
            "name",
            "alias",
            "updated_at",
            "version",
            "secondary_version",
            "secondary_version_weight",
            "version_locator",
            "secondary_version_locator",
        ] {
            assert!(obj.contains_key(field), "missing {field}");
        }
        assert_eq!(obj["version"], "1");
        let back: Alias = serde_json::from_value(json).unwrap();
        assert_eq!(back, split_alias(20));
    }
}
