//! Retention policy for published versions.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use vart_types::Artifact;

/// Which published versions survive a purge.
///
/// `LATEST` and the newest `keep_last_n` numbered versions are always kept.
/// An older version is purged only when it was also last updated before the
/// cutoff `now - purge_older_than`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetentionPolicy {
    pub keep_last_n: usize,
    pub purge_older_than: Duration,
}

impl RetentionPolicy {
    pub fn new(keep_last_n: usize, purge_older_than: Duration) -> Self {
        Self {
            keep_last_n,
            purge_older_than,
        }
    }

    /// Versions updated strictly before this instant are old enough to purge.
    pub fn cutoff(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now - self.purge_older_than
    }
}

impl Default for RetentionPolicy {
    fn default() -> Self {
        Self::new(10, Duration::days(90))
    }
}

/// Outcome of a retention purge.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PurgeReport {
    /// When the purge ran.
    pub purged_at: DateTime<Utc>,
    /// Versions updated before this instant were eligible.
    pub cutoff: DateTime<Utc>,
    /// Versions that were removed, newest first.
    pub purged: Vec<Artifact>,
}

/// Choose the versions a purge removes. Input order does not matter.
pub fn select_purge_candidates(
    versions: &[Artifact],
    policy: &RetentionPolicy,
    now: DateTime<Utc>,
) -> Vec<Artifact> {
    let cutoff = policy.cutoff(now);
    let mut numbered: Vec<&Artifact> = versions
        .iter()
        .filter(|a| !a.version.is_latest())
        .collect();
    numbered.sort_by_key(|a| std::cmp::Reverse(a.version.as_number()));
    numbered
        .into_iter()
        .skip(policy.keep_last_n)
        .filter(|a| a.updated_at < cutoff)
        .cloned()
        .collect()
}
