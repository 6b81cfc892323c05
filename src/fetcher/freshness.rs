//! Cache freshness decisions.

use std::path::Path;
use std::time::{Duration, SystemTime};

/// Decides whether cached content may be reused without re-fetching.
///
/// A file is fresh when it exists and its age (now minus modification time)
/// is strictly below the threshold. Force-refresh mode overrides everything.
/// No side effects.
#[derive(Debug, Clone, Copy)]
pub struct FreshnessOracle {
    force_refresh: bool,
    default_max_age: Duration,
}

/// Default cache duration: 24 hours.
pub const DEFAULT_CACHE_HOURS: u64 = 24;

impl Default for FreshnessOracle {
    fn default() -> Self {
        Self::new(false, Duration::from_secs(DEFAULT_CACHE_HOURS * 3600))
    }
}

impl FreshnessOracle {
    #[must_use]
    pub fn new(force_refresh: bool, default_max_age: Duration) -> Self {
        Self {
            force_refresh,
            default_max_age,
        }
    }

    #[must_use]
    pub fn force_refresh(&self) -> bool {
        self.force_refresh
    }

    /// Freshness against the instance-wide default age.
    #[must_use]
    pub fn is_fresh(&self, path: &Path) -> bool {
        self.is_fresh_within(path, self.default_max_age)
    }

    /// Freshness against an explicit age threshold.
    #[must_use]
    pub fn is_fresh_within(&self, path: &Path, max_age: Duration) -> bool {
        if self.force_refresh {
            return false;
        }

        let Ok(metadata) = std::fs::metadata(path) else {
            return false;
        };
        let Ok(mtime) = metadata.modified() else {
            return false;
        };
        match SystemTime::now().duration_since(mtime) {
            Ok(age) => age < max_age,
            // mtime in the future: treat as just written
            Err(_) => true,
        }
    }
}
