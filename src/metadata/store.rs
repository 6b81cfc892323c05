//! Metadata for incremental updates.
//!
//! Three independent YAML key-value files under `<org>/metadata/` hold last
//! update timestamps, content checksums, and per-day API usage counters.
//! Each file is loaded lazily and written back in full on every mutation.
//! Single-process, single-writer assumption; no locking.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, warn};

use super::MetadataError;
use crate::utils::{compute_hash, now_iso, today_key};

const UPDATE_FILE: &str = "last_update.yaml";
const CHECKSUM_FILE: &str = "checksums.yaml";
const API_USAGE_FILE: &str = "api_usage.yaml";

/// Truncated digest length stored for each resource type.
const CHECKSUM_LEN: usize = 16;

/// Calculate a content checksum for structured data.
///
/// `serde_json::Value` objects serialize with sorted keys (the default map
/// backing), so structurally equal data yields equal digests regardless of
/// key insertion order. The SHA-256 digest is truncated to 16 hex chars.
#[must_use]
pub fn calculate_checksum(data: &serde_json::Value) -> String {
    let canonical = data.to_string();
    let mut digest = compute_hash(&canonical);
    digest.truncate(CHECKSUM_LEN);
    digest
}

/// API usage counters: `daily_usage.<date>.<endpoint>` plus last call time.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApiUsage {
    #[serde(default)]
    pub daily_usage: BTreeMap<String, BTreeMap<String, u64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_call: Option<String>,
}

/// Summary of metadata and cache state, for diagnostics.
#[derive(Debug, Clone, Serialize)]
pub struct MetadataStatus {
    pub last_updates: BTreeMap<String, String>,
    pub checksums: BTreeMap<String, String>,
    pub cache_files: usize,
    pub cache_size_kb: u64,
    pub today_total_calls: u64,
    pub today_by_endpoint: BTreeMap<String, u64>,
}

/// Per-organization metadata store.
pub struct MetadataStore {
    metadata_dir: PathBuf,
    cache_dir: PathBuf,
}

impl MetadataStore {
    /// Open (and create on demand) the metadata store under an org data root.
    pub async fn open(base_dir: &Path) -> Result<Self, MetadataError> {
        let metadata_dir = base_dir.join("metadata");
        let cache_dir = base_dir.join("cache");
        fs::create_dir_all(&metadata_dir).await?;
        fs::create_dir_all(&cache_dir).await?;
        Ok(Self {
            metadata_dir,
            cache_dir,
        })
    }

    fn update_path(&self) -> PathBuf {
        self.metadata_dir.join(UPDATE_FILE)
    }

    fn checksum_path(&self) -> PathBuf {
        self.metadata_dir.join(CHECKSUM_FILE)
    }

    fn api_usage_path(&self) -> PathBuf {
        self.metadata_dir.join(API_USAGE_FILE)
    }

    /// Load a YAML file into `T`, falling back to the default on a missing
    /// or unreadable file. Corrupt metadata is recoverable state, not fatal.
    async fn load_yaml<T>(&self, path: &Path) -> T
    where
        T: for<'de> Deserialize<'de> + Default,
    {
        if !path.exists() {
            return T::default();
        }
        match fs::read_to_string(path).await {
            Ok(content) => match serde_yaml::from_str(&content) {
                Ok(value) => value,
                Err(e) => {
                    warn!("Could not parse {}: {e}", path.display());
                    T::default()
                }
            },
            Err(e) => {
                warn!("Could not read {}: {e}", path.display());
                T::default()
            }
        }
    }

    async fn save_yaml<T: Serialize>(&self, path: &Path, data: &T) -> Result<(), MetadataError> {
        let content = serde_yaml::to_string(data)?;
        fs::write(path, content).await?;
        Ok(())
    }

    /// Set the last-update timestamp for a resource type to now.
    pub async fn update_timestamp(&self, resource_type: &str) -> Result<(), MetadataError> {
        let mut data: BTreeMap<String, String> = self.load_yaml(&self.update_path()).await;
        data.insert(resource_type.to_string(), now_iso());
        self.save_yaml(&self.update_path(), &data).await
    }

    /// Get the last-update timestamp for a resource type, if recorded.
    pub async fn get_last_update(&self, resource_type: &str) -> Option<DateTime<Utc>> {
        let data: BTreeMap<String, String> = self.load_yaml(&self.update_path()).await;
        let raw = data.get(resource_type)?;
        DateTime::parse_from_rfc3339(raw)
            .ok()
            .map(|t| t.with_timezone(&Utc))
    }

    /// Whether a resource type is due for an update given an age threshold.
    /// An unrecorded resource always needs an update.
    pub async fn needs_update(&self, resource_type: &str, threshold: Duration) -> bool {
        match self.get_last_update(resource_type).await {
            Some(last) => Utc::now() - last > threshold,
            None => true,
        }
    }

    /// Record the current checksum for a resource type.
    pub async fn update_checksum(
        &self,
        resource_type: &str,
        data: &serde_json::Value,
    ) -> Result<(), MetadataError> {
        let mut stored: BTreeMap<String, String> = self.load_yaml(&self.checksum_path()).await;
        stored.insert(resource_type.to_string(), calculate_checksum(data));
        self.save_yaml(&self.checksum_path(), &stored).await
    }

    pub async fn get_checksum(&self, resource_type: &str) -> Option<String> {
        let stored: BTreeMap<String, String> = self.load_yaml(&self.checksum_path()).await;
        stored.get(resource_type).cloned()
    }

    /// True when no prior checksum exists or it differs from the data's.
    pub async fn has_checksum_changed(
        &self,
        resource_type: &str,
        data: &serde_json::Value,
    ) -> bool {
        match self.get_checksum(resource_type).await {
            Some(stored) => stored != calculate_checksum(data),
            None => true,
        }
    }

    /// Increment the per-day, per-endpoint call counter and stamp last call.
    pub async fn track_api_call(&self, endpoint: &str) -> Result<(), MetadataError> {
        let mut usage: ApiUsage = self.load_yaml(&self.api_usage_path()).await;
        let today = today_key();
        *usage
            .daily_usage
            .entry(today)
            .or_default()
            .entry(endpoint.to_string())
            .or_insert(0) += 1;
        usage.last_call = Some(now_iso());
        self.save_yaml(&self.api_usage_path(), &usage).await
    }

    /// Per-endpoint call counts for a date (today when `None`).
    pub async fn get_daily_api_usage(&self, date: Option<&str>) -> BTreeMap<String, u64> {
        let usage: ApiUsage = self.load_yaml(&self.api_usage_path()).await;
        let key = date.map_or_else(today_key, str::to_string);
        usage.daily_usage.get(&key).cloned().unwrap_or_default()
    }

    pub async fn get_total_daily_calls(&self, date: Option<&str>) -> u64 {
        self.get_daily_api_usage(date).await.values().sum()
    }

    /// Remove cached artifact files older than the threshold.
    /// Returns the number of files removed; per-file failures are logged.
    pub async fn cleanup_old_cache(&self, max_age_days: u64) -> usize {
        let cutoff = std::time::SystemTime::now()
            - std::time::Duration::from_secs(max_age_days * 24 * 3600);

        let mut removed = 0;
        for entry in walkdir::WalkDir::new(&self.cache_dir)
            .into_iter()
            .filter_map(Result::ok)
            .filter(|e| e.file_type().is_file())
        {
            let stale = entry
                .metadata()
                .ok()
                .and_then(|m| m.modified().ok())
                .is_some_and(|mtime| mtime < cutoff);
            if !stale {
                continue;
            }
            match fs::remove_file(entry.path()).await {
                Ok(()) => {
                    debug!("Removed old cache file: {}", entry.path().display());
                    removed += 1;
                }
                Err(e) => warn!("Could not remove cache file {}: {e}", entry.path().display()),
            }
        }
        removed
    }

    /// Summarize metadata and cache state.
    pub async fn status_report(&self) -> MetadataStatus {
        let last_updates: BTreeMap<String, String> = self.load_yaml(&self.update_path()).await;
        let checksums: BTreeMap<String, String> = self.load_yaml(&self.checksum_path()).await;

        let mut cache_files = 0;
        let mut cache_size = 0;
        for entry in walkdir::WalkDir::new(&self.cache_dir)
            .into_iter()
            .filter_map(Result::ok)
            .filter(|e| e.file_type().is_file())
        {
            cache_files += 1;
            cache_size += entry.metadata().map(|m| m.len()).unwrap_or(0);
        }

        let today_by_endpoint = self.get_daily_api_usage(None).await;
        let today_total_calls = today_by_endpoint.values().sum();

        MetadataStatus {
            last_updates,
            checksums,
            cache_files,
            cache_size_kb: cache_size / 1024,
            today_total_calls,
            today_by_endpoint,
        }
    }

    #[must_use]
    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }
}
