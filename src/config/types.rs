use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

fn default_command() -> String {
    "gh".to_string()
}

/// Default number of retry attempts after a failed remote call.
fn default_max_retries() -> u32 {
    3
}

fn default_storage_root() -> PathBuf {
    PathBuf::from("storage").join("cache")
}

/// GitHub section of the configuration file.
///
/// `organization` is the legacy single-org form; `organizations` wins when
/// both are present. Normalization happens at load time so the rest of the
/// code only ever sees the `organizations` list.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GithubConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub organization: Option<String>,
    #[serde(default)]
    pub organizations: Vec<String>,
}

/// API section: which external command to invoke and how often to retry it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_command")]
    pub command: String,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            command: default_command(),
            max_retries: default_max_retries(),
        }
    }
}

/// Storage section: where per-organization cache trees are rooted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_storage_root")]
    pub root: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            root: default_storage_root(),
        }
    }
}

/// Application configuration, constructed once at process start and passed
/// by reference into the fetch controller. No ambient global state.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub github: GithubConfig,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub storage: StorageConfig,
}

impl AppConfig {
    /// All configured organization names, post-normalization.
    #[must_use]
    pub fn organizations(&self) -> &[String] {
        &self.github.organizations
    }

    /// First configured organization (single-org compatibility accessor).
    #[must_use]
    pub fn first_organization(&self) -> Option<&str> {
        self.github.organizations.first().map(String::as_str)
    }

    /// Per-organization data root: `<storage.root>/<org>`.
    #[must_use]
    pub fn org_data_dir(&self, organization: &str) -> PathBuf {
        self.storage.root.join(organization)
    }

    #[must_use]
    pub fn storage_root(&self) -> &Path {
        &self.storage.root
    }
}
