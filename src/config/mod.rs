mod io;
mod types;

pub use io::load_config;
pub use types::{ApiConfig, AppConfig, GithubConfig, StorageConfig};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("configuration file '{0}' not found; copy config.yaml.example to config.yaml and configure it")]
    NotFound(String),

    #[error("failed to read configuration file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse configuration file: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("github.organization or github.organizations must be configured")]
    NoOrganizations,

    #[error("github.organizations cannot be empty")]
    EmptyOrganizations,
}
