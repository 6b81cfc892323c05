use super::types::AppConfig;
use super::ConfigError;
use std::path::Path;
use tokio::fs;

/// Load and normalize the configuration file.
///
/// The legacy `github.organization` key is folded into `github.organizations`
/// when the list is absent; an explicitly empty list is rejected so a typo
/// never silently produces a no-op run.
pub async fn load_config(path: &Path) -> Result<AppConfig, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::NotFound(path.display().to_string()));
    }

    let content = fs::read_to_string(path).await?;
    let mut config: AppConfig = serde_yaml::from_str(&content)?;
    normalize_organizations(&mut config)?;
    Ok(config)
}

fn normalize_organizations(config: &mut AppConfig) -> Result<(), ConfigError> {
    let single = config.github.organization.take();

    if config.github.organizations.is_empty() {
        match single {
            Some(org) => config.github.organizations = vec![org],
            None => return Err(ConfigError::NoOrganizations),
        }
    } else if config.github.organizations.iter().all(String::is_empty) {
        return Err(ConfigError::EmptyOrganizations);
    }

    Ok(())
}
