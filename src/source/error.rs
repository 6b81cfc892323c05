use thiserror::Error;

#[derive(Error, Debug)]
pub enum CommandError {
    #[error("failed to spawn '{command}': {source}")]
    Spawn {
        command: String,
        source: std::io::Error,
    },

    #[error("command '{command}' failed after {attempts} attempts: {stderr}")]
    Exhausted {
        command: String,
        attempts: u32,
        stderr: String,
    },

    #[error("command '{0}' not found on PATH")]
    NotInstalled(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exhausted_display() {
        let err = CommandError::Exhausted {
            command: "gh api orgs/acme/teams".to_string(),
            attempts: 4,
            stderr: "HTTP 403".to_string(),
        };
        let display = format!("{err}");
        assert!(display.contains("gh api orgs/acme/teams"));
        assert!(display.contains("4 attempts"));
        assert!(display.contains("HTTP 403"));
    }

    #[test]
    fn test_not_installed_display() {
        let err = CommandError::NotInstalled("gh".to_string());
        assert!(format!("{err}").contains("not found on PATH"));
    }
}
