//! Atomic file write operations.
//!
//! Derived artifacts (role CSVs, name lists) are written through a temp file
//! in the target's directory and renamed into place, so a reader never sees
//! a partially written canonical file. Temp files are cleaned up on failure.

use std::io;
use std::path::Path;
use tempfile::NamedTempFile;

/// Write content to a file atomically using a temporary file.
///
/// The temp file is created in the same directory as the target (required
/// for an atomic rename), fully written and flushed, then persisted over the
/// canonical path. If any step fails the canonical file is left untouched.
///
/// # Errors
///
/// Returns an `io::Error` if:
/// - The parent directory cannot be determined
/// - The temp file cannot be created
/// - Writing to the temp file fails
/// - The atomic rename fails
pub async fn atomic_write(path: &Path, content: &str) -> io::Result<()> {
    let parent = path
        .parent()
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "Path has no parent directory"))?
        .to_path_buf();
    let target_path = path.to_path_buf();
    let content_owned = content.to_string();

    // Run synchronous tempfile operations in a blocking task
    tokio::task::spawn_blocking(move || -> io::Result<()> {
        use std::io::Write;

        let mut temp_file = NamedTempFile::new_in(&parent)?;
        temp_file.write_all(content_owned.as_bytes())?;
        temp_file.flush()?;

        // Persisting consumes the NamedTempFile, preventing auto-deletion
        temp_file.persist(&target_path)?;

        Ok(())
    })
    .await
    .map_err(io::Error::other)?
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_atomic_write_creates_file() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("team_names.txt");

        atomic_write(&file_path, "alpha\nbeta\n").await.unwrap();

        assert!(file_path.exists());
        let content = std::fs::read_to_string(&file_path).unwrap();
        assert_eq!(content, "alpha\nbeta\n");
    }

    #[tokio::test]
    async fn test_atomic_write_overwrites_existing() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("roles.csv");

        std::fs::write(&file_path, "initial").unwrap();

        atomic_write(&file_path, "updated").await.unwrap();

        let content = std::fs::read_to_string(&file_path).unwrap();
        assert_eq!(content, "updated");
    }

    #[tokio::test]
    async fn test_atomic_write_no_leftover_temp_files() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("all_teams.json");

        atomic_write(&file_path, "[]").await.unwrap();

        let count = std::fs::read_dir(temp_dir.path()).unwrap().count();
        assert_eq!(count, 1, "Should only have the target file, no temp files");
    }

    #[tokio::test]
    async fn test_atomic_write_fails_with_missing_parent() {
        let result =
            atomic_write(Path::new("/nonexistent/deeply/nested/file.csv"), "content").await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_failed_write_leaves_prior_content() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("roles.csv");
        std::fs::write(&file_path, "old state").unwrap();

        // A write through a bogus sibling path must not disturb the canonical file
        let bogus = temp_dir.path().join("missing").join("roles.csv");
        assert!(atomic_write(&bogus, "new state").await.is_err());

        let content = std::fs::read_to_string(&file_path).unwrap();
        assert_eq!(content, "old state");
    }
}
