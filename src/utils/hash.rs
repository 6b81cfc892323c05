use sha2::{Digest, Sha256};
use std::path::Path;
use tokio::fs;

/// Compute SHA-256 hash of a string
#[must_use]
pub fn compute_hash(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    hex::encode(hasher.finalize())
}

/// Compute SHA-256 hash of a file's contents
pub async fn compute_file_hash(path: &Path) -> Result<String, std::io::Error> {
    let content = fs::read_to_string(path).await?;
    Ok(compute_hash(&content))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compute_hash() {
        let hash = compute_hash("hello world");
        assert_eq!(
            hash,
            "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9"
        );
    }

    #[test]
    fn test_compute_hash_deterministic() {
        let hash1 = compute_hash("team roster");
        let hash2 = compute_hash("team roster");
        assert_eq!(hash1, hash2);
    }

    #[test]
    fn test_compute_hash_different_inputs() {
        assert_ne!(compute_hash("alpha"), compute_hash("beta"));
    }

    #[test]
    fn test_compute_hash_length() {
        assert_eq!(compute_hash("any content").len(), 64);
    }

    #[tokio::test]
    async fn test_compute_file_hash() {
        let temp_dir = tempfile::tempdir().expect("Should create temp dir");
        let file_path = temp_dir.path().join("member_names.txt");
        tokio::fs::write(&file_path, "alice\nbob\n")
            .await
            .expect("Should write");

        let hash = compute_file_hash(&file_path).await.expect("Should hash");
        assert_eq!(hash, compute_hash("alice\nbob\n"));
    }

    #[tokio::test]
    async fn test_compute_file_hash_nonexistent() {
        let result = compute_file_hash(Path::new("/nonexistent/file.txt")).await;
        assert!(result.is_err());
    }
}
