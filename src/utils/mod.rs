mod atomic;
mod hash;

pub use atomic::atomic_write;
pub use hash::{compute_hash, compute_file_hash};

/// Get current timestamp in ISO 8601 format
#[must_use]
pub fn now_iso() -> String {
    chrono::Utc::now().to_rfc3339()
}

/// Get today's date in `YYYY-MM-DD` form, used as the API-usage bucket key.
#[must_use]
pub fn today_key() -> String {
    chrono::Utc::now().date_naive().to_string()
}
