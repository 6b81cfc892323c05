//! Incremental organization teams fetcher with file-based caching.
//!
//! Fetches an organization's teams and membership data through an external
//! data-source command (the GitHub CLI by default), caches everything as
//! flat files under a per-organization storage root, and keeps metadata
//! (timestamps, checksums, API usage) for incremental updates.

#![cfg_attr(
    test,
    allow(
        clippy::panic,
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::panic_in_result_fn,
        clippy::unwrap_in_result
    )
)]

pub mod config;
pub mod fetcher;
pub mod logging;
pub mod metadata;
pub mod source;
pub mod utils;

// Re-export commonly used types
pub use config::{load_config, AppConfig, ConfigError};
pub use fetcher::{
    clean_orphaned_files, fetch_all_organizations, validate_roles_file, FetchError, FetchOptions,
    FetchSummary, Fetcher, FreshnessOracle, OrgLayout, RoleRow, TeamCacheState, TeamRole,
};
pub use metadata::{calculate_checksum, MetadataError, MetadataStore};
pub use source::{CommandError, CommandOutput, CommandRunner, Invoker, ProcessInvoker};
