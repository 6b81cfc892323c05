pub mod controller;
pub mod freshness;
pub mod layout;
pub mod orphan;
pub mod roles;
pub mod state;
pub mod validate;

pub use controller::{fetch_all_organizations, FetchOptions, FetchSummary, Fetcher};
pub use freshness::{FreshnessOracle, DEFAULT_CACHE_HOURS};
pub use layout::OrgLayout;
pub use orphan::clean_orphaned_files;
pub use roles::{parse_roles_csv, render_roles_csv, RoleRow, TeamRole, ROLE_CSV_HEADER};
pub use state::{classify_roles_file, TeamCacheState};
pub use validate::validate_roles_file;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("remote command failed: {0}")]
    Command(#[from] crate::source::CommandError),

    #[error("failed to parse {resource} response: {source}")]
    Parse {
        resource: String,
        source: serde_json::Error,
    },

    #[error("no team list found for organization '{0}'")]
    MissingTeamList(String),

    #[error("metadata error: {0}")]
    Metadata(#[from] crate::metadata::MetadataError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
