mod store;

pub use store::{calculate_checksum, MetadataStatus, MetadataStore};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum MetadataError {
    #[error("metadata IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("metadata serialization error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}
