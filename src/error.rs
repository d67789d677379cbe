use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TriageError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("failed to parse config: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("entity {0} is held by more than one collection")]
    DuplicateEntity(String),
}

pub type Result<T> = std::result::Result<T, TriageError>;
