use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("The NODE_ENV environment variable is required but was not specified.")]
    MissingMode,

    #[error("Invalid public URL '{value}': {source}")]
    InvalidPublicUrl {
        value: String,
        #[source]
        source: url::ParseError,
    },

    #[error("Failed to parse {}: {source}", path.display())]
    Manifest {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to load env file {}: {source}", path.display())]
    Dotenv {
        path: PathBuf,
        #[source]
        source: dotenvy::Error,
    },

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot find script '{name}' in {}", dir.display())]
    MissingScript { name: String, dir: PathBuf },
}

pub type Result<T> = std::result::Result<T, ConfigError>;
