//! CLI command implementations.

pub mod migrate;
pub mod seed;
pub mod token;

use secrecy::SecretString;
use stride_api::config::ConfigError;
use stride_api::db::RepositoryError;
use thiserror::Error;

/// Errors surfaced by any command.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("STRIDE_DATABASE_URL (or DATABASE_URL) is not set")]
    MissingDatabaseUrl,

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Store error: {0}")]
    Store(#[from] RepositoryError),

    #[error("Failed to read {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("Invalid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("{0}")]
    Invalid(String),
}

/// The database URL the API would use, from the environment or `.env`.
fn database_url() -> Result<SecretString, CommandError> {
    dotenvy::dotenv().ok();

    std::env::var("STRIDE_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .map(SecretString::from)
        .map_err(|_| CommandError::MissingDatabaseUrl)
}
