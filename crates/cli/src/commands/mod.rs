//! CLI subcommands.

pub mod migrate;
pub mod order;

use resilient_orders_db::db::create_pool;
use resilient_orders_db::{ConfigError, DatabaseConfig, RepositoryError};
use sqlx::PgPool;
use thiserror::Error;

/// Errors that can occur while running a command.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Database connection error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error("Cannot read {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("Invalid orders file: {0}")]
    Json(#[from] serde_json::Error),
}

/// Connect to the orders database configured in the environment.
async fn connect() -> Result<PgPool, CommandError> {
    let config = DatabaseConfig::from_env()?;

    tracing::info!("Connecting to orders database...");
    Ok(create_pool(&config).await?)
}
