//! Database operations for the orders `PostgreSQL` database.
//!
//! ## Tables
//!
//! - `orders` - Persisted orders, unique on `(store, reference)`
//! - `tmp<random>` - Per-call temporary staging tables used by duplicate detection
//!
//! # Migrations
//!
//! Migrations are stored in `crates/db/migrations/` and run via:
//! ```bash
//! cargo run -p resilient-orders-cli -- migrate
//! ```

pub mod orders;
pub mod staging;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::migrate::Migrator;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

use crate::config::DatabaseConfig;

pub use orders::OrdersRepository;
pub use staging::StagingTable;

/// Embedded schema migrations.
pub static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Constraint violation (e.g., an order with the same store and reference).
    #[error("constraint violation: {0}")]
    Conflict(String),

    /// Staging lost or gained rows while copying candidates.
    #[error("staged {inserted} of {expected} candidate orders")]
    StagingMismatch {
        /// Number of candidate orders.
        expected: u64,
        /// Number of rows the database reported as inserted.
        inserted: u64,
    },
}

/// Create a `PostgreSQL` connection pool from the given configuration.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(config: &DatabaseConfig) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(config.acquire_timeout)
        .connect(config.database_url.expose_secret())
        .await
}

/// Apply all pending migrations.
///
/// # Errors
///
/// Returns `MigrateError` if a migration fails or the applied history diverges.
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    tracing::info!("Running orders migrations...");
    MIGRATOR.run(pool).await?;
    tracing::info!("Orders migrations complete");
    Ok(())
}
