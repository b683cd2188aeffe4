//! Database migration commands.
//!
//! # Usage
//!
//! ```bash
//! orders-cli migrate
//! ```
//!
//! # Environment Variables
//!
//! - `ORDERS_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//!
//! Migrations live in `crates/db/migrations/` and are embedded at build time.

use resilient_orders_db::db::run_migrations;

use super::{CommandError, connect};

/// Run the orders database migrations.
pub async fn run() -> Result<(), CommandError> {
    let pool = connect().await?;
    run_migrations(&pool).await?;
    Ok(())
}
