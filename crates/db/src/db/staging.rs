//! Temporary staging tables for batch duplicate detection.
//!
//! A staging table holds the natural keys of candidate orders for the
//! duration of one transaction:
//!
//! ```sql
//! CREATE TEMPORARY TABLE tmp<60 random chars> (
//!     store      VARCHAR(64) NOT NULL,
//!     reference  VARCHAR(64) NOT NULL,
//!     current_id VARCHAR(64)
//! )
//! ```
//!
//! Table names cannot be bound as query parameters, so every statement here
//! is built with `format!`. That is only sound because [`StagingTable`] can
//! only be constructed with a generated lowercase alphanumeric name.

use rand::Rng;
use rand::distr::Alphanumeric;

use super::RepositoryError;

/// Prefix of every staging table name.
pub const STAGING_PREFIX: &str = "tmp";

/// Random characters appended to [`STAGING_PREFIX`]. Together they fill the
/// 63-byte `PostgreSQL` identifier limit.
pub const STAGING_SUFFIX_LEN: usize = 60;

/// Candidate rows per `INSERT`. Each row binds two parameters and
/// `PostgreSQL` accepts at most 65535 per statement.
pub const STAGING_CHUNK_SIZE: usize = 1000;

/// A uniquely named temporary table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagingTable {
    name: String,
}

impl StagingTable {
    /// Generate a table with a fresh random name.
    #[must_use]
    pub fn random() -> Self {
        let suffix: String = rand::rng()
            .sample_iter(Alphanumeric)
            .take(STAGING_SUFFIX_LEN)
            .map(|b| char::from(b).to_ascii_lowercase())
            .collect();

        Self {
            name: format!("{STAGING_PREFIX}{suffix}"),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn create_sql(&self) -> String {
        format!(
            "CREATE TEMPORARY TABLE {} (store VARCHAR(64) NOT NULL, reference VARCHAR(64) NOT NULL, current_id VARCHAR(64))",
            self.name
        )
    }

    /// Head of the multi-row insert; values are appended with `push_values`.
    pub(crate) fn insert_sql(&self) -> String {
        format!("INSERT INTO {} (store, reference) ", self.name)
    }

    pub(crate) fn mark_existing_sql(&self) -> String {
        format!(
            "UPDATE {t} SET current_id = orders.id FROM orders WHERE {t}.store = orders.store AND {t}.reference = orders.reference",
            t = self.name
        )
    }

    pub(crate) fn select_existing_sql(&self) -> String {
        format!(
            "SELECT DISTINCT store, reference FROM {} WHERE current_id IS NOT NULL",
            self.name
        )
    }

    pub(crate) fn drop_sql(&self) -> String {
        format!("DROP TABLE {}", self.name)
    }
}

impl core::fmt::Display for StagingTable {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.name)
    }
}

/// Fail unless every candidate landed in the staging table.
///
/// # Errors
///
/// Returns `RepositoryError::StagingMismatch` when the counts differ.
pub fn check_staged_count(expected: usize, inserted: u64) -> Result<(), RepositoryError> {
    let expected = u64::try_from(expected).unwrap_or(u64::MAX);
    if expected == inserted {
        Ok(())
    } else {
        Err(RepositoryError::StagingMismatch { expected, inserted })
    }
}
