//! Order repository for database operations.
//!
//! Queries are built at runtime (`sqlx::query*` functions rather than the
//! macros) because duplicate detection works against tables whose names are
//! only known when the call is made.

use std::collections::HashSet;

use sqlx::{PgConnection, PgPool, Postgres, QueryBuilder};
use tracing::instrument;

use resilient_orders_core::{NaturalKey, Order, OrderId, OrderReference, StoreId};

use super::RepositoryError;
use super::staging::{STAGING_CHUNK_SIZE, StagingTable, check_staged_count};

const INSERT_ORDER: &str = r"
INSERT INTO orders (id, store, reference, description)
VALUES ($1, $2, $3, $4)
";

const FIND_ORDER_BY_STORE_REFERENCE: &str = r"
SELECT id, store, reference, description
FROM orders
WHERE store = $1 AND reference = $2
";

// =============================================================================
// Internal Row Types
// =============================================================================

/// Internal row type for `PostgreSQL` order queries.
#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: String,
    store: String,
    reference: String,
    description: String,
}

impl From<OrderRow> for Order {
    fn from(row: OrderRow) -> Self {
        Self::new(
            OrderId::new(row.id),
            StoreId::new(row.store),
            OrderReference::new(row.reference),
            row.description,
        )
    }
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for order database operations.
pub struct OrdersRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrdersRepository<'a> {
    /// Create a new orders repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Persist a new order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the id or the `(store, reference)`
    /// pair is already taken.
    /// Returns `RepositoryError::Database` for other database errors.
    #[instrument(
        skip(self, order),
        fields(
            order_id = %order.order_id(),
            store = %order.store_id(),
            reference = %order.order_reference(),
        )
    )]
    pub async fn save(&self, order: &Order) -> Result<(), RepositoryError> {
        sqlx::query(INSERT_ORDER)
            .bind(order.order_id())
            .bind(order.store_id())
            .bind(order.order_reference())
            .bind(order.description())
            .execute(self.pool)
            .await
            .map_err(|e| {
                if let sqlx::Error::Database(ref db_err) = e
                    && db_err.is_unique_violation()
                {
                    return RepositoryError::Conflict(format!(
                        "order {} ({}) already exists",
                        order.order_id(),
                        order.natural_key()
                    ));
                }
                RepositoryError::Database(e)
            })?;

        tracing::debug!("order saved");
        Ok(())
    }

    /// Get an order by its store and store reference.
    ///
    /// Returns `Ok(None)` when no such order has been saved.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self), fields(store = %store_id, reference = %order_reference))]
    pub async fn find_by(
        &self,
        store_id: &StoreId,
        order_reference: &OrderReference,
    ) -> Result<Option<Order>, RepositoryError> {
        let row = sqlx::query_as::<_, OrderRow>(FIND_ORDER_BY_STORE_REFERENCE)
            .bind(store_id)
            .bind(order_reference)
            .fetch_optional(self.pool)
            .await?;

        Ok(row.map(Order::from))
    }

    /// Find which candidate orders collide with persisted orders.
    ///
    /// Returns the natural keys of the candidates that already exist. Keys that
    /// repeat within `orders` but were never persisted are not reported.
    ///
    /// # Errors
    ///
    /// See [`OrdersRepository::find_duplicate_in`].
    pub async fn find_duplicate(
        &self,
        orders: &[Order],
    ) -> Result<HashSet<NaturalKey>, RepositoryError> {
        self.find_duplicate_in(StagingTable::random(), orders).await
    }

    /// Like [`OrdersRepository::find_duplicate`], staging candidates in the
    /// given table.
    ///
    /// Runs in one transaction. The staging table is dropped before commit on
    /// success; on failure the rollback discards it along with everything else.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::StagingMismatch` if not every candidate could
    /// be staged.
    /// Returns `RepositoryError::Database` if any statement fails, including
    /// when a store or reference does not fit the staging columns.
    #[instrument(skip(self, orders), fields(staging = %staging, candidates = orders.len()))]
    pub async fn find_duplicate_in(
        &self,
        staging: StagingTable,
        orders: &[Order],
    ) -> Result<HashSet<NaturalKey>, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        match stage_and_compare(&mut tx, &staging, orders).await {
            Ok(duplicates) => {
                let drop_sql = staging.drop_sql();
                sqlx::query(&drop_sql)
                    .persistent(false)
                    .execute(&mut *tx)
                    .await?;
                tx.commit().await?;

                tracing::debug!(duplicates = duplicates.len(), "duplicate check complete");
                Ok(duplicates)
            }
            Err(e) => {
                if let Err(rollback_err) = tx.rollback().await {
                    tracing::warn!(error = %rollback_err, "failed to roll back duplicate check");
                }
                Err(e)
            }
        }
    }
}

/// Create the staging table, fill it, and read back the keys that match
/// persisted orders.
async fn stage_and_compare(
    ex: &mut PgConnection,
    staging: &StagingTable,
    orders: &[Order],
) -> Result<HashSet<NaturalKey>, RepositoryError> {
    let create_sql = staging.create_sql();
    sqlx::query(&create_sql)
        .persistent(false)
        .execute(&mut *ex)
        .await?;

    let mut inserted = 0;
    for chunk in orders.chunks(STAGING_CHUNK_SIZE) {
        let mut builder = QueryBuilder::<Postgres>::new(staging.insert_sql());
        builder.push_values(chunk, |mut row, order| {
            row.push_bind(order.store_id())
                .push_bind(order.order_reference());
        });
        inserted += builder
            .build()
            .persistent(false)
            .execute(&mut *ex)
            .await?
            .rows_affected();
    }
    check_staged_count(orders.len(), inserted)?;
    tracing::debug!(inserted, "staged candidate orders");

    let mark_sql = staging.mark_existing_sql();
    let marked = sqlx::query(&mark_sql)
        .persistent(false)
        .execute(&mut *ex)
        .await?
        .rows_affected();
    tracing::debug!(marked, "matched staged orders against persisted orders");

    let select_sql = staging.select_existing_sql();
    let rows = sqlx::query_as::<_, (StoreId, OrderReference)>(&select_sql)
        .persistent(false)
        .fetch_all(&mut *ex)
        .await?;

    Ok(rows.into_iter().map(NaturalKey::from).collect())
}
