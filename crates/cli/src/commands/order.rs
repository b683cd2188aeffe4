//! Order management commands.
//!
//! # Usage
//!
//! ```bash
//! orders-cli order save -s S1 -r R1 -d "two boxes of tea"
//! orders-cli order find -s S1 -r R1
//! orders-cli order duplicates candidates.json
//! ```
//!
//! Results are printed to stdout as JSON; progress goes through `tracing`.

use std::path::Path;

use resilient_orders_core::{NaturalKey, Order, OrderId, OrderReference, StoreId};
use resilient_orders_db::OrdersRepository;

use super::{CommandError, connect};

/// Save a new order, generating an id when none is given.
pub async fn save(
    id: Option<String>,
    store: String,
    reference: String,
    description: String,
) -> Result<(), CommandError> {
    let order_id = id.map_or_else(|| OrderId::new(uuid::Uuid::new_v4().to_string()), OrderId::new);
    let order = Order::new(
        order_id,
        StoreId::new(store),
        OrderReference::new(reference),
        description,
    );

    let pool = connect().await?;
    OrdersRepository::new(&pool).save(&order).await?;

    tracing::info!("Order saved! ID: {}, Key: {}", order.order_id(), order.natural_key());
    print_json(&serde_json::to_string_pretty(&order)?);
    Ok(())
}

/// Print the order with the given natural key, if any.
pub async fn find(store: String, reference: String) -> Result<(), CommandError> {
    let store_id = StoreId::new(store);
    let order_reference = OrderReference::new(reference);

    let pool = connect().await?;
    let order = OrdersRepository::new(&pool)
        .find_by(&store_id, &order_reference)
        .await?;

    if order.is_none() {
        tracing::warn!("No order found for {store_id}/{order_reference}");
    }
    print_json(&render_found(order.as_ref())?);
    Ok(())
}

/// Report which orders listed in `path` already exist.
pub async fn duplicates(path: &Path) -> Result<(), CommandError> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| CommandError::Io {
            path: path.display().to_string(),
            source,
        })?;
    let orders = parse_orders(&raw)?;

    let pool = connect().await?;
    let duplicates = OrdersRepository::new(&pool).find_duplicate(&orders).await?;

    tracing::info!(
        "{} of {} candidate orders already exist",
        duplicates.len(),
        orders.len()
    );
    print_json(&serde_json::to_string_pretty(&sorted(duplicates))?);
    Ok(())
}

/// The `order find` result: the order as JSON, or `not found`.
fn render_found(order: Option<&Order>) -> Result<String, serde_json::Error> {
    order.map_or_else(|| Ok("not found".to_owned()), serde_json::to_string_pretty)
}

fn parse_orders(raw: &str) -> Result<Vec<Order>, serde_json::Error> {
    serde_json::from_str(raw)
}

fn sorted(keys: impl IntoIterator<Item = NaturalKey>) -> Vec<NaturalKey> {
    let mut keys: Vec<_> = keys.into_iter().collect();
    keys.sort();
    keys
}

#[allow(clippy::print_stdout)]
fn print_json(json: &str) {
    println!("{json}");
}
