//! The order entity.

use serde::{Deserialize, Serialize};

use super::id::{OrderId, OrderReference, StoreId};

/// An order placed in a store.
///
/// Orders are immutable once constructed. The surrogate identity is
/// [`OrderId`]; the business identity is the [`NaturalKey`] formed by the
/// store and the store's own order reference. Two orders with the same
/// natural key are duplicates regardless of their ids or descriptions.
///
/// ## Examples
///
/// ```
/// use resilient_orders_core::{Order, OrderId, OrderReference, StoreId};
///
/// let draft = Order::new(
///     OrderId::new("pending"),
///     StoreId::new("S1"),
///     OrderReference::new("R1"),
///     "two boxes of tea",
/// );
/// let order = Order::with_id(OrderId::new("7f3e"), &draft);
///
/// assert_eq!(order.order_id().as_str(), "7f3e");
/// assert_eq!(order.natural_key(), draft.natural_key());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Order {
    order_id: OrderId,
    store_id: StoreId,
    order_reference: OrderReference,
    description: String,
}

impl Order {
    /// Create a new order.
    #[must_use]
    pub fn new(
        order_id: OrderId,
        store_id: StoreId,
        order_reference: OrderReference,
        description: impl Into<String>,
    ) -> Self {
        Self {
            order_id,
            store_id,
            order_reference,
            description: description.into(),
        }
    }

    /// Copy `other`, assigning it a new identity.
    #[must_use]
    pub fn with_id(order_id: OrderId, other: &Self) -> Self {
        Self {
            order_id,
            store_id: other.store_id.clone(),
            order_reference: other.order_reference.clone(),
            description: other.description.clone(),
        }
    }

    #[must_use]
    pub const fn order_id(&self) -> &OrderId {
        &self.order_id
    }

    #[must_use]
    pub const fn store_id(&self) -> &StoreId {
        &self.store_id
    }

    #[must_use]
    pub const fn order_reference(&self) -> &OrderReference {
        &self.order_reference
    }

    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Returns the `(store, reference)` pair identifying this order.
    #[must_use]
    pub fn natural_key(&self) -> NaturalKey {
        NaturalKey::new(self.store_id.clone(), self.order_reference.clone())
    }
}

/// The business key of an order: the store plus the store's reference.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NaturalKey {
    pub store_id: StoreId,
    pub order_reference: OrderReference,
}

impl NaturalKey {
    #[must_use]
    pub const fn new(store_id: StoreId, order_reference: OrderReference) -> Self {
        Self {
            store_id,
            order_reference,
        }
    }
}

impl From<(StoreId, OrderReference)> for NaturalKey {
    fn from((store_id, order_reference): (StoreId, OrderReference)) -> Self {
        Self::new(store_id, order_reference)
    }
}

impl core::fmt::Display for NaturalKey {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}/{}", self.store_id, self.order_reference)
    }
}
