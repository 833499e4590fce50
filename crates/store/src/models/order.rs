//! Order domain types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use madrona_core::{OrderId, OrderLineId, OrderStatus, OwnerKey};

use super::product::Product;

/// A placed order.
///
/// Immutable after creation except for `status`. `total_amount` is fixed
/// at checkout time and never recomputed, even if product prices change.
#[derive(Debug, Clone, Serialize)]
pub struct Order {
    /// Unique order ID.
    pub id: OrderId,
    /// Who placed the order (same tagged key as the cart it came from).
    pub owner: OwnerKey,
    /// Sum of quantity times price-at-time over all lines, fixed at creation.
    pub total_amount: Decimal,
    /// Current lifecycle status.
    pub status: OrderStatus,
    /// Free-form shipping address, if provided at checkout.
    pub shipping_address: Option<String>,
    /// Free-form order notes, if provided at checkout.
    pub notes: Option<String>,
    /// Price-frozen order lines.
    pub lines: Vec<OrderLine>,
    /// When the order was placed.
    pub created_at: DateTime<Utc>,
    /// When the order status last changed.
    pub updated_at: DateTime<Utc>,
}

/// The immutable, price-frozen counterpart of a cart line.
#[derive(Debug, Clone, Serialize)]
pub struct OrderLine {
    /// Unique line ID.
    pub id: OrderLineId,
    /// Order this line belongs to.
    pub order_id: OrderId,
    /// The referenced product, with its current (live) data.
    pub product: Product,
    /// Units ordered.
    pub quantity: i32,
    /// Unit price at the moment the order was created. Frozen forever.
    pub price_at_time: Decimal,
    /// When the line was created.
    pub created_at: DateTime<Utc>,
}

/// Compact per-order view for listings.
#[derive(Debug, Clone, Serialize)]
pub struct OrderSummary {
    /// Order ID.
    pub order_id: OrderId,
    /// Frozen order total.
    pub total_amount: Decimal,
    /// Current status.
    pub status: OrderStatus,
    /// Total units across all lines.
    pub total_items: i64,
    /// When the order was placed.
    pub created_at: DateTime<Utc>,
}
