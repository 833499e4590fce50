//! Product domain type (the inventory ledger entry).

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use madrona_core::ProductId;

/// A catalogue product as the commerce core sees it.
///
/// The catalogue owns the descriptive fields; the core reads them and
/// adjusts only `stock_quantity` (decrement on order creation, increment
/// on cancellation).
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Product {
    /// Unique product ID.
    pub id: ProductId,
    /// Product display name.
    pub name: String,
    /// Product description.
    pub description: String,
    /// Current unit price.
    pub price: Decimal,
    /// Units currently available for sale. Never negative (DB CHECK).
    pub stock_quantity: i32,
    /// Optional product image URL.
    pub image_url: Option<String>,
    /// Whether the product can be added to carts or ordered.
    pub is_active: bool,
    /// When the product was created.
    pub created_at: DateTime<Utc>,
    /// When the product was last updated.
    pub updated_at: DateTime<Utc>,
}
