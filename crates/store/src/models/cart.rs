//! Cart domain types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use madrona_core::{CartId, CartLineId, OwnerKey};

use super::product::Product;

/// A shopper's cart with its lines and embedded product snapshots.
///
/// Exactly one cart exists per owner key. Carts are created lazily on the
/// first add and are emptied rather than deleted.
#[derive(Debug, Clone, Serialize)]
pub struct Cart {
    /// Unique cart ID.
    pub id: CartId,
    /// Who the cart belongs to.
    pub owner: OwnerKey,
    /// Cart lines, one per distinct product.
    pub lines: Vec<CartLine>,
    /// When the cart was created.
    pub created_at: DateTime<Utc>,
    /// When the cart was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Cart {
    /// Whether the cart has no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

/// One "this many units of this product" row within a cart.
#[derive(Debug, Clone, Serialize)]
pub struct CartLine {
    /// Unique line ID.
    pub id: CartLineId,
    /// Cart this line belongs to.
    pub cart_id: CartId,
    /// The referenced product, with live price and stock.
    pub product: Product,
    /// Units of the product in the cart. Always >= 1.
    pub quantity: i32,
    /// When the line was created.
    pub created_at: DateTime<Utc>,
    /// When the line quantity was last changed.
    pub updated_at: DateTime<Utc>,
}

/// Aggregate view of a cart, computed against live product prices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Default)]
pub struct CartSummary {
    /// Total units across all lines.
    pub total_items: i64,
    /// Sum of quantity times current product price over all lines.
    pub total_value: Decimal,
    /// Number of distinct products in the cart.
    pub unique_products: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_summary_is_all_zero() {
        let summary = CartSummary::default();
        assert_eq!(summary.total_items, 0);
        assert_eq!(summary.total_value, Decimal::ZERO);
        assert_eq!(summary.unique_products, 0);
    }
}
