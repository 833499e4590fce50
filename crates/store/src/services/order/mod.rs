//! Order engine.
//!
//! Converts a populated cart into an immutable, stock-adjusted order in a
//! single all-or-nothing transaction, and manages the order status state
//! machine (including cancellation, which restocks).

mod error;

pub use error::OrderError;

use rust_decimal::Decimal;
use sqlx::PgPool;

use madrona_core::{OrderId, OrderStatus, OwnerKey};

use crate::db::{self, RepositoryError};
use crate::models::{Order, OrderSummary};

/// Order engine, scoped to a connection pool.
pub struct OrderService<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderService<'a> {
    /// Create a new order service.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Convert the owner's cart into an order.
    ///
    /// In one transaction: re-validates every cart line against live
    /// inventory, freezes the current prices into order lines, decrements
    /// stock with conditional updates, and empties the cart. Either all of
    /// it commits or none of it does.
    ///
    /// Prices are re-read at checkout: a price change since the item was
    /// added is reflected in `price_at_time` and the order total.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::CartNotFound` if the cart is missing or empty,
    /// `OrderError::ProductUnavailable` if any product has gone inactive,
    /// and `OrderError::InsufficientStock` if any line exceeds current
    /// stock.
    pub async fn create_order(
        &self,
        owner: &OwnerKey,
        shipping_address: Option<&str>,
        notes: Option<&str>,
    ) -> Result<Order, OrderError> {
        let mut tx = self.pool.begin().await?;

        let cart_id = db::carts::find_id(&mut *tx, owner)
            .await?
            .ok_or(OrderError::CartNotFound)?;

        // Missing and empty carts are treated identically.
        let mut lines = db::carts::lines_for_cart(&mut *tx, cart_id).await?;
        if lines.is_empty() {
            return Err(OrderError::CartNotFound);
        }

        // Lock product rows in a deterministic order so concurrent
        // checkouts over overlapping products cannot deadlock.
        lines.sort_by_key(|line| line.product.id);

        let mut validated = Vec::with_capacity(lines.len());
        for line in &lines {
            let product = db::products::get_for_update(&mut *tx, line.product.id)
                .await?
                .ok_or(RepositoryError::NotFound)?;

            if !product.is_active {
                return Err(OrderError::ProductUnavailable { name: product.name });
            }
            if product.stock_quantity < line.quantity {
                return Err(OrderError::InsufficientStock {
                    name: product.name,
                    available: product.stock_quantity,
                    requested: line.quantity,
                });
            }

            validated.push((product, line.quantity));
        }

        let total_amount: Decimal = validated
            .iter()
            .map(|(product, quantity)| product.price * Decimal::from(*quantity))
            .sum();

        let order_id = db::orders::insert(&mut *tx, owner, total_amount, shipping_address, notes)
            .await?;

        for (product, quantity) in &validated {
            db::orders::insert_line(&mut *tx, order_id, product.id, *quantity, product.price)
                .await?;

            // The rows are locked and validated above; the conditional
            // update is still the guard of record against oversell.
            let decremented =
                db::products::decrement_stock(&mut *tx, product.id, *quantity).await?;
            if !decremented {
                return Err(OrderError::InsufficientStock {
                    name: product.name.clone(),
                    available: product.stock_quantity,
                    requested: *quantity,
                });
            }
        }

        db::carts::clear_lines(&mut *tx, cart_id).await?;

        tx.commit().await?;

        tracing::info!(%order_id, %owner, %total_amount, "order created");

        self.get_order(order_id).await
    }

    /// Get an order with lines, products and owner populated.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::OrderNotFound` if no order has the given ID.
    pub async fn get_order(&self, order_id: OrderId) -> Result<Order, OrderError> {
        let mut conn = self.pool.acquire().await?;

        db::orders::get_populated(&mut conn, order_id)
            .await?
            .ok_or(OrderError::OrderNotFound)
    }

    /// List an owner's orders, newest first.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::Repository` if a query fails.
    pub async fn list_orders(&self, owner: &OwnerKey) -> Result<Vec<Order>, OrderError> {
        let mut conn = self.pool.acquire().await?;

        Ok(db::orders::list_for_owner(&mut conn, owner).await?)
    }

    /// List every order across all owners, newest first.
    ///
    /// This is the back-office view; it carries no owner filter, so the
    /// presentation layer must only expose it to operators.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::Repository` if a query fails.
    pub async fn list_all_orders(&self) -> Result<Vec<Order>, OrderError> {
        let mut conn = self.pool.acquire().await?;

        Ok(db::orders::list_all(&mut conn).await?)
    }

    /// Compact per-order summaries for an owner, newest first.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::Repository` if a query fails.
    pub async fn order_summaries(
        &self,
        owner: &OwnerKey,
    ) -> Result<Vec<OrderSummary>, OrderError> {
        let mut conn = self.pool.acquire().await?;

        Ok(db::orders::summaries_for_owner(&mut *conn, owner).await?)
    }

    /// Overwrite an order's status.
    ///
    /// Terminal statuses (`delivered`, `cancelled`) reject all further
    /// changes; between non-terminal statuses the overwrite is
    /// unconditional - no ordering is enforced between, say, `pending`
    /// and `shipped`.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::OrderNotFound` if no order has the given ID,
    /// or `OrderError::InvalidTransition` if the current status is
    /// terminal.
    pub async fn update_status(
        &self,
        order_id: OrderId,
        new_status: OrderStatus,
    ) -> Result<Order, OrderError> {
        let mut tx = self.pool.begin().await?;

        let current = db::orders::status_for_update(&mut *tx, order_id)
            .await?
            .ok_or(OrderError::OrderNotFound)?;

        if current.is_terminal() {
            return Err(OrderError::InvalidTransition { from: current });
        }

        db::orders::set_status(&mut *tx, order_id, new_status).await?;

        tx.commit().await?;

        tracing::info!(%order_id, %current, %new_status, "order status updated");

        self.get_order(order_id).await
    }

    /// Cancel a pending order owned by the given owner key, restoring each
    /// product's stock by the ordered quantity - the exact inverse of the
    /// decrement at creation, applied exactly once.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::OrderNotFound` if no order matches the ID and
    /// owner, or `OrderError::InvalidTransition` if the order is not
    /// `pending` (a second cancel of the same order fails here).
    pub async fn cancel_order(
        &self,
        order_id: OrderId,
        owner: &OwnerKey,
    ) -> Result<Order, OrderError> {
        let mut tx = self.pool.begin().await?;

        let current = db::orders::status_for_owner_for_update(&mut *tx, order_id, owner)
            .await?
            .ok_or(OrderError::OrderNotFound)?;

        if !current.is_cancellable() {
            return Err(OrderError::InvalidTransition { from: current });
        }

        db::orders::set_status(&mut *tx, order_id, OrderStatus::Cancelled).await?;

        for (product_id, quantity) in db::orders::line_quantities(&mut *tx, order_id).await? {
            let restocked = db::products::increment_stock(&mut *tx, product_id, quantity).await?;
            if !restocked {
                return Err(OrderError::Repository(RepositoryError::DataCorruption(
                    format!("order {order_id} references missing product {product_id}"),
                )));
            }
        }

        tx.commit().await?;

        tracing::info!(%order_id, %owner, "order cancelled and stock restored");

        self.get_order(order_id).await
    }
}
