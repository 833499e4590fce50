//! Cart engine.
//!
//! Owns cart and cart-line lifecycle for one owner key: add, update,
//! remove, empty and summarize, all validated against live inventory.
//! Cart operations never mutate product rows; the stock validation here
//! is best-effort and is re-checked atomically at checkout.

mod error;

pub use error::CartError;

use sqlx::PgPool;

use madrona_core::{CartLineId, OwnerKey, ProductId};

use crate::db::{self, RepositoryError};
use crate::models::{Cart, CartSummary};

/// Cart engine, scoped to a connection pool.
pub struct CartService<'a> {
    pool: &'a PgPool,
}

impl<'a> CartService<'a> {
    /// Create a new cart service.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get the cart for an owner key, creating an empty one if none exists.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Repository` if a query fails.
    pub async fn get_or_create_cart(&self, owner: &OwnerKey) -> Result<Cart, CartError> {
        let mut conn = self.pool.acquire().await?;

        let cart_id = db::carts::get_or_create(&mut conn, owner).await?;
        let cart = db::carts::get_populated(&mut conn, cart_id)
            .await?
            .ok_or(RepositoryError::NotFound)?;

        Ok(cart)
    }

    /// Get the populated cart for an owner key.
    ///
    /// # Errors
    ///
    /// Returns `CartError::CartNotFound` if the owner has no cart.
    pub async fn get_cart(&self, owner: &OwnerKey) -> Result<Cart, CartError> {
        let mut conn = self.pool.acquire().await?;

        let cart_id = db::carts::find_id(&mut *conn, owner)
            .await?
            .ok_or(CartError::CartNotFound)?;

        let cart = db::carts::get_populated(&mut conn, cart_id)
            .await?
            .ok_or(RepositoryError::NotFound)?;

        Ok(cart)
    }

    /// Add `quantity` units of a product to the owner's cart, creating the
    /// cart and/or the line as needed. Adding a product already in the cart
    /// increases the existing line's quantity.
    ///
    /// The product row is locked for the duration of the transaction so
    /// that the stock check and the line upsert see a stable quantity and
    /// concurrent adds serialize.
    ///
    /// # Errors
    ///
    /// Returns `CartError::InvalidQuantity` if `quantity < 1`,
    /// `CartError::ProductNotFound` / `ProductUnavailable` for bad
    /// products, and `CartError::InsufficientStock` if stock is lower
    /// than the line's requested total.
    pub async fn add_item(
        &self,
        owner: &OwnerKey,
        product_id: ProductId,
        quantity: i32,
    ) -> Result<Cart, CartError> {
        if quantity < 1 {
            return Err(CartError::InvalidQuantity(quantity));
        }

        let mut tx = self.pool.begin().await?;

        let product = db::products::get_for_update(&mut *tx, product_id)
            .await?
            .ok_or(CartError::ProductNotFound(product_id))?;

        if !product.is_active {
            return Err(CartError::ProductUnavailable { name: product.name });
        }

        let cart_id = db::carts::get_or_create(&mut tx, owner).await?;

        let existing = db::carts::line_quantity(&mut *tx, cart_id, product_id)
            .await?
            .unwrap_or(0);

        // A line total beyond i32 can never be coverable by stock.
        let Some(requested_total) = existing.checked_add(quantity) else {
            return Err(CartError::InsufficientStock {
                name: product.name,
                available: product.stock_quantity,
                requested: i32::MAX,
            });
        };

        if product.stock_quantity < requested_total {
            return Err(CartError::InsufficientStock {
                name: product.name,
                available: product.stock_quantity,
                requested: requested_total,
            });
        }

        db::carts::upsert_line(&mut *tx, cart_id, product_id, quantity).await?;

        tx.commit().await?;

        let mut conn = self.pool.acquire().await?;
        let cart = db::carts::get_populated(&mut conn, cart_id)
            .await?
            .ok_or(RepositoryError::NotFound)?;

        Ok(cart)
    }

    /// Overwrite a cart line's quantity (absolute, not additive).
    ///
    /// # Errors
    ///
    /// Returns `CartError::InvalidQuantity` if `new_quantity < 1`,
    /// `CartError::CartNotFound` / `CartItemNotFound` if the line does not
    /// resolve under the owner key, and `CartError::InsufficientStock` if
    /// the product's current stock is lower than the new quantity.
    pub async fn update_item(
        &self,
        owner: &OwnerKey,
        line_id: CartLineId,
        new_quantity: i32,
    ) -> Result<Cart, CartError> {
        if new_quantity < 1 {
            return Err(CartError::InvalidQuantity(new_quantity));
        }

        let mut tx = self.pool.begin().await?;

        let cart_id = db::carts::find_id(&mut *tx, owner)
            .await?
            .ok_or(CartError::CartNotFound)?;

        let line = db::carts::find_line(&mut *tx, cart_id, line_id)
            .await?
            .ok_or(CartError::CartItemNotFound)?;

        // Lock the product row so the stock check holds until commit.
        let product = db::products::get_for_update(&mut *tx, line.product.id)
            .await?
            .ok_or(RepositoryError::NotFound)?;

        if product.stock_quantity < new_quantity {
            return Err(CartError::InsufficientStock {
                name: product.name,
                available: product.stock_quantity,
                requested: new_quantity,
            });
        }

        db::carts::set_line_quantity(&mut *tx, line_id, new_quantity).await?;

        tx.commit().await?;

        let mut conn = self.pool.acquire().await?;
        let cart = db::carts::get_populated(&mut conn, cart_id)
            .await?
            .ok_or(RepositoryError::NotFound)?;

        Ok(cart)
    }

    /// Remove one line from the owner's cart.
    ///
    /// # Errors
    ///
    /// Returns `CartError::CartNotFound` if the owner has no cart, or
    /// `CartError::CartItemNotFound` if the line is not in that cart.
    pub async fn remove_item(
        &self,
        owner: &OwnerKey,
        line_id: CartLineId,
    ) -> Result<(), CartError> {
        let mut conn = self.pool.acquire().await?;

        let cart_id = db::carts::find_id(&mut *conn, owner)
            .await?
            .ok_or(CartError::CartNotFound)?;

        db::carts::find_line(&mut *conn, cart_id, line_id)
            .await?
            .ok_or(CartError::CartItemNotFound)?;

        db::carts::delete_line(&mut *conn, line_id).await?;

        Ok(())
    }

    /// Delete all lines from the owner's cart. Emptying a cart that has no
    /// lines succeeds silently; a truly absent cart is an error.
    ///
    /// # Errors
    ///
    /// Returns `CartError::CartNotFound` if the owner has no cart.
    pub async fn empty_cart(&self, owner: &OwnerKey) -> Result<(), CartError> {
        let mut conn = self.pool.acquire().await?;

        let cart_id = db::carts::find_id(&mut *conn, owner)
            .await?
            .ok_or(CartError::CartNotFound)?;

        db::carts::clear_lines(&mut *conn, cart_id).await?;

        Ok(())
    }

    /// Summarize the owner's cart against live product prices.
    ///
    /// Returns an all-zero summary (not an error) when the owner has no
    /// cart at all.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Repository` if a query fails.
    pub async fn summarize(&self, owner: &OwnerKey) -> Result<CartSummary, CartError> {
        let mut conn = self.pool.acquire().await?;

        let Some(cart_id) = db::carts::find_id(&mut *conn, owner).await? else {
            return Ok(CartSummary::default());
        };

        Ok(db::carts::summarize(&mut *conn, cart_id).await?)
    }
}
