//! Database operations for the inventory ledger.
//!
//! Stock adjustments are conditional single-statement updates so that
//! concurrent checkouts serialize on the product row instead of racing a
//! read-modify-write cycle.

use sqlx::postgres::PgExecutor;

use madrona_core::ProductId;

use super::RepositoryError;
use crate::models::Product;

/// Get a product by ID.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn get(
    executor: impl PgExecutor<'_>,
    id: ProductId,
) -> Result<Option<Product>, RepositoryError> {
    let product = sqlx::query_as::<_, Product>(
        r"
        SELECT
            id, name, description, price, stock_quantity,
            image_url, is_active, created_at, updated_at
        FROM product
        WHERE id = $1
        ",
    )
    .bind(id)
    .fetch_optional(executor)
    .await?;

    Ok(product)
}

/// Get a product by ID, locking its row for the current transaction.
///
/// Used by cart and order mutations so that stock validation and the
/// subsequent adjustment see a stable row.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn get_for_update(
    executor: impl PgExecutor<'_>,
    id: ProductId,
) -> Result<Option<Product>, RepositoryError> {
    let product = sqlx::query_as::<_, Product>(
        r"
        SELECT
            id, name, description, price, stock_quantity,
            image_url, is_active, created_at, updated_at
        FROM product
        WHERE id = $1
        FOR UPDATE
        ",
    )
    .bind(id)
    .fetch_optional(executor)
    .await?;

    Ok(product)
}

/// Atomically decrement a product's stock, refusing to go below zero.
///
/// # Returns
///
/// Returns `true` if the decrement was applied, `false` if the product is
/// missing or has fewer than `quantity` units left.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn decrement_stock(
    executor: impl PgExecutor<'_>,
    id: ProductId,
    quantity: i32,
) -> Result<bool, RepositoryError> {
    let result = sqlx::query(
        r"
        UPDATE product
        SET stock_quantity = stock_quantity - $2, updated_at = NOW()
        WHERE id = $1 AND stock_quantity >= $2
        ",
    )
    .bind(id)
    .bind(quantity)
    .execute(executor)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Atomically increment a product's stock (the inverse of
/// [`decrement_stock`], used when a pending order is cancelled).
///
/// # Returns
///
/// Returns `true` if a product row was updated.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn increment_stock(
    executor: impl PgExecutor<'_>,
    id: ProductId,
    quantity: i32,
) -> Result<bool, RepositoryError> {
    let result = sqlx::query(
        r"
        UPDATE product
        SET stock_quantity = stock_quantity + $2, updated_at = NOW()
        WHERE id = $1
        ",
    )
    .bind(id)
    .bind(quantity)
    .execute(executor)
    .await?;

    Ok(result.rows_affected() > 0)
}
