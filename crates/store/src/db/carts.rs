//! Database operations for carts and cart lines.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgConnection;
use sqlx::postgres::PgExecutor;

use madrona_core::{CartId, CartLineId, OwnerKey, ProductId};

use super::{RepositoryError, owner_columns, owner_from_columns};
use crate::models::{Cart, CartLine, CartSummary, Product};

// =============================================================================
// Internal Row Types
// =============================================================================

/// Internal row type for cart header queries.
#[derive(Debug, sqlx::FromRow)]
struct CartRow {
    id: i32,
    user_id: Option<i32>,
    session_token: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// Internal row type for cart lines joined to their product.
#[derive(Debug, sqlx::FromRow)]
struct CartLineRow {
    id: i32,
    cart_id: i32,
    quantity: i32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    product_id: i32,
    product_name: String,
    product_description: String,
    product_price: Decimal,
    product_stock_quantity: i32,
    product_image_url: Option<String>,
    product_is_active: bool,
    product_created_at: DateTime<Utc>,
    product_updated_at: DateTime<Utc>,
}

impl From<CartLineRow> for CartLine {
    fn from(row: CartLineRow) -> Self {
        Self {
            id: CartLineId::new(row.id),
            cart_id: CartId::new(row.cart_id),
            product: Product {
                id: ProductId::new(row.product_id),
                name: row.product_name,
                description: row.product_description,
                price: row.product_price,
                stock_quantity: row.product_stock_quantity,
                image_url: row.product_image_url,
                is_active: row.product_is_active,
                created_at: row.product_created_at,
                updated_at: row.product_updated_at,
            },
            quantity: row.quantity,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

const LINE_WITH_PRODUCT_COLUMNS: &str = r"
    cl.id, cl.cart_id, cl.quantity, cl.created_at, cl.updated_at,
    p.id AS product_id, p.name AS product_name,
    p.description AS product_description, p.price AS product_price,
    p.stock_quantity AS product_stock_quantity,
    p.image_url AS product_image_url, p.is_active AS product_is_active,
    p.created_at AS product_created_at, p.updated_at AS product_updated_at
";

// =============================================================================
// Cart headers
// =============================================================================

/// Find the cart ID for an owner key, if a cart exists.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn find_id(
    executor: impl PgExecutor<'_>,
    owner: &OwnerKey,
) -> Result<Option<CartId>, RepositoryError> {
    let (user_id, session_token) = owner_columns(owner);

    let id = sqlx::query_scalar::<_, i32>(
        r"
        SELECT id
        FROM cart
        WHERE ($1::int IS NOT NULL AND user_id = $1)
           OR ($2::text IS NOT NULL AND session_token = $2)
        ",
    )
    .bind(user_id)
    .bind(session_token)
    .fetch_optional(executor)
    .await?;

    Ok(id.map(CartId::new))
}

/// Get the cart for an owner key, creating an empty one if none exists.
///
/// Concurrent first-adds for the same new owner key race on the insert;
/// the partial unique indexes on the owner columns make the loser's insert
/// a no-op, and the winner's cart is re-read.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if a query fails, or
/// `RepositoryError::Conflict` if the race leaves no visible row.
pub async fn get_or_create(
    conn: &mut PgConnection,
    owner: &OwnerKey,
) -> Result<CartId, RepositoryError> {
    if let Some(id) = find_id(&mut *conn, owner).await? {
        return Ok(id);
    }

    let (user_id, session_token) = owner_columns(owner);
    let inserted = sqlx::query_scalar::<_, i32>(
        r"
        INSERT INTO cart (user_id, session_token)
        VALUES ($1, $2)
        ON CONFLICT DO NOTHING
        RETURNING id
        ",
    )
    .bind(user_id)
    .bind(session_token)
    .fetch_optional(&mut *conn)
    .await?;

    if let Some(id) = inserted {
        return Ok(CartId::new(id));
    }

    // Lost the create race; the winner's cart is ours.
    find_id(&mut *conn, owner)
        .await?
        .ok_or_else(|| RepositoryError::Conflict("cart create race left no visible row".into()))
}

/// Get a cart with its lines and product data populated.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if a query fails, or
/// `RepositoryError::DataCorruption` if the owner columns are malformed.
pub async fn get_populated(
    conn: &mut PgConnection,
    id: CartId,
) -> Result<Option<Cart>, RepositoryError> {
    let header = sqlx::query_as::<_, CartRow>(
        r"
        SELECT id, user_id, session_token, created_at, updated_at
        FROM cart
        WHERE id = $1
        ",
    )
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?;

    let Some(header) = header else {
        return Ok(None);
    };

    let lines = lines_for_cart(&mut *conn, id).await?;

    Ok(Some(Cart {
        id: CartId::new(header.id),
        owner: owner_from_columns(header.user_id, header.session_token)?,
        lines,
        created_at: header.created_at,
        updated_at: header.updated_at,
    }))
}

// =============================================================================
// Cart lines
// =============================================================================

/// List the lines of a cart with product data, oldest line first.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn lines_for_cart(
    executor: impl PgExecutor<'_>,
    cart_id: CartId,
) -> Result<Vec<CartLine>, RepositoryError> {
    let rows = sqlx::query_as::<_, CartLineRow>(&format!(
        r"
        SELECT {LINE_WITH_PRODUCT_COLUMNS}
        FROM cart_line cl
        INNER JOIN product p ON p.id = cl.product_id
        WHERE cl.cart_id = $1
        ORDER BY cl.id ASC
        "
    ))
    .bind(cart_id)
    .fetch_all(executor)
    .await?;

    Ok(rows.into_iter().map(Into::into).collect())
}

/// Find one line of a cart by line ID, with product data.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn find_line(
    executor: impl PgExecutor<'_>,
    cart_id: CartId,
    line_id: CartLineId,
) -> Result<Option<CartLine>, RepositoryError> {
    let row = sqlx::query_as::<_, CartLineRow>(&format!(
        r"
        SELECT {LINE_WITH_PRODUCT_COLUMNS}
        FROM cart_line cl
        INNER JOIN product p ON p.id = cl.product_id
        WHERE cl.id = $1 AND cl.cart_id = $2
        "
    ))
    .bind(line_id)
    .bind(cart_id)
    .fetch_optional(executor)
    .await?;

    Ok(row.map(Into::into))
}

/// Get the quantity of the line holding a given product, if present.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn line_quantity(
    executor: impl PgExecutor<'_>,
    cart_id: CartId,
    product_id: ProductId,
) -> Result<Option<i32>, RepositoryError> {
    let quantity = sqlx::query_scalar::<_, i32>(
        r"
        SELECT quantity
        FROM cart_line
        WHERE cart_id = $1 AND product_id = $2
        ",
    )
    .bind(cart_id)
    .bind(product_id)
    .fetch_optional(executor)
    .await?;

    Ok(quantity)
}

/// Insert a line, or add to the quantity of the existing line for the same
/// product. The increment happens inside the upsert so concurrent adds
/// cannot drop each other's units.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn upsert_line(
    executor: impl PgExecutor<'_>,
    cart_id: CartId,
    product_id: ProductId,
    quantity: i32,
) -> Result<CartLineId, RepositoryError> {
    let id = sqlx::query_scalar::<_, i32>(
        r"
        INSERT INTO cart_line (cart_id, product_id, quantity)
        VALUES ($1, $2, $3)
        ON CONFLICT (cart_id, product_id)
        DO UPDATE SET
            quantity = cart_line.quantity + EXCLUDED.quantity,
            updated_at = NOW()
        RETURNING id
        ",
    )
    .bind(cart_id)
    .bind(product_id)
    .bind(quantity)
    .fetch_one(executor)
    .await?;

    Ok(CartLineId::new(id))
}

/// Overwrite a line's quantity (absolute, not additive).
///
/// # Returns
///
/// Returns `true` if a line was updated.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn set_line_quantity(
    executor: impl PgExecutor<'_>,
    line_id: CartLineId,
    quantity: i32,
) -> Result<bool, RepositoryError> {
    let result = sqlx::query(
        r"
        UPDATE cart_line
        SET quantity = $2, updated_at = NOW()
        WHERE id = $1
        ",
    )
    .bind(line_id)
    .bind(quantity)
    .execute(executor)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Delete one cart line.
///
/// # Returns
///
/// Returns `true` if the line was deleted, `false` if it didn't exist.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn delete_line(
    executor: impl PgExecutor<'_>,
    line_id: CartLineId,
) -> Result<bool, RepositoryError> {
    let result = sqlx::query("DELETE FROM cart_line WHERE id = $1")
        .bind(line_id)
        .execute(executor)
        .await?;

    Ok(result.rows_affected() > 0)
}

/// Delete all lines of a cart. The cart row itself is kept.
///
/// # Returns
///
/// Returns the number of lines deleted (zero for an already-empty cart).
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn clear_lines(
    executor: impl PgExecutor<'_>,
    cart_id: CartId,
) -> Result<u64, RepositoryError> {
    let result = sqlx::query("DELETE FROM cart_line WHERE cart_id = $1")
        .bind(cart_id)
        .execute(executor)
        .await?;

    Ok(result.rows_affected())
}

/// Internal row type for the cart summary aggregate.
#[derive(Debug, sqlx::FromRow)]
struct SummaryRow {
    total_items: i64,
    total_value: Decimal,
    unique_products: i64,
}

/// Compute the aggregate summary of a cart against live product prices.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn summarize(
    executor: impl PgExecutor<'_>,
    cart_id: CartId,
) -> Result<CartSummary, RepositoryError> {
    let row = sqlx::query_as::<_, SummaryRow>(
        r"
        SELECT
            COALESCE(SUM(cl.quantity), 0)::bigint AS total_items,
            COALESCE(SUM(cl.quantity * p.price), 0) AS total_value,
            COUNT(*)::bigint AS unique_products
        FROM cart_line cl
        INNER JOIN product p ON p.id = cl.product_id
        WHERE cl.cart_id = $1
        ",
    )
    .bind(cart_id)
    .fetch_one(executor)
    .await?;

    Ok(CartSummary {
        total_items: row.total_items,
        total_value: row.total_value,
        unique_products: row.unique_products,
    })
}
