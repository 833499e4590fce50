//! Database operations for orders and order lines.
//!
//! Orders live in the `purchase_order` table (`order` is reserved in SQL).
//! Order lines are immutable once written; only the order status changes.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgConnection;
use sqlx::postgres::PgExecutor;

use madrona_core::{OrderId, OrderLineId, OrderStatus, OwnerKey, ProductId};

use super::{RepositoryError, owner_columns, owner_from_columns};
use crate::models::{Order, OrderLine, OrderSummary, Product};

// =============================================================================
// Internal Row Types
// =============================================================================

/// Internal row type for order header queries.
#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: i32,
    user_id: Option<i32>,
    session_token: Option<String>,
    total_amount: Decimal,
    status: OrderStatus,
    shipping_address: Option<String>,
    notes: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// Internal row type for order lines joined to their product.
#[derive(Debug, sqlx::FromRow)]
struct OrderLineRow {
    id: i32,
    order_id: i32,
    quantity: i32,
    price_at_time: Decimal,
    created_at: DateTime<Utc>,
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

impl From<OrderLineRow> for OrderLine {
    fn from(row: OrderLineRow) -> Self {
        Self {
            id: OrderLineId::new(row.id),
            order_id: OrderId::new(row.order_id),
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
            price_at_time: row.price_at_time,
            created_at: row.created_at,
        }
    }
}

const ORDER_COLUMNS: &str = r"
    id, user_id, session_token, total_amount, status,
    shipping_address, notes, created_at, updated_at
";

const LINE_WITH_PRODUCT_COLUMNS: &str = r"
    ol.id, ol.order_id, ol.quantity, ol.price_at_time, ol.created_at,
    p.id AS product_id, p.name AS product_name,
    p.description AS product_description, p.price AS product_price,
    p.stock_quantity AS product_stock_quantity,
    p.image_url AS product_image_url, p.is_active AS product_is_active,
    p.created_at AS product_created_at, p.updated_at AS product_updated_at
";

impl OrderRow {
    fn into_order(self, lines: Vec<OrderLine>) -> Result<Order, RepositoryError> {
        Ok(Order {
            id: OrderId::new(self.id),
            owner: owner_from_columns(self.user_id, self.session_token)?,
            total_amount: self.total_amount,
            status: self.status,
            shipping_address: self.shipping_address,
            notes: self.notes,
            lines,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

// =============================================================================
// Writes
// =============================================================================

/// Insert a new order header with status `pending`.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn insert(
    executor: impl PgExecutor<'_>,
    owner: &OwnerKey,
    total_amount: Decimal,
    shipping_address: Option<&str>,
    notes: Option<&str>,
) -> Result<OrderId, RepositoryError> {
    let (user_id, session_token) = owner_columns(owner);

    let id = sqlx::query_scalar::<_, i32>(
        r"
        INSERT INTO purchase_order (user_id, session_token, total_amount, shipping_address, notes)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING id
        ",
    )
    .bind(user_id)
    .bind(session_token)
    .bind(total_amount)
    .bind(shipping_address)
    .bind(notes)
    .fetch_one(executor)
    .await?;

    Ok(OrderId::new(id))
}

/// Insert one price-frozen order line.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn insert_line(
    executor: impl PgExecutor<'_>,
    order_id: OrderId,
    product_id: ProductId,
    quantity: i32,
    price_at_time: Decimal,
) -> Result<OrderLineId, RepositoryError> {
    let id = sqlx::query_scalar::<_, i32>(
        r"
        INSERT INTO order_line (order_id, product_id, quantity, price_at_time)
        VALUES ($1, $2, $3, $4)
        RETURNING id
        ",
    )
    .bind(order_id)
    .bind(product_id)
    .bind(quantity)
    .bind(price_at_time)
    .fetch_one(executor)
    .await?;

    Ok(OrderLineId::new(id))
}

/// Overwrite an order's status.
///
/// # Returns
///
/// Returns `true` if an order row was updated.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn set_status(
    executor: impl PgExecutor<'_>,
    id: OrderId,
    status: OrderStatus,
) -> Result<bool, RepositoryError> {
    let result = sqlx::query(
        r"
        UPDATE purchase_order
        SET status = $2, updated_at = NOW()
        WHERE id = $1
        ",
    )
    .bind(id)
    .bind(status)
    .execute(executor)
    .await?;

    Ok(result.rows_affected() > 0)
}

// =============================================================================
// Reads
// =============================================================================

/// Get an order's current status, locking the header row for the current
/// transaction so status checks and the subsequent update serialize.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn status_for_update(
    executor: impl PgExecutor<'_>,
    id: OrderId,
) -> Result<Option<OrderStatus>, RepositoryError> {
    let status = sqlx::query_scalar::<_, OrderStatus>(
        "SELECT status FROM purchase_order WHERE id = $1 FOR UPDATE",
    )
    .bind(id)
    .fetch_optional(executor)
    .await?;

    Ok(status)
}

/// Like [`status_for_update`], but the order must also belong to the given
/// owner key.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn status_for_owner_for_update(
    executor: impl PgExecutor<'_>,
    id: OrderId,
    owner: &OwnerKey,
) -> Result<Option<OrderStatus>, RepositoryError> {
    let (user_id, session_token) = owner_columns(owner);

    let status = sqlx::query_scalar::<_, OrderStatus>(
        r"
        SELECT status
        FROM purchase_order
        WHERE id = $1
          AND (($2::int IS NOT NULL AND user_id = $2)
            OR ($3::text IS NOT NULL AND session_token = $3))
        FOR UPDATE
        ",
    )
    .bind(id)
    .bind(user_id)
    .bind(session_token)
    .fetch_optional(executor)
    .await?;

    Ok(status)
}

/// List each line's product and quantity, in product-id order.
///
/// Used by cancellation to restock; the deterministic ordering keeps
/// concurrent restocks and checkouts from deadlocking on product rows.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn line_quantities(
    executor: impl PgExecutor<'_>,
    order_id: OrderId,
) -> Result<Vec<(ProductId, i32)>, RepositoryError> {
    let rows = sqlx::query_as::<_, (i32, i32)>(
        r"
        SELECT product_id, quantity
        FROM order_line
        WHERE order_id = $1
        ORDER BY product_id ASC
        ",
    )
    .bind(order_id)
    .fetch_all(executor)
    .await?;

    Ok(rows
        .into_iter()
        .map(|(product_id, quantity)| (ProductId::new(product_id), quantity))
        .collect())
}

/// Get an order with its lines and product data populated.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if a query fails, or
/// `RepositoryError::DataCorruption` if the owner columns are malformed.
pub async fn get_populated(
    conn: &mut PgConnection,
    id: OrderId,
) -> Result<Option<Order>, RepositoryError> {
    let header = sqlx::query_as::<_, OrderRow>(&format!(
        "SELECT {ORDER_COLUMNS} FROM purchase_order WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?;

    let Some(header) = header else {
        return Ok(None);
    };

    let lines = lines_for_order(&mut *conn, id).await?;

    Ok(Some(header.into_order(lines)?))
}

/// List the lines of an order with product data, oldest line first.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn lines_for_order(
    executor: impl PgExecutor<'_>,
    order_id: OrderId,
) -> Result<Vec<OrderLine>, RepositoryError> {
    let rows = sqlx::query_as::<_, OrderLineRow>(&format!(
        r"
        SELECT {LINE_WITH_PRODUCT_COLUMNS}
        FROM order_line ol
        INNER JOIN product p ON p.id = ol.product_id
        WHERE ol.order_id = $1
        ORDER BY ol.id ASC
        "
    ))
    .bind(order_id)
    .fetch_all(executor)
    .await?;

    Ok(rows.into_iter().map(Into::into).collect())
}

/// List an owner's orders with lines populated, newest first.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if a query fails, or
/// `RepositoryError::DataCorruption` if owner columns are malformed.
pub async fn list_for_owner(
    conn: &mut PgConnection,
    owner: &OwnerKey,
) -> Result<Vec<Order>, RepositoryError> {
    let (user_id, session_token) = owner_columns(owner);

    let headers = sqlx::query_as::<_, OrderRow>(&format!(
        r"
        SELECT {ORDER_COLUMNS}
        FROM purchase_order
        WHERE ($1::int IS NOT NULL AND user_id = $1)
           OR ($2::text IS NOT NULL AND session_token = $2)
        ORDER BY created_at DESC
        "
    ))
    .bind(user_id)
    .bind(session_token)
    .fetch_all(&mut *conn)
    .await?;

    let mut orders = Vec::with_capacity(headers.len());
    for header in headers {
        let lines = lines_for_order(&mut *conn, OrderId::new(header.id)).await?;
        orders.push(header.into_order(lines)?);
    }

    Ok(orders)
}

/// List every order with lines populated, newest first.
///
/// Backs the back-office overview; there is no owner filter and no
/// pagination.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if a query fails, or
/// `RepositoryError::DataCorruption` if owner columns are malformed.
pub async fn list_all(conn: &mut PgConnection) -> Result<Vec<Order>, RepositoryError> {
    let headers = sqlx::query_as::<_, OrderRow>(&format!(
        r"
        SELECT {ORDER_COLUMNS}
        FROM purchase_order
        ORDER BY created_at DESC
        "
    ))
    .fetch_all(&mut *conn)
    .await?;

    let mut orders = Vec::with_capacity(headers.len());
    for header in headers {
        let lines = lines_for_order(&mut *conn, OrderId::new(header.id)).await?;
        orders.push(header.into_order(lines)?);
    }

    Ok(orders)
}

/// Internal row type for per-order summaries.
#[derive(Debug, sqlx::FromRow)]
struct OrderSummaryRow {
    id: i32,
    total_amount: Decimal,
    status: OrderStatus,
    total_items: i64,
    created_at: DateTime<Utc>,
}

/// Compact per-order summaries for an owner, newest first.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn summaries_for_owner(
    executor: impl PgExecutor<'_>,
    owner: &OwnerKey,
) -> Result<Vec<OrderSummary>, RepositoryError> {
    let (user_id, session_token) = owner_columns(owner);

    let rows = sqlx::query_as::<_, OrderSummaryRow>(
        r"
        SELECT
            o.id, o.total_amount, o.status, o.created_at,
            COALESCE(SUM(ol.quantity), 0)::bigint AS total_items
        FROM purchase_order o
        LEFT JOIN order_line ol ON ol.order_id = o.id
        WHERE ($1::int IS NOT NULL AND o.user_id = $1)
           OR ($2::text IS NOT NULL AND o.session_token = $2)
        GROUP BY o.id
        ORDER BY o.created_at DESC
        ",
    )
    .bind(user_id)
    .bind(session_token)
    .fetch_all(executor)
    .await?;

    Ok(rows
        .into_iter()
        .map(|row| OrderSummary {
            order_id: OrderId::new(row.id),
            total_amount: row.total_amount,
            status: row.status,
            total_items: row.total_items,
            created_at: row.created_at,
        })
        .collect())
}
