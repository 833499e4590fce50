//! Database operations for the store `PostgreSQL`.
//!
//! ## Tables
//!
//! - `product` - the inventory ledger: price, stock quantity, active flag
//! - `cart` / `cart_line` - mutable shopper carts keyed by owner
//! - `purchase_order` / `order_line` - immutable price-frozen orders
//!
//! # Migrations
//!
//! Migrations are stored in `crates/store/migrations/` and run via:
//! ```bash
//! cargo run -p madrona-cli -- migrate
//! ```

pub mod carts;
pub mod orders;
pub mod products;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

use madrona_core::{OwnerKey, SessionToken, UserId};

use crate::config::StoreConfig;

/// Embedded migrations for the store schema.
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., duplicate cart for one owner).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

/// Create a `PostgreSQL` connection pool from the store configuration.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(config: &StoreConfig) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
        .connect(config.database_url.expose_secret())
        .await
}

/// Split an owner key into the nullable `(user_id, session_token)` column
/// pair used by the `cart` and `purchase_order` tables.
fn owner_columns(owner: &OwnerKey) -> (Option<i32>, Option<&str>) {
    match owner {
        OwnerKey::User(id) => (Some(id.as_i32()), None),
        OwnerKey::Session(token) => (None, Some(token.as_str())),
    }
}

/// Reconstruct an owner key from the nullable column pair.
///
/// The schema enforces exactly-one-set with a CHECK constraint, so any
/// other shape is data corruption.
fn owner_from_columns(
    user_id: Option<i32>,
    session_token: Option<String>,
) -> Result<OwnerKey, RepositoryError> {
    match (user_id, session_token) {
        (Some(id), None) => Ok(OwnerKey::User(UserId::new(id))),
        (None, Some(token)) => SessionToken::parse(&token)
            .map(OwnerKey::Session)
            .map_err(|e| RepositoryError::DataCorruption(format!("invalid session token: {e}"))),
        (user_id, session_token) => Err(RepositoryError::DataCorruption(format!(
            "owner columns must have exactly one set (user_id: {user_id:?}, session_token: {session_token:?})"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn owner_columns_splits_user_and_session() {
        let user = OwnerKey::User(UserId::new(3));
        assert_eq!(owner_columns(&user), (Some(3), None));

        let session = OwnerKey::Session(SessionToken::parse("tok").unwrap());
        assert_eq!(owner_columns(&session), (None, Some("tok")));
    }

    #[test]
    fn owner_from_columns_round_trips() {
        let owner = owner_from_columns(Some(3), None).unwrap();
        assert_eq!(owner, OwnerKey::User(UserId::new(3)));

        let owner = owner_from_columns(None, Some("tok".to_string())).unwrap();
        assert_eq!(owner.session_token().map(SessionToken::as_str), Some("tok"));
    }

    #[test]
    fn owner_from_columns_rejects_invalid_shapes() {
        assert!(matches!(
            owner_from_columns(None, None),
            Err(RepositoryError::DataCorruption(_))
        ));
        assert!(matches!(
            owner_from_columns(Some(1), Some("tok".to_string())),
            Err(RepositoryError::DataCorruption(_))
        ));
    }
}
