//! Cart engine error types.

use thiserror::Error;

use madrona_core::ProductId;

use crate::db::RepositoryError;

/// Errors that can occur during cart operations.
///
/// All variants except `Repository` are expected business-rule failures;
/// `Repository` carries opaque infrastructure failures and must never be
/// conflated with the business kinds by the boundary layer.
#[derive(Debug, Error)]
pub enum CartError {
    /// Quantity must be at least 1.
    #[error("quantity must be at least 1, got {0}")]
    InvalidQuantity(i32),

    /// The referenced product does not exist.
    #[error("product {0} not found")]
    ProductNotFound(ProductId),

    /// The referenced product is inactive.
    #[error("product \"{name}\" is not available")]
    ProductUnavailable {
        /// Product display name.
        name: String,
    },

    /// Not enough stock for the requested total quantity.
    #[error("insufficient stock for \"{name}\": {available} available, {requested} requested")]
    InsufficientStock {
        /// Product display name.
        name: String,
        /// Units currently in stock.
        available: i32,
        /// Units the cart would hold after the operation.
        requested: i32,
    },

    /// No cart exists for the owner key.
    #[error("cart not found")]
    CartNotFound,

    /// No line with the given ID exists in the owner's cart.
    #[error("cart item not found")]
    CartItemNotFound,

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

impl From<sqlx::Error> for CartError {
    fn from(e: sqlx::Error) -> Self {
        Self::Repository(RepositoryError::Database(e))
    }
}
