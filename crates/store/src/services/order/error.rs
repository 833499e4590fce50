//! Order engine error types.

use thiserror::Error;

use madrona_core::OrderStatus;

use crate::db::RepositoryError;

/// Errors that can occur during order operations.
///
/// All variants except `Repository` are expected business-rule failures;
/// `Repository` carries opaque infrastructure failures and must never be
/// conflated with the business kinds by the boundary layer.
#[derive(Debug, Error)]
pub enum OrderError {
    /// The owner's cart is missing or has no lines.
    #[error("cart is empty or not found")]
    CartNotFound,

    /// A product in the cart has become inactive since it was added.
    #[error("product \"{name}\" is no longer available")]
    ProductUnavailable {
        /// Product display name.
        name: String,
    },

    /// A product in the cart no longer has enough stock.
    #[error("insufficient stock for \"{name}\": {available} available, {requested} requested")]
    InsufficientStock {
        /// Product display name.
        name: String,
        /// Units currently in stock.
        available: i32,
        /// Units the order requires.
        requested: i32,
    },

    /// No order matches the given ID (and owner, where one is required).
    #[error("order not found")]
    OrderNotFound,

    /// The order's current status does not allow the requested change.
    #[error("cannot change an order in {from} status")]
    InvalidTransition {
        /// The order's current status.
        from: OrderStatus,
    },

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

impl From<sqlx::Error> for OrderError {
    fn from(e: sqlx::Error) -> Self {
        Self::Repository(RepositoryError::Database(e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_product_and_status() {
        assert_eq!(
            OrderError::CartNotFound.to_string(),
            "cart is empty or not found"
        );
        assert_eq!(
            OrderError::ProductUnavailable {
                name: "lamp".to_string()
            }
            .to_string(),
            "product \"lamp\" is no longer available"
        );
        assert_eq!(
            OrderError::InsufficientStock {
                name: "lamp".to_string(),
                available: 0,
                requested: 1,
            }
            .to_string(),
            "insufficient stock for \"lamp\": 0 available, 1 requested"
        );
        assert_eq!(OrderError::OrderNotFound.to_string(), "order not found");
        assert_eq!(
            OrderError::InvalidTransition {
                from: OrderStatus::Delivered
            }
            .to_string(),
            "cannot change an order in delivered status"
        );
    }

    #[test]
    fn repository_errors_stay_distinguishable_from_business_kinds() {
        let err = OrderError::from(RepositoryError::NotFound);
        assert!(matches!(err, OrderError::Repository(_)));
        assert_eq!(err.to_string(), "database error: not found");
    }
}
