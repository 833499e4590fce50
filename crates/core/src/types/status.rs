//! Order status state machine.

use serde::{Deserialize, Serialize};

/// Lifecycle status of an order.
///
/// Orders start at `Pending`. `Delivered` and `Cancelled` are terminal:
/// once reached, no further status change is accepted. Cancellation is
/// only valid from `Pending` (cancelling restocks the ordered units).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "order_status", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    #[default]
    Pending,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    /// Whether this status accepts no further transitions.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Delivered | Self::Cancelled)
    }

    /// Whether an order in this status may be cancelled by its owner.
    #[must_use]
    pub const fn is_cancellable(self) -> bool {
        matches!(self, Self::Pending)
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Processing => write!(f, "processing"),
            Self::Shipped => write!(f, "shipped"),
            Self::Delivered => write!(f, "delivered"),
            Self::Cancelled => write!(f, "cancelled"),
        }
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "processing" => Ok(Self::Processing),
            "shipped" => Ok(Self::Shipped),
            "delivered" => Ok(Self::Delivered),
            "cancelled" => Ok(Self::Cancelled),
            _ => Err(format!("invalid order status: {s}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    const ALL: [OrderStatus; 5] = [
        OrderStatus::Pending,
        OrderStatus::Processing,
        OrderStatus::Shipped,
        OrderStatus::Delivered,
        OrderStatus::Cancelled,
    ];

    #[test]
    fn initial_status_is_pending() {
        assert_eq!(OrderStatus::default(), OrderStatus::Pending);
    }

    #[test]
    fn only_delivered_and_cancelled_are_terminal() {
        for status in ALL {
            let expected =
                matches!(status, OrderStatus::Delivered | OrderStatus::Cancelled);
            assert_eq!(status.is_terminal(), expected, "{status}");
        }
    }

    #[test]
    fn only_pending_is_cancellable() {
        for status in ALL {
            assert_eq!(
                status.is_cancellable(),
                status == OrderStatus::Pending,
                "{status}"
            );
        }
    }

    #[test]
    fn display_and_from_str_round_trip() {
        for status in ALL {
            assert_eq!(OrderStatus::from_str(&status.to_string()), Ok(status));
        }
        assert!(OrderStatus::from_str("refunded").is_err());
    }
}
