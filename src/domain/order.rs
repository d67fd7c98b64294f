//! Order requests emitted by the strategy and fill notifications returned by
//! the broker.

use chrono::NaiveDate;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderSide {
    Buy,
    Sell,
}

/// Lifecycle status reported for an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderStatus {
    Submitted,
    Accepted,
    Completed,
    Canceled,
    MarginRejected,
    Rejected,
}

impl OrderStatus {
    /// Submitted/Accepted are acknowledgements; everything else ends the order.
    pub fn is_terminal(self) -> bool {
        !matches!(self, OrderStatus::Submitted | OrderStatus::Accepted)
    }

    /// Canceled, margin-rejected or rejected.
    pub fn is_failure(self) -> bool {
        matches!(
            self,
            OrderStatus::Canceled | OrderStatus::MarginRejected | OrderStatus::Rejected
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderRequest {
    pub side: OrderSide,
    pub size: u64,
}

impl OrderRequest {
    pub fn buy(size: u64) -> Self {
        OrderRequest {
            side: OrderSide::Buy,
            size,
        }
    }

    pub fn sell(size: u64) -> Self {
        OrderRequest {
            side: OrderSide::Sell,
            size,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderFill {
    pub status: OrderStatus,
    pub side: OrderSide,
    pub executed_price: f64,
    pub executed_size: u64,
    pub date: NaiveDate,
}

impl fmt::Display for OrderSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderSide::Buy => write!(f, "BUY"),
            OrderSide::Sell => write!(f, "SELL"),
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            OrderStatus::Submitted => "submitted",
            OrderStatus::Accepted => "accepted",
            OrderStatus::Completed => "completed",
            OrderStatus::Canceled => "canceled",
            OrderStatus::MarginRejected => "margin_rejected",
            OrderStatus::Rejected => "rejected",
        };
        write!(f, "{}", s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn acknowledgements_are_not_terminal() {
        assert!(!OrderStatus::Submitted.is_terminal());
        assert!(!OrderStatus::Accepted.is_terminal());
        assert!(OrderStatus::Completed.is_terminal());
        assert!(OrderStatus::Rejected.is_terminal());
    }

    #[test]
    fn failure_statuses() {
        assert!(OrderStatus::Canceled.is_failure());
        assert!(OrderStatus::MarginRejected.is_failure());
        assert!(OrderStatus::Rejected.is_failure());
        assert!(!OrderStatus::Completed.is_failure());
        assert!(!OrderStatus::Accepted.is_failure());
    }

    #[test]
    fn request_constructors() {
        assert_eq!(OrderRequest::buy(10).side, OrderSide::Buy);
        assert_eq!(OrderRequest::sell(7).size, 7);
    }

    #[test]
    fn status_display() {
        assert_eq!(OrderStatus::MarginRejected.to_string(), "margin_rejected");
        assert_eq!(OrderSide::Sell.to_string(), "SELL");
    }
}
