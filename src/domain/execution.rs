//! Simulated broker: next-bar-open market fills with percentage commission.
//!
//! One order may be outstanding at a time. It is executed at the open of the
//! bar following its submission, so decisions made on a bar's close never see
//! that same close as a fill price.

use chrono::NaiveDate;
use tracing::debug;

use super::ohlcv::Bar;
use super::order::{OrderFill, OrderRequest, OrderSide, OrderStatus};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BrokerError {
    #[error("an order is already outstanding ({side} {size})")]
    OrderOutstanding { side: OrderSide, size: u64 },

    #[error("order size must be positive")]
    ZeroSize,

    #[error("cannot sell {requested} shares, holding {held}")]
    InsufficientPosition { requested: u64, held: u64 },
}

/// Commission charged on a trade of the given value.
pub fn calculate_commission(trade_value: f64, commission_rate: f64) -> f64 {
    trade_value * commission_rate
}

#[derive(Debug, Clone)]
struct PendingOrder {
    request: OrderRequest,
    submitted: NaiveDate,
}

#[derive(Debug, Clone)]
pub struct SimulatedBroker {
    starting_cash: f64,
    cash: f64,
    commission_rate: f64,
    held: u64,
    pending: Option<PendingOrder>,
    commission_paid: f64,
}

impl SimulatedBroker {
    pub fn new(cash: f64, commission_rate: f64) -> Self {
        SimulatedBroker {
            starting_cash: cash,
            cash,
            commission_rate,
            held: 0,
            pending: None,
            commission_paid: 0.0,
        }
    }

    pub fn starting_cash(&self) -> f64 {
        self.starting_cash
    }

    pub fn cash(&self) -> f64 {
        self.cash
    }

    pub fn commission_paid(&self) -> f64 {
        self.commission_paid
    }

    pub fn held_size(&self) -> u64 {
        self.held
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Mark-to-market account value at `close`.
    pub fn value(&self, close: f64) -> f64 {
        self.cash + self.held as f64 * close
    }

    pub fn submit(&mut self, request: OrderRequest, date: NaiveDate) -> Result<(), BrokerError> {
        if let Some(p) = &self.pending {
            return Err(BrokerError::OrderOutstanding {
                side: p.request.side,
                size: p.request.size,
            });
        }
        if request.size == 0 {
            return Err(BrokerError::ZeroSize);
        }
        if request.side == OrderSide::Sell && request.size > self.held {
            return Err(BrokerError::InsufficientPosition {
                requested: request.size,
                held: self.held,
            });
        }

        debug!(%date, side = %request.side, size = request.size, "order submitted");
        self.pending = Some(PendingOrder {
            request,
            submitted: date,
        });
        Ok(())
    }

    /// Execute the outstanding order, if any, at `bar.open`.
    pub fn on_bar(&mut self, bar: &Bar) -> Option<OrderFill> {
        let pending = self.pending.take()?;
        let OrderRequest { side, size } = pending.request;
        let price = bar.open;
        let value = size as f64 * price;
        let commission = calculate_commission(value, self.commission_rate);

        let status = match side {
            OrderSide::Buy if value + commission > self.cash => OrderStatus::MarginRejected,
            OrderSide::Buy => {
                self.cash -= value + commission;
                self.held += size;
                OrderStatus::Completed
            }
            OrderSide::Sell => {
                self.cash += value - commission;
                self.held -= size;
                OrderStatus::Completed
            }
        };

        if status == OrderStatus::Completed {
            self.commission_paid += commission;
        }
        debug!(
            submitted = %pending.submitted,
            filled = %bar.date,
            %side,
            size,
            price,
            %status,
            "order processed"
        );

        let (executed_price, executed_size) = match status {
            OrderStatus::Completed => (price, size),
            _ => (0.0, 0),
        };
        Some(OrderFill {
            status,
            side,
            executed_price,
            executed_size,
            date: bar.date,
        })
    }
}
