//! The single long position held by a strategy run.

use chrono::NaiveDate;

#[derive(Debug, Clone, PartialEq)]
pub struct Position {
    pub entry_price: f64,
    pub size: u64,
    pub entry_date: NaiveDate,
}

impl Position {
    /// Gross profit of closing the whole position at `price`.
    pub fn unrealized_pnl(&self, price: f64) -> f64 {
        self.size as f64 * (price - self.entry_price)
    }
}
