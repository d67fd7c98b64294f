//! Volatility-adaptive trailing stop for the open position.
//!
//! Invariant: while a position is open the stop price never decreases.

use crate::domain::sizing::stop_distance;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrailingStop {
    stop_price: Option<f64>,
}

impl TrailingStop {
    pub fn new() -> Self {
        Self::default()
    }

    /// Place the initial stop below the entry price.
    pub fn initialize(
        &mut self,
        entry_price: f64,
        smoothed_atr: f64,
        stop_multiplier: f64,
        min_stop: f64,
    ) {
        let distance = stop_distance(smoothed_atr, stop_multiplier, min_stop);
        self.stop_price = Some(entry_price - distance);
    }

    /// Ratchet the stop up to `close - atr * multiplier` if that is higher.
    /// Returns the new stop when it moved.
    pub fn update(&mut self, close: f64, smoothed_atr: f64, stop_multiplier: f64) -> Option<f64> {
        let current = self.stop_price?;
        let candidate = close - smoothed_atr * stop_multiplier;
        if candidate > current {
            self.stop_price = Some(candidate);
            Some(candidate)
        } else {
            None
        }
    }

    pub fn is_triggered(&self, close: f64) -> bool {
        self.stop_price.is_some_and(|stop| close < stop)
    }

    pub fn reset(&mut self) {
        self.stop_price = None;
    }

    pub fn stop_price(&self) -> Option<f64> {
        self.stop_price
    }
}
