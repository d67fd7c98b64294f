//! Trend-following strategy: parameters and the per-bar decision state machine.
//!
//! Entries are taken on a bullish fast/slow SMA crossover and sized from an
//! ATR-based stop. Exits happen on a bearish crossover or when the close falls
//! below a trailing stop that only ever ratchets upward.
//!
//! ```text
//!            bullish, size > 0            buy completed
//!   Flat ─────────────────────▶ PendingEntry ──────────────▶ Long
//!    ▲                               │ buy failed             │ bearish cross
//!    │◀──────────────────────────────┘                        │ or stop hit
//!    │            sell completed                              ▼
//!    └─────────────────────────────────────────────────── PendingExit
//!                                   sell failed → back to Long
//! ```

use tracing::{Span, debug, info, warn};

use crate::domain::ohlcv::Bar;
use crate::domain::order::{OrderFill, OrderRequest, OrderSide, OrderStatus};
use crate::domain::position::Position;
use crate::domain::signal::{Crossover, Signal};
use crate::domain::sizing::{RiskParams, position_size};
use crate::domain::trailing_stop::TrailingStop;

pub const DEFAULT_FAST_MA_PERIOD: usize = 12;
pub const DEFAULT_SLOW_MA_PERIOD: usize = 25;

/// Tunable strategy parameters. Defaults match the reference configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct StrategyParams {
    pub fast_ma_period: usize,
    pub slow_ma_period: usize,
    /// Fraction of equity risked per trade.
    pub risk_per_trade: f64,
    pub atr_period: usize,
    pub atr_smooth_period: usize,
    pub trailing_stop_multiplier: f64,
    pub min_stop_loss: f64,
    /// Commission rate used when sizing (0.001 = 0.1%).
    pub commission: f64,
}

impl Default for StrategyParams {
    fn default() -> Self {
        StrategyParams {
            fast_ma_period: DEFAULT_FAST_MA_PERIOD,
            slow_ma_period: DEFAULT_SLOW_MA_PERIOD,
            risk_per_trade: 0.03,
            atr_period: 10,
            atr_smooth_period: 3,
            trailing_stop_multiplier: 2.2,
            min_stop_loss: 0.5,
            commission: 0.001,
        }
    }
}

impl StrategyParams {
    pub fn risk_params(&self) -> RiskParams {
        RiskParams {
            risk_fraction: self.risk_per_trade,
            stop_multiplier: self.trailing_stop_multiplier,
            min_stop: self.min_stop_loss,
            commission_rate: self.commission,
        }
    }

    pub fn with_periods(&self, fast: usize, slow: usize) -> Self {
        StrategyParams {
            fast_ma_period: fast,
            slow_ma_period: slow,
            ..self.clone()
        }
    }
}

/// Engine state. The outstanding order lives inside the pending variants, so
/// there can never be an entry and an exit in flight at the same time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    Flat,
    PendingEntry(OrderRequest),
    Long,
    PendingExit(OrderRequest),
}

impl EngineState {
    pub fn pending_order(&self) -> Option<OrderRequest> {
        match self {
            EngineState::PendingEntry(req) | EngineState::PendingExit(req) => Some(*req),
            EngineState::Flat | EngineState::Long => None,
        }
    }
}

pub struct StrategyEngine {
    params: StrategyParams,
    state: EngineState,
    position: Option<Position>,
    stop: TrailingStop,
    trade_count: usize,
    span: Span,
}

impl StrategyEngine {
    /// `span` is the logging context every event of this engine is recorded under.
    pub fn new(params: StrategyParams, span: Span) -> Self {
        StrategyEngine {
            params,
            state: EngineState::Flat,
            position: None,
            stop: TrailingStop::new(),
            trade_count: 0,
            span,
        }
    }

    pub fn params(&self) -> &StrategyParams {
        &self.params
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    pub fn position(&self) -> Option<&Position> {
        self.position.as_ref()
    }

    pub fn stop_price(&self) -> Option<f64> {
        self.stop.stop_price()
    }

    /// Completed buys plus completed sells.
    pub fn trade_count(&self) -> usize {
        self.trade_count
    }

    /// Advance the state machine by one bar.
    ///
    /// A fill, if any, is applied first; then, when nothing is outstanding,
    /// the entry/exit rules are evaluated on the same bar. Returns the order
    /// the caller should submit.
    pub fn process_bar(
        &mut self,
        bar: &Bar,
        signal: &Signal,
        fill: Option<&OrderFill>,
        equity: f64,
    ) -> Option<OrderRequest> {
        if let Some(fill) = fill {
            self.apply_fill(bar, signal, fill);
        }

        let span = self.span.clone();
        let _enter = span.enter();

        match self.state {
            EngineState::PendingEntry(_) | EngineState::PendingExit(_) => None,
            EngineState::Flat => self.evaluate_entry(bar, signal, equity),
            EngineState::Long => self.evaluate_exit(bar, signal),
        }
    }

    /// Apply a broker notification without evaluating new decisions.
    pub fn apply_fill(&mut self, bar: &Bar, signal: &Signal, fill: &OrderFill) {
        let span = self.span.clone();
        let _enter = span.enter();

        if !fill.status.is_terminal() {
            debug!(
                date = %fill.date,
                status = %fill.status,
                side = %fill.side,
                "order acknowledged"
            );
            return;
        }

        match (self.state, fill.side) {
            (EngineState::PendingEntry(_), OrderSide::Buy) => self.on_entry_fill(signal, fill),
            (EngineState::PendingExit(_), OrderSide::Sell) => self.on_exit_fill(fill),
            (state, side) => {
                warn!(
                    date = %bar.date,
                    ?state,
                    %side,
                    status = %fill.status,
                    "fill does not match an outstanding order, ignoring"
                );
            }
        }
    }

    /// The broker refused the request returned by the last `process_bar`.
    /// Restores the prior state so the next bar re-evaluates the same decision.
    pub fn submission_failed(&mut self) {
        self.state = match self.state {
            EngineState::PendingEntry(_) => EngineState::Flat,
            EngineState::PendingExit(_) => EngineState::Long,
            other => {
                let _enter = self.span.enter();
                warn!(state = ?other, "submission failure reported with no outstanding order");
                other
            }
        };
    }

    fn on_entry_fill(&mut self, signal: &Signal, fill: &OrderFill) {
        match fill.status {
            OrderStatus::Completed => {
                info!(
                    date = %fill.date,
                    price = fill.executed_price,
                    size = fill.executed_size,
                    "BUY executed"
                );
                self.position = Some(Position {
                    entry_price: fill.executed_price,
                    size: fill.executed_size,
                    entry_date: fill.date,
                });
                self.trade_count += 1;
                self.stop.initialize(
                    fill.executed_price,
                    signal.smoothed_atr,
                    self.params.trailing_stop_multiplier,
                    self.params.min_stop_loss,
                );
                debug!(stop = ?self.stop.stop_price(), "initial stop placed");
                self.state = EngineState::Long;
            }
            status if status.is_failure() => {
                info!(date = %fill.date, %status, "buy order canceled / margin / rejected");
                self.state = EngineState::Flat;
            }
            status => debug!(date = %fill.date, %status, "buy order still outstanding"),
        }
    }

    fn on_exit_fill(&mut self, fill: &OrderFill) {
        match fill.status {
            OrderStatus::Completed => {
                let pnl = self
                    .position
                    .as_ref()
                    .map(|pos| pos.unrealized_pnl(fill.executed_price));
                info!(
                    date = %fill.date,
                    price = fill.executed_price,
                    size = fill.executed_size,
                    ?pnl,
                    "SELL executed"
                );
                if let Some(pos) = &self.position {
                    if pos.size != fill.executed_size {
                        warn!(held = pos.size, sold = fill.executed_size, "partial exit fill");
                    }
                }
                self.position = None;
                self.stop.reset();
                self.trade_count += 1;
                self.state = EngineState::Flat;
            }
            status if status.is_failure() => {
                // Position is still open; the next bar decides again.
                info!(date = %fill.date, %status, "sell order canceled / margin / rejected");
                self.state = EngineState::Long;
            }
            status => debug!(date = %fill.date, %status, "sell order still outstanding"),
        }
    }

    fn evaluate_entry(&mut self, bar: &Bar, signal: &Signal, equity: f64) -> Option<OrderRequest> {
        if signal.crossover != Crossover::Bullish {
            return None;
        }
        info!(
            date = %bar.date,
            fast = signal.fast_ma,
            slow = signal.slow_ma,
            "buy signal (bullish crossover)"
        );

        let size = position_size(equity, signal.smoothed_atr, &self.params.risk_params());
        if size == 0 {
            info!(date = %bar.date, equity, "computed size <= 0, no trade");
            return None;
        }
        info!(date = %bar.date, size, "position size computed");

        let request = OrderRequest::buy(size);
        self.state = EngineState::PendingEntry(request);
        Some(request)
    }

    fn evaluate_exit(&mut self, bar: &Bar, signal: &Signal) -> Option<OrderRequest> {
        let size = self.position.as_ref().map(|p| p.size)?;

        if signal.crossover == Crossover::Bearish {
            info!(
                date = %bar.date,
                fast = signal.fast_ma,
                slow = signal.slow_ma,
                "sell signal (bearish crossover)"
            );
            return Some(self.emit_exit(size));
        }

        let previous = self.stop.stop_price();
        if let Some(raised) = self.stop.update(
            bar.close,
            signal.smoothed_atr,
            self.params.trailing_stop_multiplier,
        ) {
            debug!(date = %bar.date, from = ?previous, to = raised, "trailing stop raised");
        }

        if self.stop.is_triggered(bar.close) {
            info!(
                date = %bar.date,
                close = bar.close,
                stop = ?self.stop.stop_price(),
                "trailing stop triggered"
            );
            return Some(self.emit_exit(size));
        }
        None
    }

    fn emit_exit(&mut self, size: u64) -> OrderRequest {
        let request = OrderRequest::sell(size);
        self.state = EngineState::PendingExit(request);
        request
    }
}
