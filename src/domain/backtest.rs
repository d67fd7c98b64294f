//! Backtest driver: the sequential per-bar loop tying indicators, strategy
//! engine and simulated broker together.

use chrono::NaiveDate;
use tracing::{Span, debug, info, info_span, warn};

use super::error::TrendsweepError;
use super::execution::SimulatedBroker;
use super::metrics::{EquityPoint, RunSummary, max_drawdown_pct, period_returns};
use super::ohlcv::Bar;
use super::order::OrderFill;
use super::signal::{Signal, build_signals};
use super::strategy::{EngineState, StrategyEngine, StrategyParams};
use crate::ports::data_port::DataPort;

pub const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, PartialEq)]
pub struct BacktestConfig {
    /// `YYYY-MM-DD`; parsed per run so a bad range fails only that run.
    pub start_date: String,
    pub end_date: String,
    pub initial_capital: f64,
    pub commission_rate: f64,
    pub risk_free_rate: f64,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        BacktestConfig {
            start_date: "2018-01-01".to_string(),
            end_date: "2023-01-01".to_string(),
            initial_capital: 100_000.0,
            commission_rate: 0.001,
            risk_free_rate: 0.0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct BacktestRun {
    pub starting_equity: f64,
    pub ending_equity: f64,
    pub equity_curve: Vec<EquityPoint>,
    pub returns: Vec<f64>,
    pub max_drawdown_pct: Option<f64>,
    pub trade_count: usize,
    pub fills: Vec<OrderFill>,
    pub commission_paid: f64,
    pub final_state: EngineState,
}

impl BacktestRun {
    pub fn summary<'a>(&'a self, ticker: &'a str) -> RunSummary<'a> {
        RunSummary {
            ticker,
            starting_equity: self.starting_equity,
            ending_equity: self.ending_equity,
            returns: &self.returns,
            max_drawdown_pct: self.max_drawdown_pct,
            trade_count: self.trade_count,
        }
    }

    pub fn total_return_pct(&self) -> f64 {
        super::metrics::total_return_pct(self.starting_equity, self.ending_equity)
    }
}

/// A completed run together with the bars it was driven over.
#[derive(Debug, Clone)]
pub struct TickerBacktest {
    pub ticker: String,
    pub bars: Vec<Bar>,
    pub run: BacktestRun,
}

pub fn parse_date_range(
    ticker: &str,
    start: &str,
    end: &str,
) -> Result<(NaiveDate, NaiveDate), TrendsweepError> {
    let invalid = |reason: String| TrendsweepError::InvalidDateRange {
        ticker: ticker.to_string(),
        start: start.to_string(),
        end: end.to_string(),
        reason,
    };

    let start_date = NaiveDate::parse_from_str(start.trim(), DATE_FORMAT)
        .map_err(|e| invalid(format!("start date: {e}")))?;
    let end_date = NaiveDate::parse_from_str(end.trim(), DATE_FORMAT)
        .map_err(|e| invalid(format!("end date: {e}")))?;
    if start_date > end_date {
        return Err(invalid("start date is after end date".to_string()));
    }
    Ok((start_date, end_date))
}

/// Drive one strategy over `bars`. `signals` must be aligned with `bars`.
pub fn run_backtest(
    bars: &[Bar],
    signals: &[Option<Signal>],
    params: &StrategyParams,
    config: &BacktestConfig,
    span: Span,
) -> BacktestRun {
    let _enter = span.enter();
    let mut engine = StrategyEngine::new(params.clone(), span.clone());
    let mut broker = SimulatedBroker::new(config.initial_capital, config.commission_rate);
    let mut equity_curve = Vec::with_capacity(bars.len());
    let mut fills = Vec::new();
    let mut last_signal: Option<&Signal> = None;

    debug!(
        bars = bars.len(),
        fast = params.fast_ma_period,
        slow = params.slow_ma_period,
        "backtest started"
    );

    for (bar, signal) in bars.iter().zip(signals.iter()) {
        let fill = broker.on_bar(bar);

        match signal {
            Some(signal) => {
                let equity = broker.value(bar.close);
                if let Some(request) = engine.process_bar(bar, signal, fill.as_ref(), equity) {
                    if let Err(e) = broker.submit(request, bar.date) {
                        warn!(date = %bar.date, error = %e, "order submission refused");
                        engine.submission_failed();
                    }
                }
                last_signal = Some(signal);
            }
            None => {
                if let Some(fill) = &fill {
                    match last_signal {
                        Some(prev) => engine.apply_fill(bar, prev, fill),
                        None => warn!(date = %bar.date, "fill arrived before any signal, ignoring"),
                    }
                }
            }
        }

        if let Some(fill) = fill {
            fills.push(fill);
        }
        equity_curve.push(EquityPoint {
            date: bar.date,
            equity: broker.value(bar.close),
        });
    }

    if broker.has_pending() {
        warn!("data ended with an order still outstanding, it was never filled");
    }

    let starting_equity = broker.starting_cash();
    let ending_equity = equity_curve
        .last()
        .map(|p| p.equity)
        .unwrap_or(starting_equity);
    let returns = period_returns(starting_equity, &equity_curve);
    let max_drawdown_pct = max_drawdown_pct(&equity_curve);

    info!(
        ending_equity = format_args!("{:.2}", ending_equity),
        cash = format_args!("{:.2}", broker.cash()),
        held = broker.held_size(),
        commission = format_args!("{:.2}", broker.commission_paid()),
        trades = engine.trade_count(),
        state = ?engine.state(),
        "backtest finished"
    );

    BacktestRun {
        starting_equity,
        ending_equity,
        equity_curve,
        returns,
        max_drawdown_pct,
        trade_count: engine.trade_count(),
        fills,
        commission_paid: broker.commission_paid(),
        final_state: engine.state(),
    }
}

/// Parse the date range, load bars and run the strategy for one ticker.
pub fn backtest_ticker<D: DataPort + ?Sized>(
    data_port: &D,
    ticker: &str,
    params: &StrategyParams,
    config: &BacktestConfig,
) -> Result<TickerBacktest, TrendsweepError> {
    let span = info_span!(
        "backtest",
        ticker,
        fast = params.fast_ma_period,
        slow = params.slow_ma_period
    );
    let (start, end) = parse_date_range(ticker, &config.start_date, &config.end_date)?;

    let bars = data_port.fetch_bars(ticker, start, end)?;
    if bars.is_empty() {
        return Err(TrendsweepError::NoData {
            ticker: ticker.to_string(),
            start: start.to_string(),
            end: end.to_string(),
        });
    }

    let signals = build_signals(&bars, params);
    let run = run_backtest(&bars, &signals, params, config, span);
    Ok(TickerBacktest {
        ticker: ticker.to_string(),
        bars,
        run,
    })
}
