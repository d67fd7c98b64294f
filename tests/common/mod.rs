#![allow(dead_code)]

use chrono::NaiveDate;
use std::collections::HashMap;
use trendsweep::domain::backtest::BacktestConfig;
use trendsweep::domain::error::TrendsweepError;
pub use trendsweep::domain::ohlcv::Bar;
use trendsweep::domain::signal::{Crossover, Signal};
use trendsweep::domain::strategy::StrategyParams;
use trendsweep::ports::data_port::DataPort;

pub struct MockDataPort {
    pub data: HashMap<String, Vec<Bar>>,
    pub errors: HashMap<String, String>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            errors: HashMap::new(),
        }
    }

    pub fn with_bars(mut self, ticker: &str, bars: Vec<Bar>) -> Self {
        self.data.insert(ticker.to_string(), bars);
        self
    }

    pub fn with_error(mut self, ticker: &str, reason: &str) -> Self {
        self.errors.insert(ticker.to_string(), reason.to_string());
        self
    }
}

impl DataPort for MockDataPort {
    fn fetch_bars(
        &self,
        ticker: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<Bar>, TrendsweepError> {
        if let Some(reason) = self.errors.get(ticker) {
            return Err(TrendsweepError::Data {
                reason: reason.clone(),
            });
        }
        Ok(self
            .data
            .get(ticker)
            .map(|bars| {
                bars.iter()
                    .filter(|b| b.date >= start && b.date <= end)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    fn list_tickers(&self) -> Result<Vec<String>, TrendsweepError> {
        let mut tickers: Vec<String> = self.data.keys().cloned().collect();
        tickers.sort();
        Ok(tickers)
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// Bar with open == close and a one-point range either side.
pub fn make_bar(day: NaiveDate, close: f64) -> Bar {
    Bar {
        date: day,
        open: close,
        high: close + 1.0,
        low: close - 1.0,
        close,
        volume: 1_000.0,
    }
}

/// Consecutive daily bars from a close series starting 2020-01-01.
pub fn bars_from_closes(closes: &[f64]) -> Vec<Bar> {
    let start = date(2020, 1, 1);
    closes
        .iter()
        .enumerate()
        .map(|(i, &c)| make_bar(start + chrono::Duration::days(i as i64), c))
        .collect()
}

/// Piecewise-linear closes: each segment is `(bars, step per bar)`.
pub fn piecewise_closes(start_price: f64, segments: &[(usize, f64)]) -> Vec<f64> {
    let mut closes = Vec::new();
    let mut price = start_price;
    for &(count, step) in segments {
        for _ in 0..count {
            closes.push(price);
            price += step;
        }
    }
    closes
}

/// Decline, then a long rally: one bullish crossover, no bearish one.
pub fn v_shaped_bars() -> Vec<Bar> {
    bars_from_closes(&piecewise_closes(150.0, &[(40, -1.0), (60, 1.0)]))
}

/// Decline, rally, then a sharp sell-off.
pub fn round_trip_bars() -> Vec<Bar> {
    bars_from_closes(&piecewise_closes(150.0, &[(40, -1.0), (40, 1.0), (40, -2.0)]))
}

pub fn signal(crossover: Crossover, smoothed_atr: f64) -> Signal {
    Signal {
        fast_ma: 100.0,
        slow_ma: 100.0,
        crossover,
        atr: smoothed_atr,
        smoothed_atr,
    }
}

pub fn sample_config() -> BacktestConfig {
    BacktestConfig {
        start_date: "2020-01-01".into(),
        end_date: "2020-12-31".into(),
        initial_capital: 100_000.0,
        commission_rate: 0.001,
        risk_free_rate: 0.0,
    }
}

pub fn fast_params() -> StrategyParams {
    StrategyParams {
        fast_ma_period: 5,
        slow_ma_period: 15,
        ..StrategyParams::default()
    }
}
