//! Per-bar strategy signal assembled from the indicator series.

use crate::domain::indicator::IndicatorType;
use crate::domain::indicator::atr::calculate_atr;
use crate::domain::indicator::crossover::calculate_crossover;
use crate::domain::indicator::sma::{calculate_sma, smooth};
use crate::domain::ohlcv::Bar;
use crate::domain::strategy::StrategyParams;

/// Direction of a fast/slow moving-average cross on the current bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Crossover {
    Bullish,
    Bearish,
    None,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Signal {
    pub fast_ma: f64,
    pub slow_ma: f64,
    pub crossover: Crossover,
    pub atr: f64,
    pub smoothed_atr: f64,
}

/// One entry per bar; `None` until every indicator has warmed up.
pub fn build_signals(bars: &[Bar], params: &StrategyParams) -> Vec<Option<Signal>> {
    let fast = calculate_sma(bars, params.fast_ma_period);
    let slow = calculate_sma(bars, params.slow_ma_period);
    let crossovers = calculate_crossover(&fast, &slow);
    let atr = calculate_atr(bars, params.atr_period);
    let smoothed_atr = smooth(
        &atr,
        params.atr_smooth_period,
        IndicatorType::SmoothedAtr {
            atr_period: params.atr_period,
            smooth_period: params.atr_smooth_period,
        },
    );

    (0..bars.len())
        .map(|i| {
            Some(Signal {
                fast_ma: fast.value_at(i)?,
                slow_ma: slow.value_at(i)?,
                crossover: crossovers.get(i).copied().unwrap_or(Crossover::None),
                atr: atr.value_at(i)?,
                smoothed_atr: smoothed_atr.value_at(i)?,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn make_bars(prices: &[f64]) -> Vec<Bar> {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        prices
            .iter()
            .enumerate()
            .map(|(i, &close)| Bar {
                date: start + chrono::Duration::days(i as i64),
                open: close,
                high: close + 1.0,
                low: close - 1.0,
                close,
                volume: 1000.0,
            })
            .collect()
    }

    fn small_params() -> StrategyParams {
        StrategyParams {
            fast_ma_period: 2,
            slow_ma_period: 4,
            atr_period: 3,
            atr_smooth_period: 2,
            ..StrategyParams::default()
        }
    }

    #[test]
    fn signals_are_none_during_warmup() {
        let bars = make_bars(&[10.0, 10.0, 10.0, 10.0, 10.0, 10.0]);
        let signals = build_signals(&bars, &small_params());

        assert_eq!(signals.len(), 6);
        // slow SMA(4) valid from index 3, smoothed ATR (3 then 2) from index 3
        assert!(signals[..3].iter().all(Option::is_none));
        assert!(signals[3].is_some());
    }

    #[test]
    fn signal_carries_indicator_values() {
        let bars = make_bars(&[10.0, 11.0, 12.0, 13.0, 14.0]);
        let signals = build_signals(&bars, &small_params());
        let s = signals[4].as_ref().unwrap();

        assert!((s.fast_ma - 13.5).abs() < 1e-9);
        assert!((s.slow_ma - 12.5).abs() < 1e-9);
        assert!(s.atr > 0.0);
        assert!(s.smoothed_atr > 0.0);
    }

    #[test]
    fn detects_bullish_cross_after_decline() {
        let bars = make_bars(&[20.0, 18.0, 16.0, 14.0, 12.0, 20.0, 28.0]);
        let signals = build_signals(&bars, &small_params());

        let crosses: Vec<Crossover> = signals
            .iter()
            .flatten()
            .map(|s| s.crossover)
            .collect();
        assert!(crosses.contains(&Crossover::Bullish));
        assert!(!crosses.contains(&Crossover::Bearish));
    }

    #[test]
    fn empty_bars_yield_no_signals() {
        assert!(build_signals(&[], &StrategyParams::default()).is_empty());
    }
}
