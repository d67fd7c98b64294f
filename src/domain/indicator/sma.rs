//! Simple Moving Average.
//!
//! SMA(n)[i] = sum(X[i-j] for j in 0..n) / n
//! Warmup: the first (n-1) valid inputs produce invalid points.

use crate::domain::indicator::{IndicatorPoint, IndicatorSeries, IndicatorType};
use crate::domain::ohlcv::Bar;
use chrono::NaiveDate;
use std::collections::VecDeque;

/// SMA of closing prices.
pub fn calculate_sma(bars: &[Bar], period: usize) -> IndicatorSeries {
    let inputs: Vec<_> = bars.iter().map(|b| (b.date, Some(b.close))).collect();
    IndicatorSeries {
        indicator_type: IndicatorType::Sma(period),
        values: rolling_mean(&inputs, period),
    }
}

/// SMA over another indicator's valid points, aligned to the same dates.
pub fn smooth(
    source: &IndicatorSeries,
    period: usize,
    indicator_type: IndicatorType,
) -> IndicatorSeries {
    let inputs: Vec<_> = source
        .values
        .iter()
        .map(|p| (p.date, p.valid.then_some(p.value)))
        .collect();
    IndicatorSeries {
        indicator_type,
        values: rolling_mean(&inputs, period),
    }
}

fn rolling_mean(inputs: &[(NaiveDate, Option<f64>)], period: usize) -> Vec<IndicatorPoint> {
    let mut values = Vec::with_capacity(inputs.len());
    let mut window: VecDeque<f64> = VecDeque::with_capacity(period + 1);
    let mut sum = 0.0;

    for &(date, input) in inputs {
        let Some(x) = input else {
            window.clear();
            sum = 0.0;
            values.push(IndicatorPoint {
                date,
                valid: false,
                value: 0.0,
            });
            continue;
        };

        window.push_back(x);
        sum += x;
        if window.len() > period {
            sum -= window.pop_front().unwrap_or(0.0);
        }

        let valid = period > 0 && window.len() == period;
        values.push(IndicatorPoint {
            date,
            valid,
            value: if valid { sum / period as f64 } else { 0.0 },
        });
    }

    values
}
