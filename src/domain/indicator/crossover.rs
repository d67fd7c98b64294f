//! Fast/slow moving-average crossover detection.
//!
//! A cross fires on the bar where the sign of (fast - slow) differs from the
//! last non-zero difference, so touching without crossing is ignored.

use crate::domain::indicator::IndicatorSeries;
use crate::domain::signal::Crossover;

pub fn calculate_crossover(fast: &IndicatorSeries, slow: &IndicatorSeries) -> Vec<Crossover> {
    let len = fast.values.len().min(slow.values.len());
    let mut last_nonzero: Option<f64> = None;
    let mut result = Vec::with_capacity(len);

    for i in 0..len {
        let (Some(f), Some(s)) = (fast.value_at(i), slow.value_at(i)) else {
            result.push(Crossover::None);
            continue;
        };

        let diff = f - s;
        let cross = match last_nonzero {
            Some(prev) if prev < 0.0 && diff > 0.0 => Crossover::Bullish,
            Some(prev) if prev > 0.0 && diff < 0.0 => Crossover::Bearish,
            _ => Crossover::None,
        };
        if diff != 0.0 {
            last_nonzero = Some(diff);
        }
        result.push(cross);
    }

    result
}
