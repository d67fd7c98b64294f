//! Risk-based position sizing.
//!
//! The position is sized so that a move of one stop distance against it loses
//! `risk_fraction` of equity, with commission folded into the per-share risk.

/// Inputs to [`position_size`] that come from strategy configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RiskParams {
    pub risk_fraction: f64,
    pub stop_multiplier: f64,
    pub min_stop: f64,
    pub commission_rate: f64,
}

/// Distance between entry and the initial stop: max(atr * multiplier, min_stop).
pub fn stop_distance(smoothed_atr: f64, stop_multiplier: f64, min_stop: f64) -> f64 {
    (smoothed_atr * stop_multiplier).max(min_stop)
}

/// Whole number of shares to buy. Zero means "do not trade".
pub fn position_size(equity: f64, smoothed_atr: f64, params: &RiskParams) -> u64 {
    let risk_amount = equity * params.risk_fraction;
    let distance = stop_distance(smoothed_atr, params.stop_multiplier, params.min_stop);
    if distance.is_nan() || distance <= 0.0 {
        return 0;
    }

    let raw = (risk_amount / (distance * (1.0 + params.commission_rate))).floor();
    if !raw.is_finite() || raw <= 0.0 {
        return 0;
    }
    raw as u64
}
