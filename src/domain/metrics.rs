//! Performance analytics for a completed backtest run.

use chrono::NaiveDate;
use statrs::distribution::{ContinuousCDF, StudentsT};
use tracing::info;

pub const TRADING_DAYS_PER_YEAR: f64 = 252.0;

#[derive(Debug, Clone, PartialEq)]
pub struct EquityPoint {
    pub date: NaiveDate,
    pub equity: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PerformanceMetrics {
    pub ticker: String,
    pub total_return_pct: f64,
    pub sharpe_ratio: f64,
    pub max_drawdown_pct: f64,
    pub trade_count: usize,
    pub t_statistic: f64,
    pub p_value: f64,
    pub net_return_pct: f64,
}

/// What the analyzer needs to know about a finished run.
#[derive(Debug, Clone)]
pub struct RunSummary<'a> {
    pub ticker: &'a str,
    pub starting_equity: f64,
    pub ending_equity: f64,
    pub returns: &'a [f64],
    pub max_drawdown_pct: Option<f64>,
    pub trade_count: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PerformanceAnalyzer {
    pub risk_free_rate: f64,
    pub commission_rate: f64,
}

impl PerformanceAnalyzer {
    pub fn new(risk_free_rate: f64, commission_rate: f64) -> Self {
        PerformanceAnalyzer {
            risk_free_rate,
            commission_rate,
        }
    }

    pub fn analyze(&self, run: &RunSummary<'_>) -> PerformanceMetrics {
        let total_return_pct = total_return_pct(run.starting_equity, run.ending_equity);
        let sharpe_ratio = sharpe_ratio(run.returns, self.risk_free_rate);
        let (t_statistic, p_value) = t_test(run.returns);
        let max_drawdown_pct = run.max_drawdown_pct.unwrap_or(0.0);
        let net_return_pct =
            net_return_pct(total_return_pct, run.trade_count, self.commission_rate);

        let metrics = PerformanceMetrics {
            ticker: run.ticker.to_string(),
            total_return_pct,
            sharpe_ratio,
            max_drawdown_pct,
            trade_count: run.trade_count,
            t_statistic,
            p_value,
            net_return_pct,
        };

        info!(
            ticker = %metrics.ticker,
            total_return_pct = format_args!("{:.2}", metrics.total_return_pct),
            sharpe = format_args!("{:.2}", metrics.sharpe_ratio),
            max_drawdown_pct = format_args!("{:.2}", metrics.max_drawdown_pct),
            trades = metrics.trade_count,
            t_stat = format_args!("{:.2}", metrics.t_statistic),
            p_value = format_args!("{:.4}", metrics.p_value),
            net_return_pct = format_args!("{:.2}", metrics.net_return_pct),
            "performance summary"
        );
        metrics
    }
}

pub fn total_return_pct(starting: f64, ending: f64) -> f64 {
    if starting > 0.0 {
        (ending - starting) / starting * 100.0
    } else {
        0.0
    }
}

/// Annualized Sharpe ratio over per-period returns using population stddev.
pub fn sharpe_ratio(returns: &[f64], risk_free_rate: f64) -> f64 {
    if returns.is_empty() {
        return 0.0;
    }
    let excess: Vec<f64> = returns.iter().map(|r| r - risk_free_rate).collect();
    // Constant series: the mean can carry rounding noise that yields a tiny
    // nonzero stddev.
    if excess.iter().all(|r| *r == excess[0]) {
        return 0.0;
    }
    let n = excess.len() as f64;
    let mean = excess.iter().sum::<f64>() / n;
    let variance = excess.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / n;
    let stddev = variance.sqrt();

    if stddev > 0.0 && stddev.is_finite() {
        mean / stddev * TRADING_DAYS_PER_YEAR.sqrt()
    } else {
        0.0
    }
}

/// Two-sided one-sample t test of the mean return against zero.
/// Returns `(t_statistic, p_value)`.
pub fn t_test(returns: &[f64]) -> (f64, f64) {
    let n = returns.len();
    if n < 2 {
        return (0.0, 1.0);
    }
    let nf = n as f64;
    let mean = returns.iter().sum::<f64>() / nf;
    let variance = returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / (nf - 1.0);
    let s = variance.sqrt();

    if s == 0.0 {
        return if mean == 0.0 {
            (0.0, 1.0)
        } else {
            (f64::INFINITY.copysign(mean), 0.0)
        };
    }

    let t = mean / (s / nf.sqrt());
    let p = match StudentsT::new(0.0, 1.0, nf - 1.0) {
        Ok(dist) => (2.0 * (1.0 - dist.cdf(t.abs()))).clamp(0.0, 1.0),
        Err(_) => 1.0,
    };
    (t, p)
}

/// Total return less a flat per-trade commission allowance.
pub fn net_return_pct(total_return_pct: f64, trade_count: usize, commission_rate: f64) -> f64 {
    total_return_pct - trade_count as f64 * commission_rate * 100.0
}

/// Largest peak-to-trough decline in percent; `None` for an empty curve.
pub fn max_drawdown_pct(equity_curve: &[EquityPoint]) -> Option<f64> {
    let first = equity_curve.first()?;
    let mut peak = first.equity;
    let mut max_dd = 0.0_f64;

    for point in equity_curve {
        if point.equity > peak {
            peak = point.equity;
        } else if peak > 0.0 {
            let dd = (peak - point.equity) / peak * 100.0;
            if dd > max_dd {
                max_dd = dd;
            }
        }
    }
    Some(max_dd)
}

/// Per-point percentage below the running peak (zero or negative).
pub fn drawdown_series(equity_curve: &[EquityPoint]) -> Vec<f64> {
    let mut peak = f64::NEG_INFINITY;
    equity_curve
        .iter()
        .map(|p| {
            peak = peak.max(p.equity);
            if peak > 0.0 {
                (p.equity / peak - 1.0) * 100.0
            } else {
                0.0
            }
        })
        .collect()
}

/// Simple per-period returns; the first is measured against `starting_equity`.
pub fn period_returns(starting_equity: f64, equity_curve: &[EquityPoint]) -> Vec<f64> {
    let mut prev = starting_equity;
    equity_curve
        .iter()
        .map(|p| {
            let r = if prev > 0.0 {
                (p.equity - prev) / prev
            } else {
                0.0
            };
            prev = p.equity;
            r
        })
        .collect()
}
