//! Grid-search optimization of the moving-average periods.
//!
//! Each grid point is an independent backtest run on a private rayon pool.
//! Points that cannot be evaluated produce a sentinel result instead of
//! aborting the sweep.

use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use rayon::prelude::*;
use tracing::{info, info_span, warn};

use super::backtest::{BacktestConfig, backtest_ticker};
use super::error::TrendsweepError;
use super::strategy::StrategyParams;
use crate::ports::data_port::DataPort;
use crate::ports::report_port::SweepReportPort;

pub const DEFAULT_FAILURE_DRAWDOWN: f64 = 100.0;

#[derive(Debug, Clone, PartialEq)]
pub struct OptimizationResult {
    pub fast_ma_period: usize,
    pub slow_ma_period: usize,
    pub score: f64,
    pub total_return_pct: f64,
    pub drawdown_pct: f64,
    pub label: String,
}

impl OptimizationResult {
    pub fn new(fast: usize, slow: usize, total_return_pct: f64, drawdown_pct: f64) -> Self {
        OptimizationResult {
            fast_ma_period: fast,
            slow_ma_period: slow,
            score: score(total_return_pct, drawdown_pct),
            total_return_pct,
            drawdown_pct,
            label: params_label(fast, slow),
        }
    }

    /// Result recorded for a grid point that could not be evaluated.
    pub fn sentinel(fast: usize, slow: usize, failure_drawdown: f64) -> Self {
        OptimizationResult {
            fast_ma_period: fast,
            slow_ma_period: slow,
            score: 0.0,
            total_return_pct: 0.0,
            drawdown_pct: failure_drawdown,
            label: params_label(fast, slow),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SweepConfig {
    pub fast_periods: Vec<usize>,
    pub slow_periods: Vec<usize>,
    pub failure_drawdown: f64,
    /// `None` sizes the pool from the machine.
    pub workers: Option<usize>,
}

impl Default for SweepConfig {
    fn default() -> Self {
        SweepConfig {
            fast_periods: vec![5, 10, 20],
            slow_periods: vec![15, 25, 50],
            failure_drawdown: DEFAULT_FAILURE_DRAWDOWN,
            workers: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SweepOutcome {
    pub results: Vec<OptimizationResult>,
    pub best: Option<OptimizationResult>,
    pub artifact: PathBuf,
}

/// Fast-major cartesian product keeping only `slow > fast`.
pub fn ordered_pairs(fast: &[usize], slow: &[usize]) -> Vec<(usize, usize)> {
    fast.iter()
        .flat_map(|&f| slow.iter().filter(move |&&s| s > f).map(move |&s| (f, s)))
        .collect()
}

/// Return scaled down by drawdown; drawdowns under 1% do not inflate it.
pub fn score(total_return_pct: f64, drawdown_pct: f64) -> f64 {
    total_return_pct / drawdown_pct.max(1.0)
}

pub fn params_label(fast: usize, slow: usize) -> String {
    format!("fast_ma_period={fast}, slow_ma_period={slow}")
}

/// Half the available cores, at least one.
pub fn default_worker_count() -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    (cores / 2).max(1)
}

pub fn sweep_artifact_name(now: NaiveDateTime) -> String {
    format!("optimization_results_{}.csv", now.format("%Y%m%d_%H%M"))
}

/// Highest score; the earliest grid point wins ties.
pub fn best_result(results: &[OptimizationResult]) -> Option<&OptimizationResult> {
    results.iter().fold(None, |best, r| match best {
        Some(b) if b.score >= r.score => Some(b),
        _ => Some(r),
    })
}

/// Backtest one grid point. Any failure becomes a sentinel.
pub fn evaluate_point<D: DataPort + ?Sized>(
    data_port: &D,
    ticker: &str,
    params: &StrategyParams,
    config: &BacktestConfig,
    failure_drawdown: f64,
) -> OptimizationResult {
    let fast = params.fast_ma_period;
    let slow = params.slow_ma_period;
    let span = info_span!("grid_point", ticker, fast, slow);
    let _enter = span.enter();

    match backtest_ticker(data_port, ticker, params, config) {
        Ok(bt) => {
            let total_return = bt.run.total_return_pct();
            let drawdown = bt.run.max_drawdown_pct.unwrap_or(failure_drawdown);
            let result = OptimizationResult::new(fast, slow, total_return, drawdown);
            info!(
                score = format_args!("{:.4}", result.score),
                total_return_pct = format_args!("{:.2}", total_return),
                drawdown_pct = format_args!("{:.2}", drawdown),
                "grid point evaluated"
            );
            result
        }
        Err(e) => {
            warn!(error = %e, "grid point failed, recording sentinel");
            OptimizationResult::sentinel(fast, slow, failure_drawdown)
        }
    }
}

pub struct OptimizationSweep {
    pub ticker: String,
    pub base_params: StrategyParams,
    pub backtest: BacktestConfig,
    pub config: SweepConfig,
}

impl OptimizationSweep {
    pub fn grid(&self) -> Vec<(usize, usize)> {
        ordered_pairs(&self.config.fast_periods, &self.config.slow_periods)
    }

    pub fn worker_count(&self) -> usize {
        self.config
            .workers
            .filter(|&n| n > 0)
            .unwrap_or_else(default_worker_count)
    }

    /// Evaluate every grid point; results are in grid order.
    pub fn run<D: DataPort + Sync + ?Sized>(
        &self,
        data_port: &D,
    ) -> Result<Vec<OptimizationResult>, TrendsweepError> {
        let grid = self.grid();
        let workers = self.worker_count();
        info!(
            ticker = %self.ticker,
            points = grid.len(),
            workers,
            "starting optimization sweep"
        );

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .build()
            .map_err(|e| TrendsweepError::ThreadPool {
                reason: e.to_string(),
            })?;

        let results = pool.install(|| {
            grid.par_iter()
                .map(|&(fast, slow)| {
                    let params = self.base_params.with_periods(fast, slow);
                    evaluate_point(
                        data_port,
                        &self.ticker,
                        &params,
                        &self.backtest,
                        self.config.failure_drawdown,
                    )
                })
                .collect::<Vec<_>>()
        });
        Ok(results)
    }

    /// Run the sweep, persist every result and pick the best.
    pub fn run_and_persist<D, R>(
        &self,
        data_port: &D,
        report: &R,
        output_dir: &Path,
        now: NaiveDateTime,
    ) -> Result<SweepOutcome, TrendsweepError>
    where
        D: DataPort + Sync + ?Sized,
        R: SweepReportPort + ?Sized,
    {
        let results = self.run(data_port)?;

        let best = best_result(&results).cloned();
        match &best {
            Some(b) => info!(
                params = %b.label,
                score = format_args!("{:.4}", b.score),
                total_return_pct = format_args!("{:.2}", b.total_return_pct),
                drawdown_pct = format_args!("{:.2}", b.drawdown_pct),
                "best parameters"
            ),
            None => warn!(ticker = %self.ticker, "parameter grid is empty, no best result"),
        }

        let artifact = output_dir.join(sweep_artifact_name(now));
        report.write_results(&results, &artifact)?;
        info!(path = %artifact.display(), rows = results.len(), "optimization results written");

        Ok(SweepOutcome {
            results,
            best,
            artifact,
        })
    }
}
