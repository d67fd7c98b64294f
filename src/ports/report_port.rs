//! Report output ports.

use std::path::{Path, PathBuf};

use crate::domain::backtest::TickerBacktest;
use crate::domain::error::TrendsweepError;
use crate::domain::metrics::PerformanceMetrics;
use crate::domain::optimization::OptimizationResult;

/// Writes the per-ticker metrics report and its equity series.
pub trait MetricsReportPort {
    /// Returns the paths of every file written.
    fn write_metrics(
        &self,
        metrics: &PerformanceMetrics,
        backtest: &TickerBacktest,
        output_dir: &Path,
    ) -> Result<Vec<PathBuf>, TrendsweepError>;
}

/// Persists the full optimization result table.
pub trait SweepReportPort {
    fn write_results(
        &self,
        results: &[OptimizationResult],
        path: &Path,
    ) -> Result<(), TrendsweepError>;
}
