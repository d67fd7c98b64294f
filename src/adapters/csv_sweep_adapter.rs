//! CSV writer for the optimization result table.

use std::fs;
use std::path::Path;

use crate::domain::error::TrendsweepError;
use crate::domain::optimization::OptimizationResult;
use crate::ports::report_port::SweepReportPort;

pub const SWEEP_HEADER: [&str; 6] = [
    "fast_ma_period",
    "slow_ma_period",
    "score",
    "total_return",
    "drawdown",
    "params_label",
];

pub struct CsvSweepAdapter;

impl SweepReportPort for CsvSweepAdapter {
    fn write_results(
        &self,
        results: &[OptimizationResult],
        path: &Path,
    ) -> Result<(), TrendsweepError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let report_err = |e: csv::Error| TrendsweepError::Report {
            reason: format!("failed to write {}: {}", path.display(), e),
        };
        let mut wtr = csv::Writer::from_path(path).map_err(report_err)?;
        wtr.write_record(SWEEP_HEADER).map_err(report_err)?;
        for r in results {
            wtr.write_record([
                r.fast_ma_period.to_string(),
                r.slow_ma_period.to_string(),
                r.score.to_string(),
                r.total_return_pct.to_string(),
                r.drawdown_pct.to_string(),
                r.label.clone(),
            ])
            .map_err(report_err)?;
        }
        wtr.flush()?;
        Ok(())
    }
}
