//! Plain-text metrics report and equity series writer.
//!
//! Produces `report_<TICKER>.txt` (key-value metrics plus a summary) and
//! `<TICKER>_equity.csv` (`date,equity,buy_and_hold,drawdown_pct`).

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::domain::backtest::TickerBacktest;
use crate::domain::error::TrendsweepError;
use crate::domain::metrics::{PerformanceMetrics, drawdown_series};
use crate::ports::report_port::MetricsReportPort;

pub struct KvReportAdapter {
    chart_path: Option<PathBuf>,
}

impl KvReportAdapter {
    pub fn new(chart_path: Option<PathBuf>) -> Self {
        Self { chart_path }
    }

    pub fn report_file_name(ticker: &str) -> String {
        format!("report_{ticker}.txt")
    }

    pub fn equity_file_name(ticker: &str) -> String {
        format!("{ticker}_equity.csv")
    }
}

/// Key-value report text. `commission_paid` is the total charged by the broker.
pub fn render_report(
    metrics: &PerformanceMetrics,
    commission_paid: f64,
    chart_path: Option<&Path>,
) -> String {
    let m = metrics;
    let chart = chart_path
        .map(|c| format!("\nchart: {}\n", c.display()))
        .unwrap_or_default();
    format!(
        "Performance report - {ticker}\n\
         \n\
         ticker: {ticker}\n\
         total_return_pct: {ret:.2}\n\
         sharpe_ratio: {sharpe:.2}\n\
         max_drawdown_pct: {dd:.2}\n\
         trade_count: {trades}\n\
         t_statistic: {t:.2}\n\
         p_value: {p:.4}\n\
         net_return_pct: {net:.2}\n\
         commission_paid: {commission:.2}\n\
         \n\
         Summary: the strategy on {ticker} returned {ret:.2}% in total with a Sharpe ratio \
         of {sharpe:.2} and a maximum drawdown of {dd:.2}%.\n\
         {chart}",
        ticker = m.ticker,
        ret = m.total_return_pct,
        sharpe = m.sharpe_ratio,
        dd = m.max_drawdown_pct,
        trades = m.trade_count,
        t = m.t_statistic,
        p = m.p_value,
        net = m.net_return_pct,
        commission = commission_paid,
    )
}

fn write_equity_csv(backtest: &TickerBacktest, path: &Path) -> Result<(), TrendsweepError> {
    let report_err = |e: csv::Error| TrendsweepError::Report {
        reason: format!("failed to write {}: {}", path.display(), e),
    };
    let mut wtr = csv::Writer::from_path(path).map_err(report_err)?;
    wtr.write_record(["date", "equity", "buy_and_hold", "drawdown_pct"])
        .map_err(report_err)?;

    let curve = &backtest.run.equity_curve;
    let drawdowns = drawdown_series(curve);
    let start = backtest.run.starting_equity;
    let first_close = backtest.bars.first().map(|b| b.close).filter(|c| *c > 0.0);

    for ((point, bar), dd) in curve.iter().zip(&backtest.bars).zip(&drawdowns) {
        let buy_and_hold = first_close.map_or(start, |c0| start * bar.close / c0);
        wtr.write_record([
            point.date.to_string(),
            format!("{:.2}", point.equity),
            format!("{:.2}", buy_and_hold),
            format!("{:.4}", dd),
        ])
        .map_err(report_err)?;
    }
    wtr.flush()?;
    Ok(())
}

impl MetricsReportPort for KvReportAdapter {
    fn write_metrics(
        &self,
        metrics: &PerformanceMetrics,
        backtest: &TickerBacktest,
        output_dir: &Path,
    ) -> Result<Vec<PathBuf>, TrendsweepError> {
        fs::create_dir_all(output_dir)?;

        if let Some(chart) = &self.chart_path {
            if !chart.exists() {
                warn!(ticker = %metrics.ticker, path = %chart.display(), "chart image not found");
            }
        }

        let report_path = output_dir.join(Self::report_file_name(&metrics.ticker));
        fs::write(
            &report_path,
            render_report(metrics, backtest.run.commission_paid, self.chart_path.as_deref()),
        )?;

        let equity_path = output_dir.join(Self::equity_file_name(&metrics.ticker));
        write_equity_csv(backtest, &equity_path)?;

        info!(
            ticker = %metrics.ticker,
            report = %report_path.display(),
            equity = %equity_path.display(),
            "report written"
        );
        Ok(vec![report_path, equity_path])
    }
}
