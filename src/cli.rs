//! CLI definition and dispatch.

use chrono::{Local, NaiveDateTime};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{Level, error, info, warn};

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::csv_sweep_adapter::CsvSweepAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::kv_report_adapter::KvReportAdapter;
use crate::domain::backtest::backtest_ticker;
use crate::domain::config_validation::{AppConfig, load_app_config};
use crate::domain::error::TrendsweepError;
use crate::domain::metrics::{PerformanceAnalyzer, PerformanceMetrics};
use crate::domain::optimization::{OptimizationSweep, SweepOutcome};
use crate::domain::universe::{missing_tickers, parse_tickers};
use crate::ports::data_port::DataPort;
use crate::ports::report_port::MetricsReportPort;

#[derive(Parser, Debug)]
#[command(
    name = "trendsweep",
    about = "Trend-following strategy backtester and parameter optimizer"
)]
pub struct Cli {
    /// Log level (error, warn, info, debug, trace)
    #[arg(short, long, global = true, default_value = "info")]
    pub verbosity: Level,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Backtest the configured strategy on each ticker and write reports
    Backtest {
        #[arg(short, long)]
        config: PathBuf,
        /// Run a single ticker instead of the configured list
        #[arg(long)]
        ticker: Option<String>,
        #[arg(short, long)]
        output_dir: Option<PathBuf>,
    },
    /// Grid-search the moving-average periods for one ticker
    Optimize {
        #[arg(short, long)]
        config: PathBuf,
        /// Ticker to optimize (defaults to the first configured one)
        #[arg(long)]
        ticker: Option<String>,
        #[arg(short, long)]
        output_dir: Option<PathBuf>,
    },
    /// Validate a configuration file and print the resolved settings
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
}

/// Install the stderr `fmt` subscriber.
pub fn init_logging(level: Level) {
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("warning: logging already initialized: {e}");
    }
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Backtest {
            config,
            ticker,
            output_dir,
        } => run_backtest(&config, ticker.as_deref(), output_dir.as_deref()),
        Command::Optimize {
            config,
            ticker,
            output_dir,
        } => run_optimize(&config, ticker.as_deref(), output_dir.as_deref()),
        Command::Validate { config } => run_validate(&config),
    }
}

pub fn load_config(path: &Path) -> Result<AppConfig, TrendsweepError> {
    let adapter = FileConfigAdapter::from_file(path)?;
    load_app_config(&adapter)
}

fn fail(err: &TrendsweepError) -> ExitCode {
    eprintln!("error: {err}");
    err.into()
}

/// Outcome of backtesting several tickers one after another.
#[derive(Debug, Default)]
pub struct BacktestBatch {
    pub metrics: Vec<PerformanceMetrics>,
    pub failures: Vec<(String, TrendsweepError)>,
}

/// Backtest, analyze and report each ticker. A failing ticker does not stop
/// the others.
pub fn backtest_pipeline<D, R>(
    data_port: &D,
    report: &R,
    app: &AppConfig,
    tickers: &[String],
    output_dir: &Path,
) -> BacktestBatch
where
    D: DataPort + ?Sized,
    R: MetricsReportPort + ?Sized,
{
    let analyzer =
        PerformanceAnalyzer::new(app.backtest.risk_free_rate, app.backtest.commission_rate);
    let mut batch = BacktestBatch::default();

    for ticker in tickers {
        let result =
            backtest_ticker(data_port, ticker, &app.strategy, &app.backtest).and_then(|bt| {
                let metrics = analyzer.analyze(&bt.run.summary(ticker));
                report.write_metrics(&metrics, &bt, output_dir)?;
                Ok(metrics)
            });
        match result {
            Ok(metrics) => batch.metrics.push(metrics),
            Err(e) => {
                error!(ticker = %ticker, error = %e, "backtest failed");
                batch.failures.push((ticker.clone(), e));
            }
        }
    }
    batch
}

pub fn optimize_pipeline<D: DataPort + Sync + ?Sized>(
    data_port: &D,
    app: &AppConfig,
    ticker: &str,
    output_dir: &Path,
    now: NaiveDateTime,
) -> Result<SweepOutcome, TrendsweepError> {
    let sweep = OptimizationSweep {
        ticker: ticker.to_string(),
        base_params: app.strategy.clone(),
        backtest: app.backtest.clone(),
        config: app.sweep.clone(),
    };
    sweep.run_and_persist(data_port, &CsvSweepAdapter, output_dir, now)
}

fn resolve_tickers(app: &AppConfig, ticker: Option<&str>) -> Result<Vec<String>, TrendsweepError> {
    match ticker {
        Some(t) => parse_tickers(t).map_err(|e| TrendsweepError::Data {
            reason: format!("--ticker: {e}"),
        }),
        None => Ok(app.tickers.clone()),
    }
}

fn print_metrics(m: &PerformanceMetrics) {
    println!(
        "{:<8} return {:>8.2}%  sharpe {:>6.2}  max dd {:>6.2}%  trades {:>4}  \
         t {:>6.2}  p {:.4}  net {:>8.2}%",
        m.ticker,
        m.total_return_pct,
        m.sharpe_ratio,
        m.max_drawdown_pct,
        m.trade_count,
        m.t_statistic,
        m.p_value,
        m.net_return_pct
    );
}

fn run_backtest(config_path: &Path, ticker: Option<&str>, output_dir: Option<&Path>) -> ExitCode {
    eprintln!("Loading config from {}", config_path.display());
    let app = match load_config(config_path) {
        Ok(a) => a,
        Err(e) => return fail(&e),
    };
    let tickers = match resolve_tickers(&app, ticker) {
        Ok(t) => t,
        Err(e) => return fail(&e),
    };
    let output_dir = output_dir.map_or_else(|| app.report.output_dir.clone(), Path::to_path_buf);

    let data_port = CsvAdapter::new(app.data_dir.clone());
    let report = KvReportAdapter::new(app.report.chart_path.clone());
    info!(tickers = tickers.len(), output_dir = %output_dir.display(), "running backtests");

    let batch = backtest_pipeline(&data_port, &report, &app, &tickers, &output_dir);
    for m in &batch.metrics {
        print_metrics(m);
    }

    match batch.failures.first() {
        None => ExitCode::SUCCESS,
        Some((_, first)) => {
            for (ticker, e) in &batch.failures {
                eprintln!("error: {ticker}: {e}");
            }
            first.into()
        }
    }
}

fn run_optimize(config_path: &Path, ticker: Option<&str>, output_dir: Option<&Path>) -> ExitCode {
    eprintln!("Loading config from {}", config_path.display());
    let app = match load_config(config_path) {
        Ok(a) => a,
        Err(e) => return fail(&e),
    };
    let ticker = match resolve_tickers(&app, ticker) {
        Ok(t) => match t.into_iter().next() {
            Some(first) => first,
            None => {
                eprintln!("error: no ticker to optimize");
                return ExitCode::from(2);
            }
        },
        Err(e) => return fail(&e),
    };
    let output_dir = output_dir.map_or_else(|| app.sweep_output_dir.clone(), Path::to_path_buf);

    let data_port = CsvAdapter::new(app.data_dir.clone());
    let outcome = match optimize_pipeline(
        &data_port,
        &app,
        &ticker,
        &output_dir,
        Local::now().naive_local(),
    ) {
        Ok(o) => o,
        Err(e) => return fail(&e),
    };

    eprintln!(
        "{} grid points written to {}",
        outcome.results.len(),
        outcome.artifact.display()
    );
    match &outcome.best {
        Some(best) => println!(
            "best for {}: {} (score {:.4}, return {:.2}%, drawdown {:.2}%)",
            ticker, best.label, best.score, best.total_return_pct, best.drawdown_pct
        ),
        None => println!("no valid parameter combination for {ticker}"),
    }
    ExitCode::SUCCESS
}

fn run_validate(config_path: &Path) -> ExitCode {
    eprintln!("Validating config: {}", config_path.display());
    let app = match load_config(config_path) {
        Ok(a) => a,
        Err(e) => return fail(&e),
    };

    let p = &app.strategy;
    println!("[backtest]");
    println!("  tickers:         {}", app.tickers.join(", "));
    println!("  date range:      {} .. {}", app.backtest.start_date, app.backtest.end_date);
    println!("  initial capital: {:.2}", app.backtest.initial_capital);
    println!("  commission:      {}", app.backtest.commission_rate);
    println!("  risk-free rate:  {}", app.backtest.risk_free_rate);
    println!("  data dir:        {}", app.data_dir.display());
    println!("[strategy]");
    println!("  sma:             {} / {}", p.fast_ma_period, p.slow_ma_period);
    println!("  risk per trade:  {}", p.risk_per_trade);
    println!("  atr:             {} smoothed over {}", p.atr_period, p.atr_smooth_period);
    println!("  stop:            {} x ATR, min {}", p.trailing_stop_multiplier, p.min_stop_loss);
    println!("[optimization]");
    println!("  fast periods:    {:?}", app.sweep.fast_periods);
    println!("  slow periods:    {:?}", app.sweep.slow_periods);
    println!("  failure dd:      {}", app.sweep.failure_drawdown);
    match app.sweep.workers {
        Some(n) => println!("  workers:         {n}"),
        None => println!("  workers:         auto"),
    }
    println!("  output dir:      {}", app.sweep_output_dir.display());
    println!("[report]");
    println!("  output dir:      {}", app.report.output_dir.display());
    if let Some(chart) = &app.report.chart_path {
        println!("  chart:           {}", chart.display());
    }

    let data_port = CsvAdapter::new(app.data_dir.clone());
    match missing_tickers(&data_port, &app.tickers) {
        Ok(missing) if missing.is_empty() => {}
        Ok(missing) => warn!(tickers = %missing.join(","), "no data file for some tickers"),
        Err(e) => warn!(error = %e, "could not list data directory"),
    }

    eprintln!("\nConfiguration is valid");
    ExitCode::SUCCESS
}
