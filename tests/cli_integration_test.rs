//! CLI orchestration tests with real INI and CSV files on disk.

mod common;

use chrono::NaiveDate;
use common::*;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use trendsweep::adapters::csv_adapter::CsvAdapter;
use trendsweep::adapters::kv_report_adapter::KvReportAdapter;
use trendsweep::cli::{self, Cli, Command};
use trendsweep::domain::error::TrendsweepError;

fn write_temp_ini(content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

fn write_bars_csv(dir: &Path, ticker: &str, bars: &[Bar]) {
    let mut content = String::from("date,open,high,low,close,volume\n");
    for b in bars {
        content.push_str(&format!(
            "{},{},{},{},{},{}\n",
            b.date, b.open, b.high, b.low, b.close, b.volume
        ));
    }
    std::fs::write(dir.join(format!("{ticker}.csv")), content).unwrap();
}

fn ini_for(data_dir: &Path, out_dir: &Path) -> String {
    format!(
        r#"
[backtest]
tickers = AAPL, TSLA
start_date = 2020-01-01
end_date = 2020-12-31
initial_capital = 100000
commission = 0.001
data_dir = {data}

[strategy]
fast_ma_period = 5
slow_ma_period = 15

[optimization]
fast_periods = 5,10
slow_periods = 15,25
workers = 2
output_dir = {out}

[report]
output_dir = {out}
"#,
        data = data_dir.display(),
        out = out_dir.display()
    )
}

fn same_exit(a: ExitCode, b: ExitCode) -> bool {
    format!("{a:?}") == format!("{b:?}")
}

mod config_loading {
    use super::*;

    #[test]
    fn load_config_resolves_file() {
        let file = write_temp_ini(&ini_for(Path::new("prices"), Path::new("out")));
        let app = cli::load_config(file.path()).unwrap();
        assert_eq!(app.tickers, vec!["AAPL", "TSLA"]);
        assert_eq!(app.data_dir, PathBuf::from("prices"));
        assert_eq!(app.strategy.fast_ma_period, 5);
        assert_eq!(app.sweep.fast_periods, vec![5, 10]);
        assert_eq!(app.sweep.workers, Some(2));
    }

    #[test]
    fn missing_file_is_config_parse_error() {
        let err = cli::load_config(Path::new("/nonexistent/trendsweep.ini")).unwrap_err();
        assert!(matches!(err, TrendsweepError::ConfigParse { .. }));
    }

    #[test]
    fn invalid_values_are_rejected() {
        let file = write_temp_ini(
            "[backtest]\ntickers = AAPL\n[strategy]\nfast_ma_period = 40\nslow_ma_period = 20\n",
        );
        let err = cli::load_config(file.path()).unwrap_err();
        assert!(matches!(err, TrendsweepError::ConfigInvalid { .. }));
    }
}

mod pipelines {
    use super::*;

    #[test]
    fn backtest_pipeline_writes_reports_for_each_ticker() {
        let data = tempfile::TempDir::new().unwrap();
        let out = tempfile::TempDir::new().unwrap();
        write_bars_csv(data.path(), "AAPL", &round_trip_bars());
        write_bars_csv(data.path(), "TSLA", &v_shaped_bars());

        let file = write_temp_ini(&ini_for(data.path(), out.path()));
        let app = cli::load_config(file.path()).unwrap();
        let batch = cli::backtest_pipeline(
            &CsvAdapter::new(app.data_dir.clone()),
            &KvReportAdapter::new(None),
            &app,
            &app.tickers,
            &app.report.output_dir,
        );

        assert!(batch.failures.is_empty());
        assert_eq!(batch.metrics.len(), 2);
        for ticker in ["AAPL", "TSLA"] {
            assert!(out.path().join(format!("report_{ticker}.txt")).exists());
            assert!(out.path().join(format!("{ticker}_equity.csv")).exists());
        }
    }

    #[test]
    fn optimize_pipeline_writes_artifact() {
        let data = tempfile::TempDir::new().unwrap();
        let out = tempfile::TempDir::new().unwrap();
        write_bars_csv(data.path(), "AAPL", &round_trip_bars());

        let file = write_temp_ini(&ini_for(data.path(), out.path()));
        let app = cli::load_config(file.path()).unwrap();
        let now = NaiveDate::from_ymd_opt(2025, 1, 2)
            .unwrap()
            .and_hms_opt(23, 59, 10)
            .unwrap();
        let outcome = cli::optimize_pipeline(
            &CsvAdapter::new(app.data_dir.clone()),
            &app,
            "AAPL",
            &app.sweep_output_dir,
            now,
        )
        .unwrap();

        assert_eq!(outcome.results.len(), 4);
        assert_eq!(
            outcome.artifact,
            out.path().join("optimization_results_20250102_2359.csv")
        );
        assert!(outcome.artifact.exists());
        assert!(outcome.best.is_some());
    }

    #[test]
    fn run_backtest_command_fails_for_missing_ticker_data() {
        let data = tempfile::TempDir::new().unwrap();
        let out = tempfile::TempDir::new().unwrap();
        write_bars_csv(data.path(), "AAPL", &round_trip_bars());
        let file = write_temp_ini(&ini_for(data.path(), out.path()));

        let code = cli::run(Cli {
            verbosity: tracing::Level::ERROR,
            command: Command::Backtest {
                config: file.path().to_path_buf(),
                ticker: None,
                output_dir: None,
            },
        });
        // TSLA has no file: NoData
        let no_data = TrendsweepError::NoData {
            ticker: "TSLA".into(),
            start: String::new(),
            end: String::new(),
        };
        assert!(same_exit(code, ExitCode::from(&no_data)));
        assert!(out.path().join("report_AAPL.txt").exists());
    }

    #[test]
    fn run_validate_command_succeeds() {
        let data = tempfile::TempDir::new().unwrap();
        let file = write_temp_ini(&ini_for(data.path(), data.path()));
        let code = cli::run(Cli {
            verbosity: tracing::Level::ERROR,
            command: Command::Validate {
                config: file.path().to_path_buf(),
            },
        });
        assert!(same_exit(code, ExitCode::SUCCESS));
    }

    #[test]
    fn run_optimize_with_ticker_override() {
        let data = tempfile::TempDir::new().unwrap();
        let out = tempfile::TempDir::new().unwrap();
        write_bars_csv(data.path(), "TSLA", &v_shaped_bars());
        let file = write_temp_ini(&ini_for(data.path(), data.path()));

        let code = cli::run(Cli {
            verbosity: tracing::Level::ERROR,
            command: Command::Optimize {
                config: file.path().to_path_buf(),
                ticker: Some("tsla".into()),
                output_dir: Some(out.path().to_path_buf()),
            },
        });
        assert!(same_exit(code, ExitCode::SUCCESS));

        let written: Vec<_> = std::fs::read_dir(out.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .map(|e| e.file_name().to_string_lossy().to_string())
            .collect();
        assert_eq!(written.len(), 1);
        assert!(written[0].starts_with("optimization_results_"));
        assert!(written[0].ends_with(".csv"));
    }
}
