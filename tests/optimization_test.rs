//! Optimization sweep over the mock data port.

mod common;

use chrono::NaiveDate;
use common::*;
use std::fs;
use trendsweep::adapters::csv_sweep_adapter::CsvSweepAdapter;
use trendsweep::domain::backtest::{BacktestConfig, backtest_ticker};
use trendsweep::domain::optimization::{
    OptimizationResult, OptimizationSweep, SweepConfig, best_result, evaluate_point, score,
};

fn sweep(ticker: &str, workers: Option<usize>) -> OptimizationSweep {
    OptimizationSweep {
        ticker: ticker.to_string(),
        base_params: fast_params(),
        backtest: sample_config(),
        config: SweepConfig {
            fast_periods: vec![5, 10, 20],
            slow_periods: vec![15, 25],
            failure_drawdown: 100.0,
            workers,
        },
    }
}

fn port() -> MockDataPort {
    MockDataPort::new()
        .with_bars("AAPL", round_trip_bars())
        .with_bars("TSLA", v_shaped_bars())
}

fn labels(results: &[OptimizationResult]) -> Vec<(usize, usize)> {
    results
        .iter()
        .map(|r| (r.fast_ma_period, r.slow_ma_period))
        .collect()
}

#[test]
fn grid_excludes_unordered_pairs() {
    let s = sweep("AAPL", Some(1));
    assert_eq!(s.grid(), vec![(5, 15), (5, 25), (10, 15), (10, 25), (20, 25)]);
}

#[test]
fn results_follow_grid_order() {
    let results = sweep("AAPL", Some(4)).run(&port()).unwrap();
    assert_eq!(
        labels(&results),
        vec![(5, 15), (5, 25), (10, 15), (10, 25), (20, 25)]
    );
    assert_eq!(results[0].label, "fast_ma_period=5, slow_ma_period=15");
}

#[test]
fn parallel_matches_sequential() {
    let data = port();
    let one = sweep("TSLA", Some(1)).run(&data).unwrap();
    let many = sweep("TSLA", Some(4)).run(&data).unwrap();
    assert_eq!(one, many);
}

#[test]
fn scores_match_individual_backtests() {
    let data = port();
    let results = sweep("AAPL", Some(2)).run(&data).unwrap();
    for r in &results {
        let params = fast_params().with_periods(r.fast_ma_period, r.slow_ma_period);
        let bt = backtest_ticker(&data, "AAPL", &params, &sample_config()).unwrap();
        let total = bt.run.total_return_pct();
        let dd = bt.run.max_drawdown_pct.unwrap();
        assert!((r.total_return_pct - total).abs() < 1e-9);
        assert!((r.drawdown_pct - dd).abs() < 1e-9);
        assert!((r.score - score(total, dd)).abs() < 1e-9);
    }
}

#[test]
fn missing_data_yields_sentinels() {
    let results = sweep("NVDA", Some(2)).run(&port()).unwrap();
    assert_eq!(results.len(), 5);
    for r in &results {
        assert_eq!(r.score, 0.0);
        assert_eq!(r.total_return_pct, 0.0);
        assert_eq!(r.drawdown_pct, 100.0);
    }
}

#[test]
fn data_error_yields_sentinel_with_configured_penalty() {
    let data = MockDataPort::new().with_error("AAPL", "unreadable");
    let mut s = sweep("AAPL", Some(1));
    s.config.failure_drawdown = 250.0;
    let results = s.run(&data).unwrap();
    assert!(results.iter().all(|r| r.drawdown_pct == 250.0 && r.score == 0.0));
}

#[test]
fn bad_date_range_yields_sentinels() {
    let mut s = sweep("AAPL", Some(1));
    s.backtest = BacktestConfig {
        start_date: "not-a-date".into(),
        ..sample_config()
    };
    let results = s.run(&port()).unwrap();
    assert!(results.iter().all(|r| r.score == 0.0 && r.drawdown_pct == 100.0));
}

#[test]
fn evaluate_point_reports_success() {
    let r = evaluate_point(&port(), "TSLA", &fast_params(), &sample_config(), 100.0);
    assert_eq!((r.fast_ma_period, r.slow_ma_period), (5, 15));
    assert!(r.total_return_pct > 0.0);
    assert!(r.drawdown_pct < 100.0);
}

#[test]
fn empty_grid_has_no_best() {
    let mut s = sweep("AAPL", Some(1));
    s.config.fast_periods = vec![50];
    let dir = tempfile::TempDir::new().unwrap();
    let now = NaiveDate::from_ymd_opt(2024, 6, 1)
        .unwrap()
        .and_hms_opt(9, 30, 0)
        .unwrap();
    let outcome = s
        .run_and_persist(&port(), &CsvSweepAdapter, dir.path(), now)
        .unwrap();
    assert!(outcome.results.is_empty());
    assert!(outcome.best.is_none());
    assert!(outcome.artifact.exists());
}

#[test]
fn run_and_persist_writes_timestamped_artifact() {
    let dir = tempfile::TempDir::new().unwrap();
    let now = NaiveDate::from_ymd_opt(2024, 6, 1)
        .unwrap()
        .and_hms_opt(9, 30, 0)
        .unwrap();
    let outcome = sweep("AAPL", Some(2))
        .run_and_persist(&port(), &CsvSweepAdapter, dir.path(), now)
        .unwrap();

    assert_eq!(
        outcome.artifact,
        dir.path().join("optimization_results_20240601_0930.csv")
    );
    let content = fs::read_to_string(&outcome.artifact).unwrap();
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(lines.len(), 6);
    assert_eq!(
        lines[0],
        "fast_ma_period,slow_ma_period,score,total_return,drawdown,params_label"
    );
    assert!(lines[1].starts_with("5,15,"));
    assert!(lines[5].starts_with("20,25,"));

    let best = outcome.best.unwrap();
    assert_eq!(Some(&best), best_result(&outcome.results));
    assert!(outcome.results.iter().all(|r| r.score <= best.score));
}
