//! Configuration loading and validation.
//!
//! Resolves every section into typed settings, falling back to the default
//! strategy configuration for absent keys. Dates are kept as text and parsed
//! per run.

use std::path::PathBuf;

use crate::domain::backtest::BacktestConfig;
use crate::domain::error::TrendsweepError;
use crate::domain::optimization::SweepConfig;
use crate::domain::strategy::StrategyParams;
use crate::domain::universe::parse_tickers;
use crate::ports::config_port::ConfigPort;

#[derive(Debug, Clone, PartialEq)]
pub struct ReportSettings {
    pub output_dir: PathBuf,
    pub chart_path: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub tickers: Vec<String>,
    pub data_dir: PathBuf,
    pub backtest: BacktestConfig,
    pub strategy: StrategyParams,
    pub sweep: SweepConfig,
    pub sweep_output_dir: PathBuf,
    pub report: ReportSettings,
}

pub fn load_app_config(config: &dyn ConfigPort) -> Result<AppConfig, TrendsweepError> {
    let tickers = load_tickers(config)?;
    let backtest = load_backtest_config(config)?;
    let strategy = load_strategy_params(config, backtest.commission_rate)?;
    let sweep = load_sweep_config(config)?;

    Ok(AppConfig {
        tickers,
        data_dir: path_or(config, "backtest", "data_dir", "data"),
        backtest,
        strategy,
        sweep,
        sweep_output_dir: path_or(config, "optimization", "output_dir", "."),
        report: ReportSettings {
            output_dir: path_or(config, "report", "output_dir", "reports"),
            chart_path: non_empty(config, "report", "chart_path").map(PathBuf::from),
        },
    })
}

fn load_tickers(config: &dyn ConfigPort) -> Result<Vec<String>, TrendsweepError> {
    let raw = non_empty(config, "backtest", "tickers").ok_or_else(|| {
        TrendsweepError::ConfigMissing {
            section: "backtest".to_string(),
            key: "tickers".to_string(),
        }
    })?;
    parse_tickers(&raw)
        .map_err(|e| TrendsweepError::config_invalid("backtest", "tickers", e.to_string()))
}

pub fn load_backtest_config(config: &dyn ConfigPort) -> Result<BacktestConfig, TrendsweepError> {
    let defaults = BacktestConfig::default();

    let initial_capital =
        double_or(config, "backtest", "initial_capital", defaults.initial_capital)?;
    if initial_capital <= 0.0 {
        return Err(TrendsweepError::config_invalid(
            "backtest",
            "initial_capital",
            "initial_capital must be positive",
        ));
    }

    let commission_rate = double_or(config, "backtest", "commission", defaults.commission_rate)?;
    check_unit_interval("backtest", "commission", commission_rate)?;

    let risk_free_rate = double_or(config, "backtest", "risk_free_rate", defaults.risk_free_rate)?;
    check_unit_interval("backtest", "risk_free_rate", risk_free_rate)?;

    Ok(BacktestConfig {
        start_date: non_empty(config, "backtest", "start_date").unwrap_or(defaults.start_date),
        end_date: non_empty(config, "backtest", "end_date").unwrap_or(defaults.end_date),
        initial_capital,
        commission_rate,
        risk_free_rate,
    })
}

pub fn load_strategy_params(
    config: &dyn ConfigPort,
    commission_rate: f64,
) -> Result<StrategyParams, TrendsweepError> {
    let defaults = StrategyParams::default();

    let fast_ma_period = period_or(config, "fast_ma_period", defaults.fast_ma_period)?;
    let slow_ma_period = period_or(config, "slow_ma_period", defaults.slow_ma_period)?;
    if fast_ma_period >= slow_ma_period {
        return Err(TrendsweepError::config_invalid(
            "strategy",
            "fast_ma_period",
            "fast_ma_period must be less than slow_ma_period",
        ));
    }

    let risk_per_trade = double_or(config, "strategy", "risk_per_trade", defaults.risk_per_trade)?;
    if risk_per_trade <= 0.0 || risk_per_trade > 1.0 {
        return Err(TrendsweepError::config_invalid(
            "strategy",
            "risk_per_trade",
            "risk_per_trade must be in (0, 1]",
        ));
    }

    let trailing_stop_multiplier = double_or(
        config,
        "strategy",
        "trailing_stop_multiplier",
        defaults.trailing_stop_multiplier,
    )?;
    if trailing_stop_multiplier <= 0.0 {
        return Err(TrendsweepError::config_invalid(
            "strategy",
            "trailing_stop_multiplier",
            "trailing_stop_multiplier must be positive",
        ));
    }

    let min_stop_loss = double_or(config, "strategy", "min_stop_loss", defaults.min_stop_loss)?;
    if min_stop_loss < 0.0 {
        return Err(TrendsweepError::config_invalid(
            "strategy",
            "min_stop_loss",
            "min_stop_loss must be non-negative",
        ));
    }

    Ok(StrategyParams {
        fast_ma_period,
        slow_ma_period,
        risk_per_trade,
        atr_period: period_or(config, "atr_period", defaults.atr_period)?,
        atr_smooth_period: period_or(config, "atr_smooth_period", defaults.atr_smooth_period)?,
        trailing_stop_multiplier,
        min_stop_loss,
        commission: commission_rate,
    })
}

pub fn load_sweep_config(config: &dyn ConfigPort) -> Result<SweepConfig, TrendsweepError> {
    let defaults = SweepConfig::default();

    let fast_periods = match non_empty(config, "optimization", "fast_periods") {
        Some(raw) => parse_period_list(&raw)
            .map_err(|e| TrendsweepError::config_invalid("optimization", "fast_periods", e))?,
        None => defaults.fast_periods,
    };
    let slow_periods = match non_empty(config, "optimization", "slow_periods") {
        Some(raw) => parse_period_list(&raw)
            .map_err(|e| TrendsweepError::config_invalid("optimization", "slow_periods", e))?,
        None => defaults.slow_periods,
    };

    let failure_drawdown = double_or(
        config,
        "optimization",
        "failure_drawdown",
        defaults.failure_drawdown,
    )?;
    if failure_drawdown < 0.0 || !failure_drawdown.is_finite() {
        return Err(TrendsweepError::config_invalid(
            "optimization",
            "failure_drawdown",
            "failure_drawdown must be a non-negative number",
        ));
    }

    let workers = int_or(config, "optimization", "workers", 0)?;
    if workers < 0 {
        return Err(TrendsweepError::config_invalid(
            "optimization",
            "workers",
            "workers must be non-negative (0 = automatic)",
        ));
    }

    Ok(SweepConfig {
        fast_periods,
        slow_periods,
        failure_drawdown,
        workers: (workers > 0).then_some(workers as usize),
    })
}

/// Comma-separated list of positive integers.
pub fn parse_period_list(input: &str) -> Result<Vec<usize>, String> {
    let periods = input
        .split(',')
        .map(|token| {
            let token = token.trim();
            match token.parse::<usize>() {
                Ok(0) => Err("periods must be positive".to_string()),
                Ok(p) => Ok(p),
                Err(_) => Err(format!("'{token}' is not a positive integer")),
            }
        })
        .collect::<Result<Vec<_>, _>>()?;
    if periods.is_empty() {
        return Err("candidate list is empty".to_string());
    }
    Ok(periods)
}

fn non_empty(config: &dyn ConfigPort, section: &str, key: &str) -> Option<String> {
    config
        .get_string(section, key)
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn path_or(config: &dyn ConfigPort, section: &str, key: &str, default: &str) -> PathBuf {
    PathBuf::from(non_empty(config, section, key).unwrap_or_else(|| default.to_string()))
}

fn double_or(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: f64,
) -> Result<f64, TrendsweepError> {
    let value = config
        .get_double(section, key)
        .map_err(|e| TrendsweepError::config_invalid(section, key, e))?;
    Ok(value.unwrap_or(default))
}

fn int_or(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: i64,
) -> Result<i64, TrendsweepError> {
    let value = config
        .get_int(section, key)
        .map_err(|e| TrendsweepError::config_invalid(section, key, e))?;
    Ok(value.unwrap_or(default))
}

fn period_or(config: &dyn ConfigPort, key: &str, default: usize) -> Result<usize, TrendsweepError> {
    let value = int_or(config, "strategy", key, default as i64)?;
    if value < 1 {
        return Err(TrendsweepError::config_invalid(
            "strategy",
            key,
            format!("{key} must be at least 1"),
        ));
    }
    Ok(value as usize)
}

fn check_unit_interval(section: &str, key: &str, value: f64) -> Result<(), TrendsweepError> {
    if !(0.0..1.0).contains(&value) {
        return Err(TrendsweepError::config_invalid(
            section,
            key,
            format!("{key} must be in [0, 1)"),
        ));
    }
    Ok(())
}
