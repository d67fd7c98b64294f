//! Core domain types and logic.

pub mod ohlcv;
pub mod order;
pub mod position;
pub mod sizing;
pub mod trailing_stop;
pub mod indicator;
pub mod signal;
pub mod strategy;
pub mod execution;
pub mod backtest;
pub mod metrics;
pub mod optimization;
pub mod universe;
pub mod config_validation;
pub mod error;
