//! Concrete adapter implementations for ports.

pub mod csv_adapter;
pub mod csv_sweep_adapter;
pub mod file_config_adapter;
pub mod kv_report_adapter;
