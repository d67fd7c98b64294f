//! Port traits decoupling the domain from files and formats.

pub mod config_port;
pub mod data_port;
pub mod report_port;
