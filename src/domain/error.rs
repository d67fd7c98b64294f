//! Domain error types.

/// Top-level error type for trendsweep.
#[derive(Debug, thiserror::Error)]
pub enum TrendsweepError {
    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("invalid date range {start}..{end} for {ticker}: {reason} (expected YYYY-MM-DD)")]
    InvalidDateRange {
        ticker: String,
        start: String,
        end: String,
        reason: String,
    },

    #[error("no data for {ticker} between {start} and {end}")]
    NoData {
        ticker: String,
        start: String,
        end: String,
    },

    #[error("data error: {reason}")]
    Data { reason: String },

    #[error("report error: {reason}")]
    Report { reason: String },

    #[error("failed to build worker pool: {reason}")]
    ThreadPool { reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl TrendsweepError {
    pub fn config_invalid(section: &str, key: &str, reason: impl Into<String>) -> Self {
        TrendsweepError::ConfigInvalid {
            section: section.to_string(),
            key: key.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<&TrendsweepError> for std::process::ExitCode {
    fn from(err: &TrendsweepError) -> Self {
        let code: u8 = match err {
            TrendsweepError::Io(_) | TrendsweepError::ThreadPool { .. } => 1,
            TrendsweepError::ConfigParse { .. }
            | TrendsweepError::ConfigMissing { .. }
            | TrendsweepError::ConfigInvalid { .. } => 2,
            TrendsweepError::Data { .. } => 3,
            TrendsweepError::InvalidDateRange { .. } => 4,
            TrendsweepError::NoData { .. } => 5,
            TrendsweepError::Report { .. } => 6,
        };
        std::process::ExitCode::from(code)
    }
}
