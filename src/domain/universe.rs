//! Ticker universe: parsing the configured list and checking data coverage.

use crate::domain::error::TrendsweepError;
use crate::ports::data_port::DataPort;
use std::collections::HashSet;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum UniverseError {
    #[error("ticker list is empty")]
    Empty,

    #[error("empty token in ticker list")]
    EmptyToken,

    #[error("duplicate ticker: {0}")]
    DuplicateTicker(String),
}

/// Split a comma-separated list into trimmed, upper-cased, unique tickers.
pub fn parse_tickers(input: &str) -> Result<Vec<String>, UniverseError> {
    if input.trim().is_empty() {
        return Err(UniverseError::Empty);
    }

    let mut tickers = Vec::new();
    let mut seen = HashSet::new();
    for token in input.split(',') {
        let trimmed = token.trim();
        if trimmed.is_empty() {
            return Err(UniverseError::EmptyToken);
        }
        let ticker = trimmed.to_uppercase();
        if !seen.insert(ticker.clone()) {
            return Err(UniverseError::DuplicateTicker(ticker));
        }
        tickers.push(ticker);
    }
    Ok(tickers)
}

/// Tickers from `wanted` that the data source has nothing for.
pub fn missing_tickers<D: DataPort + ?Sized>(
    data_port: &D,
    wanted: &[String],
) -> Result<Vec<String>, TrendsweepError> {
    let available: HashSet<String> = data_port
        .list_tickers()?
        .into_iter()
        .map(|t| t.to_uppercase())
        .collect();
    Ok(wanted
        .iter()
        .filter(|t| !available.contains(t.as_str()))
        .cloned()
        .collect())
}
