//! Market data access port.

use crate::domain::error::TrendsweepError;
use crate::domain::ohlcv::Bar;
use chrono::NaiveDate;

pub trait DataPort {
    /// Chronological daily bars for `ticker` within `[start, end]`.
    fn fetch_bars(
        &self,
        ticker: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<Bar>, TrendsweepError>;

    fn list_tickers(&self) -> Result<Vec<String>, TrendsweepError>;
}
