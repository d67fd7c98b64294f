//! CSV file data adapter.
//!
//! Reads `<base_path>/<TICKER>.csv` with a header row. Column names are
//! matched case-insensitively; `adj close` stands in for a missing `close`.
//! Empty or `NaN` cells are forward-filled from the previous row.

use crate::domain::error::TrendsweepError;
use crate::domain::ohlcv::Bar;
use crate::ports::data_port::DataPort;
use chrono::NaiveDate;
use std::fs;
use std::path::PathBuf;
use tracing::{debug, warn};

const DATE_FORMAT: &str = "%Y-%m-%d";

pub struct CsvAdapter {
    base_path: PathBuf,
}

/// Column positions resolved from the header row.
#[derive(Debug, Clone, Copy)]
struct Columns {
    date: usize,
    open: usize,
    high: usize,
    low: usize,
    close: usize,
    volume: usize,
}

type RawRow = (NaiveDate, [Option<f64>; 5]);

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn csv_path(&self, ticker: &str) -> PathBuf {
        self.base_path.join(format!("{}.csv", ticker))
    }

    fn resolve_columns(
        headers: &csv::StringRecord,
        ticker: &str,
    ) -> Result<Columns, TrendsweepError> {
        let names: Vec<String> = headers.iter().map(|h| h.trim().to_lowercase()).collect();
        let find = |name: &str| names.iter().position(|h| h == name);
        let require = |name: &str| {
            find(name).ok_or_else(|| TrendsweepError::Data {
                reason: format!("{ticker}: missing '{name}' column"),
            })
        };

        let close = match find("close") {
            Some(i) => i,
            None => {
                let adj = find("adj close")
                    .or_else(|| find("adj_close"))
                    .ok_or_else(|| TrendsweepError::Data {
                        reason: format!("{ticker}: missing 'close' column"),
                    })?;
                warn!(ticker, "no 'close' column, using 'adj close'");
                adj
            }
        };

        Ok(Columns {
            date: require("date")?,
            open: require("open")?,
            high: require("high")?,
            low: require("low")?,
            close,
            volume: require("volume")?,
        })
    }

    fn parse_cell(
        record: &csv::StringRecord,
        index: usize,
        ticker: &str,
        line: u64,
    ) -> Result<Option<f64>, TrendsweepError> {
        let raw = record.get(index).unwrap_or("").trim();
        if raw.is_empty() || raw.eq_ignore_ascii_case("nan") {
            return Ok(None);
        }
        let value: f64 = raw.parse().map_err(|e| TrendsweepError::Data {
            reason: format!("{ticker} line {line}: invalid number '{raw}': {e}"),
        })?;
        Ok(value.is_finite().then_some(value))
    }

    fn read_rows(&self, ticker: &str, content: &str) -> Result<Vec<RawRow>, TrendsweepError> {
        let mut rdr = csv::ReaderBuilder::new()
            .flexible(true)
            .from_reader(content.as_bytes());
        let headers = rdr.headers().map_err(|e| TrendsweepError::Data {
            reason: format!("{ticker}: CSV header error: {e}"),
        })?;
        let cols = Self::resolve_columns(headers, ticker)?;

        let mut rows = Vec::new();
        for result in rdr.records() {
            let record = result.map_err(|e| TrendsweepError::Data {
                reason: format!("{ticker}: CSV parse error: {e}"),
            })?;
            let line = record.position().map_or(0, |p| p.line());

            let date_str = record.get(cols.date).unwrap_or("").trim();
            let date = NaiveDate::parse_from_str(date_str, DATE_FORMAT).map_err(|e| {
                TrendsweepError::Data {
                    reason: format!("{ticker} line {line}: invalid date '{date_str}': {e}"),
                }
            })?;

            let mut values = [None; 5];
            for (slot, index) in values
                .iter_mut()
                .zip([cols.open, cols.high, cols.low, cols.close, cols.volume])
            {
                *slot = Self::parse_cell(&record, index, ticker, line)?;
            }
            rows.push((date, values));
        }
        rows.sort_by_key(|(date, _)| *date);
        Ok(rows)
    }
}

/// Fill gaps from the previous complete row; rows before the first complete
/// one are dropped. Returns the bars, filled cell count and dropped row count.
fn forward_fill(rows: Vec<RawRow>) -> (Vec<Bar>, usize, usize) {
    let mut bars = Vec::with_capacity(rows.len());
    let mut prev: Option<[f64; 5]> = None;
    let mut filled = 0usize;
    let mut dropped = 0usize;

    for (date, cells) in rows {
        let mut values = [0.0; 5];
        let mut complete = true;
        for (i, cell) in cells.iter().enumerate() {
            match (cell, prev) {
                (Some(v), _) => values[i] = *v,
                (None, Some(p)) => {
                    values[i] = p[i];
                    filled += 1;
                }
                (None, None) => complete = false,
            }
        }
        if !complete {
            dropped += 1;
            continue;
        }
        prev = Some(values);
        let [open, high, low, close, volume] = values;
        bars.push(Bar {
            date,
            open,
            high,
            low,
            close,
            volume,
        });
    }
    (bars, filled, dropped)
}

impl DataPort for CsvAdapter {
    fn fetch_bars(
        &self,
        ticker: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<Bar>, TrendsweepError> {
        let path = self.csv_path(ticker);
        if !path.exists() {
            warn!(ticker, path = %path.display(), "no data file");
            return Err(TrendsweepError::NoData {
                ticker: ticker.to_string(),
                start: start.to_string(),
                end: end.to_string(),
            });
        }
        let content = fs::read_to_string(&path).map_err(|e| TrendsweepError::Data {
            reason: format!("failed to read {}: {}", path.display(), e),
        })?;

        let rows = self.read_rows(ticker, &content)?;
        let (bars, filled, dropped) = forward_fill(rows);
        if filled > 0 {
            warn!(ticker, cells = filled, "missing values forward-filled");
        }
        if dropped > 0 {
            warn!(ticker, rows = dropped, "leading incomplete rows dropped");
        }

        let bars: Vec<Bar> = bars
            .into_iter()
            .filter(|b| b.date >= start && b.date <= end)
            .collect();
        debug!(ticker, bars = bars.len(), %start, %end, "bars loaded");
        Ok(bars)
    }

    fn list_tickers(&self) -> Result<Vec<String>, TrendsweepError> {
        let entries = fs::read_dir(&self.base_path).map_err(|e| TrendsweepError::Data {
            reason: format!(
                "failed to read directory {}: {}",
                self.base_path.display(),
                e
            ),
        })?;

        let mut tickers = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| TrendsweepError::Data {
                reason: format!("directory entry error: {}", e),
            })?;
            let path = entry.path();
            let is_csv = path
                .extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));
            if !is_csv {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                tickers.push(stem.to_string());
            }
        }

        tickers.sort();
        Ok(tickers)
    }
}
