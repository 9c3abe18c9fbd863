//! CSV directory price source.
//!
//! One `<TICKER>.csv` per symbol with columns `date,open,high,low,close,volume`,
//! plus an optional `names.csv` (`ticker,name`) for display names.

use crate::domain::error::DashboardError;
use crate::domain::ohlcv::{self, PriceBar};
use crate::ports::price_port::PriceSource;
use chrono::NaiveDate;
use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

pub const NAMES_FILE: &str = "names.csv";

pub struct CsvPriceSource {
    base_path: PathBuf,
    names: HashMap<String, String>,
}

impl CsvPriceSource {
    pub fn new(base_path: PathBuf) -> Self {
        let names = load_names(&base_path.join(NAMES_FILE));
        Self { base_path, names }
    }

    fn csv_path(&self, ticker: &str) -> PathBuf {
        self.base_path.join(format!("{}.csv", ticker))
    }
}

fn load_names(path: &Path) -> HashMap<String, String> {
    let mut names = HashMap::new();
    let mut rdr = match csv::Reader::from_path(path) {
        Ok(r) => r,
        Err(e) => {
            debug!(path = %path.display(), error = %e, "no display names loaded");
            return names;
        }
    };
    for record in rdr.records() {
        match record {
            Ok(rec) => {
                if let (Some(ticker), Some(name)) = (rec.get(0), rec.get(1)) {
                    names.insert(ticker.trim().to_uppercase(), name.trim().to_string());
                }
            }
            Err(e) => warn!(path = %path.display(), error = %e, "skipping bad names row"),
        }
    }
    names
}

fn unavailable(ticker: &str, reason: String) -> DashboardError {
    DashboardError::DataUnavailable {
        ticker: ticker.to_string(),
        reason,
    }
}

/// Prices must be finite and strictly positive.
fn parse_price(
    record: &csv::StringRecord,
    idx: usize,
    column: &str,
    ticker: &str,
) -> Result<f64, DashboardError> {
    let raw = record
        .get(idx)
        .ok_or_else(|| unavailable(ticker, format!("missing {} column", column)))?
        .trim();
    let value: f64 = raw
        .parse()
        .map_err(|e| unavailable(ticker, format!("invalid {} value: {}", column, e)))?;
    if !value.is_finite() || value <= 0.0 {
        return Err(unavailable(
            ticker,
            format!("{} must be a positive number, got {}", column, raw),
        ));
    }
    Ok(value)
}

fn parse_volume(record: &csv::StringRecord, ticker: &str) -> Result<u64, DashboardError> {
    let raw = record
        .get(5)
        .ok_or_else(|| unavailable(ticker, "missing volume column".into()))?
        .trim();
    if let Ok(v) = raw.parse::<u64>() {
        return Ok(v);
    }
    match raw.parse::<f64>() {
        Ok(v) if v >= 0.0 && v.is_finite() => Ok(v.round() as u64),
        _ => Err(unavailable(ticker, format!("invalid volume value: {}", raw))),
    }
}

impl PriceSource for CsvPriceSource {
    fn fetch_bars(
        &self,
        ticker: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<PriceBar>, DashboardError> {
        let path = self.csv_path(ticker);
        let content = match fs::read(&path) {
            Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(%ticker, path = %path.display(), "no price file");
                return Ok(Vec::new());
            }
            Err(e) => {
                return Err(unavailable(
                    ticker,
                    format!("failed to read {}: {}", path.display(), e),
                ));
            }
        };

        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        let mut bars = Vec::new();

        for result in rdr.records() {
            let record =
                result.map_err(|e| unavailable(ticker, format!("CSV parse error: {}", e)))?;

            let date_str = record
                .get(0)
                .ok_or_else(|| unavailable(ticker, "missing date column".into()))?;
            let date = NaiveDate::parse_from_str(date_str.trim(), "%Y-%m-%d")
                .map_err(|e| unavailable(ticker, format!("invalid date format: {}", e)))?;

            if date < start_date || date > end_date {
                continue;
            }

            bars.push(PriceBar {
                ticker: ticker.to_string(),
                date,
                open: parse_price(&record, 1, "open", ticker)?,
                high: parse_price(&record, 2, "high", ticker)?,
                low: parse_price(&record, 3, "low", ticker)?,
                close: parse_price(&record, 4, "close", ticker)?,
                volume: parse_volume(&record, ticker)?,
            });
        }

        Ok(ohlcv::normalize(bars))
    }

    fn display_name(&self, ticker: &str) -> Option<String> {
        self.names.get(&ticker.to_uppercase()).cloned()
    }
}
