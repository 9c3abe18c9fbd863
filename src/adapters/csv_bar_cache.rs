//! Price series cache stored as `<cache_dir>/<TICKER>.csv`.
//!
//! Columns: `StoredAt,Date,Open,High,Low,Close,Volume`. Every row of a file
//! carries the same RFC 3339 `StoredAt` stamp. Files are replaced through a
//! sibling temp file.

use crate::domain::error::DashboardError;
use crate::domain::ohlcv::PriceBar;
use crate::ports::cache_port::{BarCache, CachedBars};
use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

pub const HEADER: [&str; 7] = ["StoredAt", "Date", "Open", "High", "Low", "Close", "Volume"];

pub struct CsvBarCache {
    dir: PathBuf,
}

impl CsvBarCache {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File for `ticker`, or `None` for a symbol that is not a plain file
    /// name (letters, digits, `.`, `-`, `_`, `^`).
    pub fn cache_path(&self, ticker: &str) -> Option<PathBuf> {
        let plain = !ticker.is_empty()
            && !ticker.starts_with('.')
            && ticker
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_' | '^'));
        plain.then(|| self.dir.join(format!("{}.csv", ticker)))
    }

    fn store_err(path: &Path, reason: String) -> DashboardError {
        DashboardError::StoreIo {
            path: path.display().to_string(),
            reason,
        }
    }
}

fn parse_row(
    record: &csv::StringRecord,
    ticker: &str,
) -> Result<(DateTime<Utc>, PriceBar), String> {
    let field = |idx: usize| record.get(idx).map(str::trim).ok_or("missing column");
    let price = |idx: usize| -> Result<f64, String> {
        let raw = field(idx)?;
        raw.parse().map_err(|_| format!("invalid price {:?}", raw))
    };

    let stored_at = DateTime::parse_from_rfc3339(field(0)?)
        .map_err(|e| format!("invalid stamp: {}", e))?
        .with_timezone(&Utc);
    let date = NaiveDate::parse_from_str(field(1)?, "%Y-%m-%d")
        .map_err(|e| format!("invalid date: {}", e))?;
    let volume = field(6)?
        .parse()
        .map_err(|_| format!("invalid volume {:?}", field(6).unwrap_or("")))?;

    Ok((
        stored_at,
        PriceBar {
            ticker: ticker.to_string(),
            date,
            open: price(2)?,
            high: price(3)?,
            low: price(4)?,
            close: price(5)?,
            volume,
        },
    ))
}

impl BarCache for CsvBarCache {
    fn load(&self, ticker: &str) -> Result<Option<CachedBars>, DashboardError> {
        let Some(path) = self.cache_path(ticker) else {
            return Ok(None);
        };
        let mut rdr = match csv::Reader::from_path(&path) {
            Ok(rdr) => rdr,
            Err(e) => {
                if let csv::ErrorKind::Io(io) = e.kind() {
                    if io.kind() == ErrorKind::NotFound {
                        return Ok(None);
                    }
                }
                return Err(Self::store_err(&path, format!("failed to open: {}", e)));
            }
        };

        let mut stored_at = None;
        let mut bars = Vec::new();
        for result in rdr.records() {
            let record =
                result.map_err(|e| Self::store_err(&path, format!("CSV parse error: {}", e)))?;
            let (stamp, bar) =
                parse_row(&record, ticker).map_err(|reason| Self::store_err(&path, reason))?;
            stored_at.get_or_insert(stamp);
            bars.push(bar);
        }

        Ok(stored_at.map(|stored_at| CachedBars { stored_at, bars }))
    }

    fn store(
        &self,
        ticker: &str,
        stored_at: DateTime<Utc>,
        bars: &[PriceBar],
    ) -> Result<(), DashboardError> {
        let Some(path) = self.cache_path(ticker) else {
            debug!(%ticker, "ticker not cacheable as a file name");
            return Ok(());
        };
        fs::create_dir_all(&self.dir)
            .map_err(|e| Self::store_err(&self.dir, format!("failed to create directory: {}", e)))?;

        let stamp = stored_at.to_rfc3339_opts(SecondsFormat::Secs, true);
        let tmp = path.with_extension("csv.tmp");
        {
            let mut wtr = csv::Writer::from_path(&tmp)
                .map_err(|e| Self::store_err(&tmp, format!("failed to create: {}", e)))?;
            wtr.write_record(HEADER)
                .map_err(|e| Self::store_err(&tmp, format!("CSV write error: {}", e)))?;
            for bar in bars {
                wtr.write_record([
                    stamp.clone(),
                    bar.date.format("%Y-%m-%d").to_string(),
                    bar.open.to_string(),
                    bar.high.to_string(),
                    bar.low.to_string(),
                    bar.close.to_string(),
                    bar.volume.to_string(),
                ])
                .map_err(|e| Self::store_err(&tmp, format!("CSV write error: {}", e)))?;
            }
            wtr.flush()
                .map_err(|e| Self::store_err(&tmp, format!("failed to flush: {}", e)))?;
        }
        if let Err(e) = fs::rename(&tmp, &path) {
            let _ = fs::remove_file(&tmp);
            return Err(Self::store_err(&path, format!("failed to replace file: {}", e)));
        }
        debug!(%ticker, rows = bars.len(), path = %path.display(), "cached price series");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::TempDir;

    fn bars(ticker: &str) -> Vec<PriceBar> {
        let day = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        vec![
            PriceBar {
                ticker: ticker.to_string(),
                date: day,
                open: 99.5,
                high: 101.25,
                low: 98.0,
                close: 100.75,
                volume: 12_000,
            },
            PriceBar::from_close(ticker, day.succ_opt().unwrap(), 102.0, 9_000),
        ]
    }

    fn stamp() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 2, 17, 30, 0).unwrap()
    }

    #[test]
    fn store_then_load() {
        let dir = TempDir::new().unwrap();
        let cache = CsvBarCache::new(dir.path().join(".cache"));
        cache.store("ABB.ST", stamp(), &bars("ABB.ST")).unwrap();

        let hit = cache.load("ABB.ST").unwrap().unwrap();
        assert_eq!(hit.stored_at, stamp());
        assert_eq!(hit.bars, bars("ABB.ST"));

        let content = fs::read_to_string(dir.path().join(".cache").join("ABB.ST.csv")).unwrap();
        assert!(content.starts_with("StoredAt,Date,Open,High,Low,Close,Volume\n"));
        assert!(content.contains("2024-03-02T17:30:00Z,2024-03-01,99.5,101.25,98,100.75,12000"));
    }

    #[test]
    fn store_replaces_earlier_series() {
        let dir = TempDir::new().unwrap();
        let cache = CsvBarCache::new(dir.path().to_path_buf());
        cache.store("ABB.ST", stamp(), &bars("ABB.ST")).unwrap();
        let later = stamp() + chrono::Duration::hours(1);
        cache.store("ABB.ST", later, &bars("ABB.ST")[..1]).unwrap();

        let hit = cache.load("ABB.ST").unwrap().unwrap();
        assert_eq!(hit.stored_at, later);
        assert_eq!(hit.bars.len(), 1);
        assert!(!dir.path().join("ABB.ST.csv.tmp").exists());
    }

    #[test]
    fn missing_entry_is_none() {
        let dir = TempDir::new().unwrap();
        let cache = CsvBarCache::new(dir.path().to_path_buf());
        assert!(cache.load("AZN.ST").unwrap().is_none());
    }

    #[test]
    fn index_symbols_are_cacheable() {
        let dir = TempDir::new().unwrap();
        let cache = CsvBarCache::new(dir.path().to_path_buf());
        cache.store("^OMXSPI", stamp(), &bars("^OMXSPI")).unwrap();
        assert!(cache.load("^OMXSPI").unwrap().is_some());
    }

    #[test]
    fn path_like_tickers_are_never_cached() {
        let dir = TempDir::new().unwrap();
        let cache = CsvBarCache::new(dir.path().join("cache"));
        assert!(cache.cache_path("../ABB.ST").is_none());
        assert!(cache.cache_path("a/b").is_none());
        assert!(cache.cache_path("").is_none());

        cache.store("../ABB.ST", stamp(), &bars("ABB.ST")).unwrap();
        assert!(!dir.path().join("ABB.ST.csv").exists());
        assert!(cache.load("../ABB.ST").unwrap().is_none());
    }

    #[test]
    fn corrupt_entry_is_store_error() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("ABB.ST.csv"),
            "StoredAt,Date,Open,High,Low,Close,Volume\nyesterday,2024-03-01,1,1,1,1,1\n",
        )
        .unwrap();
        let cache = CsvBarCache::new(dir.path().to_path_buf());
        let err = cache.load("ABB.ST").unwrap_err();
        assert!(matches!(err, DashboardError::StoreIo { reason, .. } if reason.contains("stamp")));
    }
}
