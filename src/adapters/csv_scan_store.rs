//! Screener runs stored as `<scan_dir>/<scan_id>.csv`.

use crate::domain::error::DashboardError;
use crate::domain::screener::ScreenerCandidate;
use crate::domain::signal::ScreenerLabel;
use crate::ports::scan_port::ScanStore;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

pub const HEADER: [&str; 7] = ["Rank", "Ticker", "Name", "Price", "Score", "Label", "TrendUp"];

pub struct CsvScanStore {
    dir: PathBuf,
}

impl CsvScanStore {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File backing `scan_id`. Ids are restricted to ASCII letters, digits,
    /// `-` and `_` so they cannot escape the scan directory.
    pub fn scan_path(&self, scan_id: &str) -> Result<PathBuf, DashboardError> {
        let valid = !scan_id.is_empty()
            && scan_id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(DashboardError::ScanNotFound {
                scan_id: scan_id.to_string(),
            });
        }
        Ok(self.dir.join(format!("{}.csv", scan_id)))
    }

    fn store_err(path: &Path, reason: String) -> DashboardError {
        DashboardError::StoreIo {
            path: path.display().to_string(),
            reason,
        }
    }
}

fn parse_candidate(record: &csv::StringRecord) -> Result<ScreenerCandidate, String> {
    let field = |idx: usize| record.get(idx).map(str::trim).ok_or("missing column");

    let rank = field(0)?
        .parse()
        .map_err(|_| format!("invalid rank {:?}", field(0).unwrap_or("")))?;
    let price = field(3)?
        .parse()
        .map_err(|_| format!("invalid price {:?}", field(3).unwrap_or("")))?;
    let score = field(4)?
        .parse()
        .map_err(|_| format!("invalid score {:?}", field(4).unwrap_or("")))?;
    let label = ScreenerLabel::parse(field(5)?)
        .ok_or_else(|| format!("invalid label {:?}", field(5).unwrap_or("")))?;
    let trend_up = field(6)?
        .parse()
        .map_err(|_| format!("invalid trend flag {:?}", field(6).unwrap_or("")))?;

    Ok(ScreenerCandidate {
        rank,
        ticker: field(1)?.to_string(),
        name: field(2)?.to_string(),
        price,
        score,
        label,
        trend_up,
    })
}

impl ScanStore for CsvScanStore {
    fn save(&self, scan_id: &str, candidates: &[ScreenerCandidate]) -> Result<(), DashboardError> {
        let path = self.scan_path(scan_id)?;
        fs::create_dir_all(&self.dir)
            .map_err(|e| Self::store_err(&self.dir, format!("failed to create directory: {}", e)))?;

        let mut wtr = csv::Writer::from_path(&path)
            .map_err(|e| Self::store_err(&path, format!("failed to create: {}", e)))?;
        wtr.write_record(HEADER)
            .map_err(|e| Self::store_err(&path, format!("CSV write error: {}", e)))?;
        for c in candidates {
            wtr.write_record([
                c.rank.to_string(),
                c.ticker.clone(),
                c.name.clone(),
                c.price.to_string(),
                c.score.to_string(),
                c.label.to_string(),
                c.trend_up.to_string(),
            ])
            .map_err(|e| Self::store_err(&path, format!("CSV write error: {}", e)))?;
        }
        wtr.flush()
            .map_err(|e| Self::store_err(&path, format!("failed to flush: {}", e)))?;
        debug!(%scan_id, rows = candidates.len(), path = %path.display(), "saved scan");
        Ok(())
    }

    fn load(&self, scan_id: &str) -> Result<Vec<ScreenerCandidate>, DashboardError> {
        let path = self.scan_path(scan_id)?;
        let mut rdr = match csv::Reader::from_path(&path) {
            Ok(rdr) => rdr,
            Err(e) => {
                if let csv::ErrorKind::Io(io) = e.kind() {
                    if io.kind() == ErrorKind::NotFound {
                        return Err(DashboardError::ScanNotFound {
                            scan_id: scan_id.to_string(),
                        });
                    }
                }
                return Err(Self::store_err(&path, format!("failed to open: {}", e)));
            }
        };

        let mut candidates = Vec::new();
        for result in rdr.records() {
            let record =
                result.map_err(|e| Self::store_err(&path, format!("CSV parse error: {}", e)))?;
            let candidate =
                parse_candidate(&record).map_err(|reason| Self::store_err(&path, reason))?;
            candidates.push(candidate);
        }
        candidates.sort_by_key(|c| c.rank);
        Ok(candidates)
    }
}
