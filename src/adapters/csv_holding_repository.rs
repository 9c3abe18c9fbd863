//! CSV holdings file.
//!
//! Columns: `Ticker,EntryDate,EntryPrice,Quantity,Status,Notes`. Columns are
//! located by header name. The file is decoded lossily, a missing file is an
//! empty collection, and rows that fail validation are reported back as
//! [`RejectedRow`]s. Writes go to a sibling temp file that is renamed over
//! the original.

use crate::domain::error::DashboardError;
use crate::domain::holding::{self, EntryDate, Holding, HoldingStatus};
use crate::ports::holding_port::{HoldingLoad, HoldingRepository, RejectedRow};
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tracing::warn;

pub const HEADER: [&str; 6] = [
    "Ticker",
    "EntryDate",
    "EntryPrice",
    "Quantity",
    "Status",
    "Notes",
];

pub struct CsvHoldingRepository {
    path: PathBuf,
}

struct Columns {
    ticker: usize,
    entry_date: usize,
    entry_price: usize,
    quantity: usize,
    status: usize,
    notes: Option<usize>,
}

impl CsvHoldingRepository {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Sidecar file receiving rows that failed validation.
    pub fn quarantine_path(&self) -> PathBuf {
        sibling(&self.path, "rejected")
    }

    fn store_err(&self, reason: String) -> DashboardError {
        DashboardError::StoreIo {
            path: self.path.display().to_string(),
            reason,
        }
    }

    fn columns(&self, headers: &csv::StringRecord) -> Result<Columns, DashboardError> {
        let find = |name: &str| headers.iter().position(|h| h.trim() == name);
        let require = |name: &str| {
            find(name).ok_or_else(|| self.store_err(format!("missing column {}", name)))
        };
        Ok(Columns {
            ticker: require("Ticker")?,
            entry_date: require("EntryDate")?,
            entry_price: require("EntryPrice")?,
            quantity: require("Quantity")?,
            status: require("Status")?,
            notes: find("Notes"),
        })
    }

    fn append_quarantine(&self, rejected: &[RejectedRow]) -> Result<(), DashboardError> {
        let path = self.quarantine_path();
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| self.store_err(format!("failed to open {}: {}", path.display(), e)))?;
        for row in rejected {
            writeln!(file, "{}", row.raw)
                .map_err(|e| self.store_err(format!("failed to write {}: {}", path.display(), e)))?;
        }
        warn!(
            rows = rejected.len(),
            path = %path.display(),
            "moved malformed holdings rows to quarantine"
        );
        Ok(())
    }
}

fn sibling(path: &Path, extension: &str) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".");
    name.push(extension);
    path.with_file_name(name)
}

fn parse_row(record: &csv::StringRecord, cols: &Columns) -> Result<Holding, String> {
    let field = |idx: usize| record.get(idx).unwrap_or("").trim();

    let ticker = holding::normalize_ticker(field(cols.ticker));
    if ticker.is_empty() {
        return Err("empty ticker".into());
    }
    let entry_date = EntryDate::parse(field(cols.entry_date))
        .ok_or_else(|| format!("invalid entry date {:?}", field(cols.entry_date)))?;
    let entry_price: f64 = field(cols.entry_price)
        .parse()
        .map_err(|_| format!("invalid entry price {:?}", field(cols.entry_price)))?;
    let quantity: f64 = field(cols.quantity)
        .parse()
        .map_err(|_| format!("invalid quantity {:?}", field(cols.quantity)))?;
    holding::validate_amounts(entry_price, quantity)?;
    let status = HoldingStatus::parse(field(cols.status))
        .ok_or_else(|| format!("invalid status {:?}", field(cols.status)))?;
    let notes = cols.notes.map(|idx| field(idx).to_string()).unwrap_or_default();

    Ok(Holding {
        ticker,
        entry_date,
        entry_price,
        quantity,
        status,
        notes,
    })
}

fn raw_line(record: &csv::StringRecord) -> String {
    let mut wtr = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());
    if wtr.write_record(record).is_err() {
        return record.iter().collect::<Vec<_>>().join(",");
    }
    match wtr.into_inner() {
        Ok(bytes) => String::from_utf8_lossy(&bytes).trim_end().to_string(),
        Err(_) => record.iter().collect::<Vec<_>>().join(","),
    }
}

impl HoldingRepository for CsvHoldingRepository {
    fn load(&self) -> Result<HoldingLoad, DashboardError> {
        let content = match fs::read(&self.path) {
            Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(HoldingLoad::default()),
            Err(e) => return Err(self.store_err(format!("failed to read: {}", e))),
        };
        if content.trim().is_empty() {
            return Ok(HoldingLoad::default());
        }

        let mut rdr = csv::ReaderBuilder::new()
            .flexible(true)
            .from_reader(content.as_bytes());
        let headers = rdr
            .headers()
            .map_err(|e| self.store_err(format!("CSV header error: {}", e)))?
            .clone();
        let cols = self.columns(&headers)?;

        let mut load = HoldingLoad::default();
        for result in rdr.records() {
            let record = result.map_err(|e| self.store_err(format!("CSV parse error: {}", e)))?;
            let line = record.position().map(|p| p.line() as usize).unwrap_or(0);
            match parse_row(&record, &cols) {
                Ok(h) => load.holdings.push(h),
                Err(reason) => {
                    warn!(path = %self.path.display(), line, %reason, "rejecting holdings row");
                    load.rejected.push(RejectedRow {
                        line,
                        raw: raw_line(&record),
                        reason,
                    });
                }
            }
        }
        Ok(load)
    }

    fn save(&self, holdings: &[Holding], rejected: &[RejectedRow]) -> Result<(), DashboardError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .map_err(|e| self.store_err(format!("failed to create directory: {}", e)))?;
        }
        let tmp = sibling(&self.path, "tmp");
        {
            let mut wtr = csv::Writer::from_path(&tmp)
                .map_err(|e| self.store_err(format!("failed to create {}: {}", tmp.display(), e)))?;
            wtr.write_record(HEADER)
                .map_err(|e| self.store_err(format!("CSV write error: {}", e)))?;
            for h in holdings {
                wtr.write_record([
                    h.ticker.clone(),
                    h.entry_date.to_string(),
                    h.entry_price.to_string(),
                    holding::format_quantity(h.quantity),
                    h.status.to_string(),
                    h.notes.clone(),
                ])
                .map_err(|e| self.store_err(format!("CSV write error: {}", e)))?;
            }
            wtr.flush()
                .map_err(|e| self.store_err(format!("failed to flush: {}", e)))?;
        }
        if let Err(e) = fs::rename(&tmp, &self.path) {
            let _ = fs::remove_file(&tmp);
            return Err(self.store_err(format!("failed to replace file: {}", e)));
        }
        // Rejected rows leave the main file only once the rewrite has landed.
        if !rejected.is_empty() {
            self.append_quarantine(rejected)?;
        }
        Ok(())
    }
}
