//! Simulated holding records.
//!
//! A holding is one row of the portfolio file. The ticker is stored
//! uppercased; a ticker may appear many times but at most once as `Open`.

use chrono::NaiveDate;
use std::fmt;

pub const DATE_FORMAT: &str = "%Y-%m-%d";
const PRE_EXISTING: &str = "Pre-existing";
const CLOSED_PREFIX: &str = "Closed on ";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryDate {
    On(NaiveDate),
    /// Position held before tracking started.
    PreExisting,
}

impl EntryDate {
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        if s.eq_ignore_ascii_case(PRE_EXISTING) {
            return Some(EntryDate::PreExisting);
        }
        NaiveDate::parse_from_str(s, DATE_FORMAT)
            .ok()
            .map(EntryDate::On)
    }
}

impl fmt::Display for EntryDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntryDate::On(date) => write!(f, "{}", date.format(DATE_FORMAT)),
            EntryDate::PreExisting => f.write_str(PRE_EXISTING),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HoldingStatus {
    Open,
    Closed(NaiveDate),
}

impl HoldingStatus {
    pub fn is_open(&self) -> bool {
        matches!(self, HoldingStatus::Open)
    }

    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        if s == "Open" {
            return Some(HoldingStatus::Open);
        }
        let date = s.strip_prefix(CLOSED_PREFIX)?;
        NaiveDate::parse_from_str(date.trim(), DATE_FORMAT)
            .ok()
            .map(HoldingStatus::Closed)
    }
}

impl fmt::Display for HoldingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HoldingStatus::Open => f.write_str("Open"),
            HoldingStatus::Closed(date) => {
                write!(f, "{}{}", CLOSED_PREFIX, date.format(DATE_FORMAT))
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Holding {
    pub ticker: String,
    pub entry_date: EntryDate,
    pub entry_price: f64,
    pub quantity: f64,
    pub status: HoldingStatus,
    pub notes: String,
}

impl Holding {
    /// New open holding. The ticker is trimmed and uppercased.
    pub fn open(
        ticker: &str,
        entry_date: EntryDate,
        entry_price: f64,
        quantity: f64,
        notes: &str,
    ) -> Self {
        Holding {
            ticker: normalize_ticker(ticker),
            entry_date,
            entry_price,
            quantity,
            status: HoldingStatus::Open,
            notes: notes.to_string(),
        }
    }

    pub fn is_open(&self) -> bool {
        self.status.is_open()
    }

    pub fn cost_basis(&self) -> f64 {
        self.entry_price * self.quantity
    }

    pub fn market_value(&self, price: f64) -> f64 {
        self.quantity * price
    }
}

pub fn normalize_ticker(ticker: &str) -> String {
    ticker.trim().to_uppercase()
}

/// Checks the numeric invariants of a holding; returns the reason on failure.
pub fn validate_amounts(entry_price: f64, quantity: f64) -> Result<(), String> {
    if !entry_price.is_finite() || entry_price <= 0.0 {
        return Err(format!("entry price must be positive, got {}", entry_price));
    }
    if !quantity.is_finite() || quantity <= 0.0 {
        return Err(format!("quantity must be positive, got {}", quantity));
    }
    Ok(())
}

/// Quantity as written to the file: whole shares without a fraction.
pub fn format_quantity(quantity: f64) -> String {
    if quantity.fract() == 0.0 && quantity.abs() < 1e15 {
        format!("{}", quantity as i64)
    } else {
        format!("{}", quantity)
    }
}
