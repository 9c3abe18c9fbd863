//! Daily price bar representation.

use chrono::NaiveDate;

/// One sample of a fetched series. Only `close` and `volume` feed the
/// indicator engine; open/high/low are carried for display.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceBar {
    pub ticker: String,
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
}

impl PriceBar {
    /// Bar with open/high/low pinned to the close.
    pub fn from_close(ticker: &str, date: NaiveDate, close: f64, volume: u64) -> Self {
        PriceBar {
            ticker: ticker.to_string(),
            date,
            open: close,
            high: close,
            low: close,
            close,
            volume,
        }
    }
}

/// Closes of a series, in order.
pub fn closes(bars: &[PriceBar]) -> Vec<f64> {
    bars.iter().map(|b| b.close).collect()
}

/// Volumes of a series as reals, in order.
pub fn volumes(bars: &[PriceBar]) -> Vec<f64> {
    bars.iter().map(|b| b.volume as f64).collect()
}

/// Sort ascending by date and drop repeated dates, keeping the last sample
/// seen for each date.
pub fn normalize(mut bars: Vec<PriceBar>) -> Vec<PriceBar> {
    bars.sort_by_key(|b| b.date);
    let mut out: Vec<PriceBar> = Vec::with_capacity(bars.len());
    for bar in bars {
        match out.last_mut() {
            Some(prev) if prev.date == bar.date => *prev = bar,
            _ => out.push(bar),
        }
    }
    out
}
