#![allow(dead_code)]

use chrono::NaiveDate;
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::time::Duration;
use tradedash::domain::analysis_cache::AnalysisCache;
use tradedash::domain::dashboard::{Dashboard, FetchSettings};
use tradedash::domain::error::DashboardError;
pub use tradedash::domain::ohlcv::PriceBar;
use tradedash::domain::retry::RetryPolicy;
use tradedash::ports::price_port::PriceSource;

pub struct MockPriceSource {
    pub data: HashMap<String, Vec<PriceBar>>,
    pub errors: HashMap<String, String>,
    pub names: HashMap<String, String>,
    /// Remaining transient failures per ticker before data is served.
    pub flaky: RefCell<HashMap<String, u32>>,
    pub calls: Cell<usize>,
}

impl MockPriceSource {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            errors: HashMap::new(),
            names: HashMap::new(),
            flaky: RefCell::new(HashMap::new()),
            calls: Cell::new(0),
        }
    }

    pub fn with_bars(mut self, ticker: &str, bars: Vec<PriceBar>) -> Self {
        self.data.insert(ticker.to_string(), bars);
        self
    }

    pub fn with_error(mut self, ticker: &str, reason: &str) -> Self {
        self.errors.insert(ticker.to_string(), reason.to_string());
        self
    }

    pub fn with_name(mut self, ticker: &str, name: &str) -> Self {
        self.names.insert(ticker.to_string(), name.to_string());
        self
    }

    pub fn failing_first(self, ticker: &str, times: u32) -> Self {
        self.flaky.borrow_mut().insert(ticker.to_string(), times);
        self
    }
}

impl PriceSource for MockPriceSource {
    fn fetch_bars(
        &self,
        ticker: &str,
        _start_date: NaiveDate,
        _end_date: NaiveDate,
    ) -> Result<Vec<PriceBar>, DashboardError> {
        self.calls.set(self.calls.get() + 1);
        if let Some(reason) = self.errors.get(ticker) {
            return Err(DashboardError::DataUnavailable {
                ticker: ticker.to_string(),
                reason: reason.clone(),
            });
        }
        if let Some(left) = self.flaky.borrow_mut().get_mut(ticker) {
            if *left > 0 {
                *left -= 1;
                return Err(DashboardError::DataUnavailable {
                    ticker: ticker.to_string(),
                    reason: "transient failure".into(),
                });
            }
        }
        Ok(self.data.get(ticker).cloned().unwrap_or_default())
    }

    fn display_name(&self, ticker: &str) -> Option<String> {
        self.names.get(ticker).cloned()
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// Dashboard with no retry delay and no pacing.
pub fn quick_dashboard(source: &dyn PriceSource) -> Dashboard<'_> {
    Dashboard::new(
        source,
        FetchSettings {
            retry: RetryPolicy::new(3, Duration::ZERO),
            pacing: Duration::ZERO,
            lookback_days: 365,
        },
        AnalysisCache::default(),
        date(2024, 12, 31),
    )
}

/// Daily bars with the given closes and a flat volume of 1000, except the
/// last bar which carries `last_volume`.
pub fn bars_from_closes(ticker: &str, closes: &[f64], last_volume: u64) -> Vec<PriceBar> {
    let start = date(2024, 1, 1);
    let n = closes.len();
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let volume = if i + 1 == n { last_volume } else { 1000 };
            PriceBar::from_close(ticker, start + chrono::Duration::days(i as i64), close, volume)
        })
        .collect()
}

/// `count` closes rising linearly from `from` to `to`.
pub fn linear_closes(count: usize, from: f64, to: f64) -> Vec<f64> {
    let step = if count > 1 { (to - from) / (count - 1) as f64 } else { 0.0 };
    (0..count).map(|i| from + step * i as f64).collect()
}

/// Alternating +3 / -2 steps from 100: rising trend with RSI14 at 60.
pub fn zigzag_closes(count: usize) -> Vec<f64> {
    let mut closes = Vec::with_capacity(count);
    let mut price = 100.0;
    for i in 0..count {
        if i > 0 {
            price += if i % 2 == 1 { 3.0 } else { -2.0 };
        }
        closes.push(price);
    }
    closes
}
