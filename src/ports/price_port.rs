//! Price series source port.

use crate::domain::error::DashboardError;
use crate::domain::ohlcv::PriceBar;
use chrono::NaiveDate;

pub trait PriceSource {
    /// Daily bars for `ticker` between `start_date` and `end_date`
    /// inclusive, ascending by date. An unknown symbol yields an empty
    /// series or an error; callers treat both as unavailable data.
    fn fetch_bars(
        &self,
        ticker: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<PriceBar>, DashboardError>;

    /// Human-readable name for a ticker, when the source knows one.
    fn display_name(&self, ticker: &str) -> Option<String>;
}
