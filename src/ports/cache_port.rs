//! Price series cache that outlives a single run.

use crate::domain::error::DashboardError;
use crate::domain::ohlcv::PriceBar;
use chrono::{DateTime, Utc};

#[derive(Debug, Clone, PartialEq)]
pub struct CachedBars {
    pub stored_at: DateTime<Utc>,
    pub bars: Vec<PriceBar>,
}

pub trait BarCache {
    /// Last stored series for `ticker`, `None` when nothing was stored.
    /// Freshness is the caller's call.
    fn load(&self, ticker: &str) -> Result<Option<CachedBars>, DashboardError>;

    /// Replace the stored series for `ticker`.
    fn store(
        &self,
        ticker: &str,
        stored_at: DateTime<Utc>,
        bars: &[PriceBar],
    ) -> Result<(), DashboardError>;
}
