//! A fetched series together with its computed indicators.

use crate::domain::indicator::{self, IndicatorSet};
use crate::domain::ohlcv::PriceBar;

/// Trailing bars a screener candidate's trend direction is taken over.
pub const TREND_WINDOW_BARS: usize = 60;

#[derive(Debug, Clone)]
pub struct TickerAnalysis {
    pub ticker: String,
    pub name: String,
    pub bars: Vec<PriceBar>,
    pub indicators: Vec<IndicatorSet>,
}

impl TickerAnalysis {
    pub fn new(ticker: &str, name: &str, bars: Vec<PriceBar>) -> Self {
        let indicators = indicator::compute(&bars);
        Self {
            ticker: ticker.to_string(),
            name: name.to_string(),
            bars,
            indicators,
        }
    }

    pub fn bar_count(&self) -> usize {
        self.bars.len()
    }

    pub fn latest(&self) -> Option<&IndicatorSet> {
        self.indicators.last()
    }

    pub fn latest_close(&self) -> Option<f64> {
        self.bars.last().map(|b| b.close)
    }

    /// Closes of the trailing `count` bars.
    pub fn recent_closes(&self, count: usize) -> Vec<f64> {
        let start = self.bars.len().saturating_sub(count);
        self.bars[start..].iter().map(|b| b.close).collect()
    }

    /// Whether the last close is at or above the first close of the trailing
    /// `count` bars. `None` for an empty series.
    pub fn trending_up(&self, count: usize) -> Option<bool> {
        let closes = self.recent_closes(count);
        match (closes.first(), closes.last()) {
            (Some(first), Some(last)) => Some(last >= first),
            _ => None,
        }
    }
}
