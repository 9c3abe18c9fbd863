//! Indicator engine.
//!
//! Turns a price series into one [`IndicatorSet`] per bar:
//! - `sma50` / `sma200`: simple moving averages of the close
//! - `rsi14`: simple-mean RSI (see [`rsi`])
//! - `avg_volume20`: rolling mean of volume
//!
//! Every derived field is `None` until its window is full. Nothing here is
//! persisted; callers recompute from the raw series.

pub mod rsi;
pub mod sma;

use crate::domain::ohlcv::{self, PriceBar};
use chrono::NaiveDate;
use std::fmt;

pub const SMA_FAST_PERIOD: usize = 50;
pub const SMA_SLOW_PERIOD: usize = 200;
pub const RSI_PERIOD: usize = 14;
pub const VOLUME_AVG_PERIOD: usize = 20;

#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorSet {
    pub date: NaiveDate,
    pub close: f64,
    pub volume: u64,
    pub sma50: Option<f64>,
    pub sma200: Option<f64>,
    pub rsi14: Option<f64>,
    pub avg_volume20: Option<f64>,
}

/// Compute the indicator set for every bar. Output has the same length as
/// `bars`; an empty series yields an empty vector.
pub fn compute(bars: &[PriceBar]) -> Vec<IndicatorSet> {
    let closes = ohlcv::closes(bars);
    let volumes = ohlcv::volumes(bars);

    let sma50 = sma::calculate_sma(&closes, SMA_FAST_PERIOD);
    let sma200 = sma::calculate_sma(&closes, SMA_SLOW_PERIOD);
    let rsi14 = rsi::calculate_rsi(&closes, RSI_PERIOD);
    let avg_volume20 = sma::calculate_sma(&volumes, VOLUME_AVG_PERIOD);

    bars.iter()
        .enumerate()
        .map(|(i, bar)| IndicatorSet {
            date: bar.date,
            close: bar.close,
            volume: bar.volume,
            sma50: sma50[i],
            sma200: sma200[i],
            rsi14: rsi14[i],
            avg_volume20: avg_volume20[i],
        })
        .collect()
}

/// Indicator set of the most recent bar, if any.
pub fn latest(bars: &[PriceBar]) -> Option<IndicatorSet> {
    compute(bars).pop()
}

/// Formats an optional indicator value, `n/a` when undefined.
pub struct Reading(pub Option<f64>);

impl fmt::Display for Reading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(v) => write!(f, "{:.2}", v),
            None => write!(f, "n/a"),
        }
    }
}
