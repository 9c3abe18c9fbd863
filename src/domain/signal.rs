//! Signal evaluation over the latest indicator set.
//!
//! Three independent classifiers: market trend, screener score and exit
//! signal. Thresholds are fixed policy; undefined indicators never satisfy a
//! condition.

use crate::domain::indicator::IndicatorSet;
use std::fmt;

/// Lower bound (exclusive) of the neutral RSI band scored by the screener.
pub const RSI_BAND_LOW: f64 = 40.0;
/// Upper bound (exclusive) of the neutral RSI band scored by the screener.
pub const RSI_BAND_HIGH: f64 = 65.0;
/// RSI above this triggers an exit.
pub const RSI_OVERBOUGHT: f64 = 75.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarketTrend {
    Bullish,
    Bearish,
    Unknown,
}

impl fmt::Display for MarketTrend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MarketTrend::Bullish => write!(f, "Bullish"),
            MarketTrend::Bearish => write!(f, "Bearish"),
            MarketTrend::Unknown => write!(f, "Unknown"),
        }
    }
}

/// `Bullish` when the close is above SMA50. `Unknown` for an empty series or
/// when SMA50 has not filled yet.
pub fn market_trend(latest: Option<&IndicatorSet>) -> MarketTrend {
    match latest {
        Some(set) => match set.sma50 {
            Some(sma50) if set.close > sma50 => MarketTrend::Bullish,
            Some(_) => MarketTrend::Bearish,
            None => MarketTrend::Unknown,
        },
        None => MarketTrend::Unknown,
    }
}

/// The three boolean components of the screener score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ScoreComponents {
    pub golden_cross: bool,
    pub neutral_momentum: bool,
    pub volume_confirmed: bool,
}

impl ScoreComponents {
    pub fn from_set(set: &IndicatorSet) -> Self {
        let golden_cross =
            matches!((set.sma50, set.sma200), (Some(fast), Some(slow)) if fast > slow);
        let neutral_momentum =
            matches!(set.rsi14, Some(rsi) if rsi > RSI_BAND_LOW && rsi < RSI_BAND_HIGH);
        let volume_confirmed = matches!(set.avg_volume20, Some(avg) if set.volume as f64 > avg);
        ScoreComponents {
            golden_cross,
            neutral_momentum,
            volume_confirmed,
        }
    }

    pub fn score(&self) -> u8 {
        self.golden_cross as u8 + self.neutral_momentum as u8 + self.volume_confirmed as u8
    }
}

pub fn screener_score(set: &IndicatorSet) -> u8 {
    ScoreComponents::from_set(set).score()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ScreenerLabel {
    Weak,
    Buy,
    StrongBuy,
}

impl ScreenerLabel {
    /// Label for a score; `None` for 0, which is excluded from results.
    pub fn from_score(score: u8) -> Option<Self> {
        match score {
            0 => None,
            1 => Some(ScreenerLabel::Weak),
            2 => Some(ScreenerLabel::Buy),
            _ => Some(ScreenerLabel::StrongBuy),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ScreenerLabel::StrongBuy => "Strong Buy",
            ScreenerLabel::Buy => "Buy",
            ScreenerLabel::Weak => "Hold/Weak Signal",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Strong Buy" => Some(ScreenerLabel::StrongBuy),
            "Buy" => Some(ScreenerLabel::Buy),
            "Hold/Weak Signal" => Some(ScreenerLabel::Weak),
            _ => None,
        }
    }
}

impl fmt::Display for ScreenerLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitSignal {
    RsiOverbought,
    DeathCross,
    Hold,
}

impl ExitSignal {
    pub fn is_sell(&self) -> bool {
        !matches!(self, ExitSignal::Hold)
    }
}

impl fmt::Display for ExitSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExitSignal::RsiOverbought => write!(f, "SELL SIGNAL: RSI overbought"),
            ExitSignal::DeathCross => write!(f, "SELL SIGNAL: Death Cross"),
            ExitSignal::Hold => write!(f, "HOLD"),
        }
    }
}

/// First matching rule wins: overbought RSI, then death cross, else hold.
pub fn exit_signal(set: &IndicatorSet) -> ExitSignal {
    if matches!(set.rsi14, Some(rsi) if rsi > RSI_OVERBOUGHT) {
        return ExitSignal::RsiOverbought;
    }
    if matches!((set.sma50, set.sma200), (Some(fast), Some(slow)) if fast < slow) {
        return ExitSignal::DeathCross;
    }
    ExitSignal::Hold
}

/// Percentage gain of `current` over `entry`; zero for a non-positive entry.
pub fn pnl_percent(entry_price: f64, current_price: f64) -> f64 {
    if entry_price > 0.0 {
        (current_price / entry_price - 1.0) * 100.0
    } else {
        0.0
    }
}
