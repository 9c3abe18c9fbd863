//! Screener scan over a ticker universe.

use crate::domain::analysis::TREND_WINDOW_BARS;
use crate::domain::dashboard::Dashboard;
use crate::domain::error::DashboardError;
use crate::domain::holding::{normalize_ticker, EntryDate};
use crate::domain::indicator::SMA_SLOW_PERIOD;
use crate::domain::position_store::PositionStore;
use crate::domain::signal::{self, ScreenerLabel};
use tracing::{error, info, warn};

/// Bars a ticker needs before it is scored.
pub const MIN_SCREENER_BARS: usize = SMA_SLOW_PERIOD;
pub const DEFAULT_BUY_QUANTITY: f64 = 10.0;
pub const SCREENER_NOTE: &str = "Added from Screener";

#[derive(Debug, Clone, PartialEq)]
pub struct ScreenerCandidate {
    /// 1-based position in the ranked results.
    pub rank: usize,
    pub ticker: String,
    pub name: String,
    pub price: f64,
    pub score: u8,
    pub label: ScreenerLabel,
    pub trend_up: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SkippedTicker {
    pub ticker: String,
    pub reason: String,
}

#[derive(Debug, Clone, Default)]
pub struct ScreenerReport {
    pub candidates: Vec<ScreenerCandidate>,
    pub skipped: Vec<SkippedTicker>,
    pub scanned: usize,
}

/// Score one ticker. `Ok(None)` when it scores 0.
///
/// Errors: `DataUnavailable` from the fetch, `InsufficientData` when the
/// series is shorter than [`MIN_SCREENER_BARS`].
pub fn screen_ticker(
    dash: &mut Dashboard,
    ticker: &str,
) -> Result<Option<ScreenerCandidate>, DashboardError> {
    let analysis = dash.analyze(ticker)?;
    let bars = analysis.bar_count();
    if bars < MIN_SCREENER_BARS {
        return Err(DashboardError::InsufficientData {
            ticker: ticker.to_string(),
            bars,
            minimum: MIN_SCREENER_BARS,
        });
    }

    let Some(latest) = analysis.latest() else {
        return Ok(None);
    };
    let score = signal::screener_score(latest);
    let Some(label) = ScreenerLabel::from_score(score) else {
        return Ok(None);
    };

    Ok(Some(ScreenerCandidate {
        rank: 0,
        ticker: ticker.to_string(),
        name: analysis.name.clone(),
        price: latest.close,
        score,
        label,
        trend_up: analysis.trending_up(TREND_WINDOW_BARS).unwrap_or(false),
    }))
}

/// Scan every ticker, ranking candidates by score (highest first, ties in
/// universe order). A failing ticker is logged and listed in `skipped`.
pub fn run_screener(dash: &mut Dashboard, tickers: &[String]) -> ScreenerReport {
    let mut report = ScreenerReport::default();

    for ticker in tickers {
        report.scanned += 1;
        match screen_ticker(dash, ticker) {
            Ok(Some(candidate)) => report.candidates.push(candidate),
            Ok(None) => {}
            Err(e) => {
                if e.is_per_ticker() {
                    warn!(%ticker, error = %e, "skipping ticker");
                } else {
                    error!(%ticker, error = %e, "skipping ticker after unexpected failure");
                }
                report.skipped.push(SkippedTicker {
                    ticker: ticker.clone(),
                    reason: e.to_string(),
                });
            }
        }
    }

    report.candidates.sort_by(|a, b| b.score.cmp(&a.score));
    for (i, candidate) in report.candidates.iter_mut().enumerate() {
        candidate.rank = i + 1;
    }

    info!(
        scanned = report.scanned,
        candidates = report.candidates.len(),
        skipped = report.skipped.len(),
        "screener finished"
    );
    report
}

/// Add a scanned candidate to the portfolio at its scanned price.
pub fn buy_candidate(
    store: &PositionStore,
    candidates: &[ScreenerCandidate],
    ticker: &str,
    quantity: f64,
    entry_date: EntryDate,
) -> Result<usize, DashboardError> {
    let wanted = normalize_ticker(ticker);
    let candidate = candidates
        .iter()
        .find(|c| c.ticker == wanted)
        .ok_or_else(|| DashboardError::InvalidHolding {
            reason: format!("{} is not among the scanned candidates", wanted),
        })?;
    store.add(
        &candidate.ticker,
        entry_date,
        candidate.price,
        quantity,
        SCREENER_NOTE,
    )
}
