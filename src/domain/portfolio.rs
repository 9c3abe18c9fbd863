//! Portfolio review: open holdings marked to the latest close with an exit
//! signal each, plus the closed history.

use crate::domain::dashboard::Dashboard;
use crate::domain::error::DashboardError;
use crate::domain::holding::Holding;
use crate::domain::position_store::PositionStore;
use crate::domain::signal::{self, ExitSignal};
use tracing::warn;

#[derive(Debug, Clone, PartialEq)]
pub struct PositionReview {
    pub index: usize,
    pub holding: Holding,
    pub current_price: f64,
    pub pnl_pct: f64,
    pub signal: ExitSignal,
}

impl PositionReview {
    pub fn market_value(&self) -> f64 {
        self.holding.market_value(self.current_price)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct UnpricedPosition {
    pub index: usize,
    pub holding: Holding,
    pub reason: String,
}

#[derive(Debug, Clone, Default)]
pub struct PortfolioReview {
    pub open: Vec<PositionReview>,
    /// Open holdings whose price could not be fetched.
    pub unpriced: Vec<UnpricedPosition>,
    pub closed: Vec<(usize, Holding)>,
}

impl PortfolioReview {
    pub fn is_empty(&self) -> bool {
        self.open.is_empty() && self.unpriced.is_empty() && self.closed.is_empty()
    }

    pub fn total_cost(&self) -> f64 {
        self.open.iter().map(|p| p.holding.cost_basis()).sum()
    }

    pub fn total_value(&self) -> f64 {
        self.open.iter().map(PositionReview::market_value).sum()
    }

    /// Aggregate P/L over priced open positions, as a percentage of cost.
    pub fn total_pnl_pct(&self) -> f64 {
        signal::pnl_percent(self.total_cost(), self.total_value())
    }

    pub fn sell_signals(&self) -> impl Iterator<Item = &PositionReview> {
        self.open.iter().filter(|p| p.signal.is_sell())
    }
}

/// Evaluate one holding against freshly computed indicators.
pub fn review_position(
    dash: &mut Dashboard,
    index: usize,
    holding: Holding,
) -> Result<PositionReview, DashboardError> {
    let analysis = dash.analyze(&holding.ticker)?;
    let latest = analysis
        .latest()
        .ok_or_else(|| DashboardError::DataUnavailable {
            ticker: holding.ticker.clone(),
            reason: "no data returned".into(),
        })?;
    Ok(PositionReview {
        index,
        current_price: latest.close,
        pnl_pct: signal::pnl_percent(holding.entry_price, latest.close),
        signal: signal::exit_signal(latest),
        holding,
    })
}

/// Review every stored holding. A fetch failure for one ticker lands it in
/// `unpriced`; store errors propagate.
pub fn review_portfolio(
    dash: &mut Dashboard,
    store: &PositionStore,
) -> Result<PortfolioReview, DashboardError> {
    let mut review = PortfolioReview {
        closed: store.closed_positions()?,
        ..PortfolioReview::default()
    };

    for (index, holding) in store.open_positions()? {
        match review_position(dash, index, holding.clone()) {
            Ok(position) => review.open.push(position),
            Err(e) => {
                warn!(ticker = %holding.ticker, error = %e, "could not price holding");
                review.unpriced.push(UnpricedPosition {
                    index,
                    holding,
                    reason: e.to_string(),
                });
            }
        }
    }

    Ok(review)
}
