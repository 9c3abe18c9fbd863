//! Plain-text rendering of dashboard pages for the terminal.
//!
//! Each function returns the full page as a `String`; the CLI prints it.

use crate::domain::dashboard::{MarketOverview, StockDetails};
use crate::domain::holding::{format_quantity, Holding};
use crate::domain::indicator::Reading;
use crate::domain::portfolio::PortfolioReview;
use crate::domain::screener::ScreenerReport;
use crate::domain::signal::{self, MarketTrend};
use std::fmt::Write;

/// Closes shown under a stock's indicator summary.
pub const DETAIL_HISTORY_ROWS: usize = 10;

pub fn format_market(overview: &MarketOverview) -> String {
    let price = overview
        .price
        .map(|p| format!("{:.2}", p))
        .unwrap_or_else(|| "n/a".to_string());
    let hint = match overview.trend {
        MarketTrend::Bullish => "index above its 50-day average",
        MarketTrend::Bearish => "index below its 50-day average",
        MarketTrend::Unknown => "not enough data",
    };
    format!(
        "Market {}: {} ({})  last {}\n",
        overview.ticker, overview.trend, hint, price
    )
}

pub fn format_stock_details(details: &StockDetails) -> String {
    let latest = &details.latest;
    let mut out = String::new();
    let _ = writeln!(out, "{} ({})", details.name, details.ticker);
    let _ = writeln!(out, "  Close      {:.2} on {}", latest.close, latest.date);
    let _ = writeln!(out, "  SMA50      {}", Reading(latest.sma50));
    let _ = writeln!(out, "  SMA200     {}", Reading(latest.sma200));
    let _ = writeln!(out, "  RSI14      {}", Reading(latest.rsi14));
    let _ = writeln!(out, "  AvgVol20   {}", Reading(latest.avg_volume20));
    let _ = writeln!(out, "  Score      {}/3", signal::screener_score(latest));
    let _ = writeln!(out, "  Exit       {}", signal::exit_signal(latest));

    let start = details.history.len().saturating_sub(DETAIL_HISTORY_ROWS);
    let _ = writeln!(out, "\n  {:<10}  {:>10}  {:>10}  {:>10}", "Date", "Close", "SMA50", "SMA200");
    for set in &details.history[start..] {
        let _ = writeln!(
            out,
            "  {:<10}  {:>10.2}  {:>10}  {:>10}",
            set.date.to_string(),
            set.close,
            Reading(set.sma50).to_string(),
            Reading(set.sma200).to_string()
        );
    }
    out
}

pub fn format_screener(report: &ScreenerReport, scan_id: &str) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Scan {}: {} scanned, {} candidates, {} skipped",
        scan_id,
        report.scanned,
        report.candidates.len(),
        report.skipped.len()
    );
    if report.candidates.is_empty() {
        let _ = writeln!(out, "No candidates with a positive score.");
    } else {
        let _ = writeln!(
            out,
            "{:>4}  {:<14} {:<24} {:>10}  {:>5}  {:<16} {}",
            "Rank", "Ticker", "Name", "Price", "Score", "Label", "Trend"
        );
        for c in &report.candidates {
            let _ = writeln!(
                out,
                "{:>4}  {:<14} {:<24} {:>10.2}  {:>3}/3  {:<16} {}",
                c.rank,
                c.ticker,
                truncate(&c.name, 24),
                c.price,
                c.score,
                c.label.as_str(),
                if c.trend_up { "up" } else { "down" }
            );
        }
    }
    for s in &report.skipped {
        let _ = writeln!(out, "skipped {}: {}", s.ticker, s.reason);
    }
    out
}

pub fn format_holdings(holdings: &[Holding]) -> String {
    if holdings.is_empty() {
        return "No holdings recorded.\n".to_string();
    }
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:>3}  {:<14} {:<12} {:>10} {:>8}  {:<20} {}",
        "#", "Ticker", "Entry", "Price", "Qty", "Status", "Notes"
    );
    for (i, h) in holdings.iter().enumerate() {
        let _ = writeln!(
            out,
            "{:>3}  {:<14} {:<12} {:>10.2} {:>8}  {:<20} {}",
            i,
            h.ticker,
            h.entry_date.to_string(),
            h.entry_price,
            format_quantity(h.quantity),
            h.status.to_string(),
            h.notes
        );
    }
    out
}

pub fn format_portfolio(review: &PortfolioReview) -> String {
    let mut out = String::new();
    if review.open.is_empty() && review.unpriced.is_empty() {
        let _ = writeln!(out, "No open positions. Add stocks from the screener.");
    } else {
        let _ = writeln!(out, "Open positions");
        for p in &review.open {
            let _ = writeln!(
                out,
                "{:>3}  {:<14} entry {:>10.2}  now {:>10.2}  P/L {:>7.2}%  {}",
                p.index,
                p.holding.ticker,
                p.holding.entry_price,
                p.current_price,
                p.pnl_pct,
                p.signal
            );
        }
        for u in &review.unpriced {
            let _ = writeln!(
                out,
                "{:>3}  {:<14} entry {:>10.2}  price unavailable: {}",
                u.index, u.holding.ticker, u.holding.entry_price, u.reason
            );
        }
        if !review.open.is_empty() {
            let _ = writeln!(
                out,
                "Total cost {:.2}  value {:.2}  P/L {:.2}%",
                review.total_cost(),
                review.total_value(),
                review.total_pnl_pct()
            );
            let sells = review.sell_signals().count();
            if sells > 0 {
                let _ = writeln!(out, "{} position(s) with a sell signal", sells);
            }
        }
    }

    if !review.closed.is_empty() {
        let _ = writeln!(out, "\nClosed positions");
        for (index, h) in &review.closed {
            let _ = writeln!(
                out,
                "{:>3}  {:<14} entry {:>10.2}  qty {:>8}  {}",
                index,
                h.ticker,
                h.entry_price,
                format_quantity(h.quantity),
                h.status
            );
        }
    }
    out
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let mut t: String = s.chars().take(max.saturating_sub(1)).collect();
        t.push('…');
        t
    }
}
