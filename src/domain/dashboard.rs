//! Request-scoped dashboard context.
//!
//! A [`Dashboard`] owns everything one run needs: the price source, the
//! retry policy, the pacing delay between upstream fetches and the analysis
//! cache. An optional [`BarCache`] carries fetched series across runs under
//! the same TTL. Pages (market banner, stock search, screener, portfolio review)
//! are plain functions over it.

use crate::domain::analysis::TickerAnalysis;
use crate::domain::analysis_cache::AnalysisCache;
use crate::domain::error::DashboardError;
use crate::domain::indicator::IndicatorSet;
use crate::domain::retry::RetryPolicy;
use crate::domain::signal::{self, MarketTrend};
use crate::domain::universe::TickerAliases;
use crate::ports::cache_port::BarCache;
use crate::ports::price_port::PriceSource;
use chrono::{Duration as DateSpan, NaiveDate, Utc};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

pub const DEFAULT_LOOKBACK_DAYS: i64 = 365;
pub const MAX_LOOKBACK_DAYS: i64 = 36_500;
pub const DEFAULT_PACING: Duration = Duration::from_millis(250);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchSettings {
    pub retry: RetryPolicy,
    /// Minimum gap between two upstream fetches.
    pub pacing: Duration,
    pub lookback_days: i64,
}

impl Default for FetchSettings {
    fn default() -> Self {
        FetchSettings {
            retry: RetryPolicy::default(),
            pacing: DEFAULT_PACING,
            lookback_days: DEFAULT_LOOKBACK_DAYS,
        }
    }
}

pub struct Dashboard<'a> {
    source: &'a dyn PriceSource,
    settings: FetchSettings,
    cache: AnalysisCache,
    bar_cache: Option<&'a dyn BarCache>,
    today: NaiveDate,
    last_fetch: Option<Instant>,
}

impl<'a> Dashboard<'a> {
    pub fn new(
        source: &'a dyn PriceSource,
        settings: FetchSettings,
        cache: AnalysisCache,
        today: NaiveDate,
    ) -> Self {
        Self {
            source,
            settings,
            cache,
            bar_cache: None,
            today,
            last_fetch: None,
        }
    }

    /// Read and write fetched series through `bar_cache`.
    pub fn with_bar_cache(mut self, bar_cache: &'a dyn BarCache) -> Self {
        self.bar_cache = Some(bar_cache);
        self
    }

    pub fn today(&self) -> NaiveDate {
        self.today
    }

    pub fn cache(&self) -> &AnalysisCache {
        &self.cache
    }

    /// Fetch and analyse a ticker, serving from the cache when fresh.
    ///
    /// Errors: `DataUnavailable` when every attempt failed or the source
    /// returned no bars.
    pub fn analyze(&mut self, ticker: &str) -> Result<TickerAnalysis, DashboardError> {
        if let Some(hit) = self.cache.get(ticker) {
            debug!(%ticker, "analysis cache hit");
            return Ok(hit.clone());
        }
        if let Some(analysis) = self.load_persisted(ticker) {
            self.cache.insert(analysis.clone());
            return Ok(analysis);
        }

        let end = self.today;
        let start = DateSpan::try_days(self.settings.lookback_days)
            .and_then(|span| end.checked_sub_signed(span))
            .unwrap_or(NaiveDate::MIN);
        let source = self.source;
        let retry = self.settings.retry;

        self.pace();
        let bars = retry.run(ticker, |_| source.fetch_bars(ticker, start, end));
        self.last_fetch = Some(Instant::now());

        let bars = match bars {
            Ok(bars) => bars,
            Err(DashboardError::DataUnavailable { reason, .. }) => {
                return Err(DashboardError::DataUnavailable {
                    ticker: ticker.to_string(),
                    reason,
                });
            }
            Err(e) => {
                return Err(DashboardError::DataUnavailable {
                    ticker: ticker.to_string(),
                    reason: e.to_string(),
                });
            }
        };

        if bars.is_empty() {
            return Err(DashboardError::DataUnavailable {
                ticker: ticker.to_string(),
                reason: "no data returned".into(),
            });
        }

        if let Some(store) = self.bar_cache.filter(|_| !self.cache.ttl().is_zero()) {
            if let Err(e) = store.store(ticker, Utc::now(), &bars) {
                warn!(%ticker, error = %e, "could not persist price series");
            }
        }

        let analysis = TickerAnalysis::new(ticker, &self.name_for(ticker), bars);
        debug!(%ticker, bars = analysis.bar_count(), "analysed");
        self.cache.insert(analysis.clone());
        Ok(analysis)
    }

    fn name_for(&self, ticker: &str) -> String {
        self.source
            .display_name(ticker)
            .unwrap_or_else(|| ticker.to_string())
    }

    /// Series persisted by an earlier run, if younger than the TTL. An
    /// unreadable entry is logged and refetched.
    fn load_persisted(&self, ticker: &str) -> Option<TickerAnalysis> {
        let store = self.bar_cache?;
        let ttl = self.cache.ttl();
        if ttl.is_zero() {
            return None;
        }
        let cached = match store.load(ticker) {
            Ok(cached) => cached?,
            Err(e) => {
                warn!(%ticker, error = %e, "ignoring unreadable cached series");
                return None;
            }
        };
        // A stamp from the future counts as stale.
        let age = Utc::now()
            .signed_duration_since(cached.stored_at)
            .to_std()
            .ok()?;
        if age >= ttl || cached.bars.is_empty() {
            return None;
        }
        debug!(%ticker, age_secs = age.as_secs(), "persisted series cache hit");
        Some(TickerAnalysis::new(ticker, &self.name_for(ticker), cached.bars))
    }

    fn pace(&self) {
        if let Some(last) = self.last_fetch {
            let elapsed = last.elapsed();
            if elapsed < self.settings.pacing {
                thread::sleep(self.settings.pacing - elapsed);
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MarketOverview {
    pub ticker: String,
    pub trend: MarketTrend,
    pub price: Option<f64>,
}

/// Trend banner for the market index. A fetch failure degrades to
/// `Unknown` instead of failing the page.
pub fn market_overview(dash: &mut Dashboard, index_ticker: &str) -> MarketOverview {
    match dash.analyze(index_ticker) {
        Ok(analysis) => MarketOverview {
            ticker: index_ticker.to_string(),
            trend: signal::market_trend(analysis.latest()),
            price: analysis.latest_close(),
        },
        Err(e) => {
            warn!(ticker = %index_ticker, error = %e, "market trend unavailable");
            MarketOverview {
                ticker: index_ticker.to_string(),
                trend: MarketTrend::Unknown,
                price: None,
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct StockDetails {
    pub ticker: String,
    pub name: String,
    pub latest: IndicatorSet,
    /// Close, SMA50 and SMA200 per bar for charting.
    pub history: Vec<IndicatorSet>,
}

/// Resolve a search query through the alias table and analyse it.
pub fn stock_details(
    dash: &mut Dashboard,
    aliases: &TickerAliases,
    query: &str,
) -> Result<StockDetails, DashboardError> {
    let ticker = aliases.resolve(query);
    let analysis = dash.analyze(&ticker)?;
    let latest = analysis
        .latest()
        .cloned()
        .ok_or_else(|| DashboardError::DataUnavailable {
            ticker: ticker.clone(),
            reason: "no data returned".into(),
        })?;
    Ok(StockDetails {
        ticker,
        name: analysis.name,
        latest,
        history: analysis.indicators,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ohlcv::PriceBar;
    use crate::ports::cache_port::CachedBars;
    use chrono::DateTime;
    use std::cell::{Cell, RefCell};
    use std::collections::HashMap;

    struct StubSource {
        bars: HashMap<String, Vec<PriceBar>>,
        failures_left: RefCell<HashMap<String, u32>>,
        calls: Cell<usize>,
    }

    impl StubSource {
        fn new() -> Self {
            Self {
                bars: HashMap::new(),
                failures_left: RefCell::new(HashMap::new()),
                calls: Cell::new(0),
            }
        }

        fn with_rising(mut self, ticker: &str, count: usize) -> Self {
            let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
            let bars = (0..count)
                .map(|i| {
                    let day = start + DateSpan::days(i as i64);
                    PriceBar::from_close(ticker, day, 100.0 + i as f64, 1_000)
                })
                .collect();
            self.bars.insert(ticker.to_string(), bars);
            self
        }

        fn failing(self, ticker: &str, times: u32) -> Self {
            self.failures_left.borrow_mut().insert(ticker.to_string(), times);
            self
        }
    }

    impl PriceSource for StubSource {
        fn fetch_bars(
            &self,
            ticker: &str,
            _start: NaiveDate,
            _end: NaiveDate,
        ) -> Result<Vec<PriceBar>, DashboardError> {
            self.calls.set(self.calls.get() + 1);
            if let Some(left) = self.failures_left.borrow_mut().get_mut(ticker) {
                if *left > 0 {
                    *left -= 1;
                    return Err(DashboardError::DataUnavailable {
                        ticker: ticker.to_string(),
                        reason: "upstream timeout".into(),
                    });
                }
            }
            Ok(self.bars.get(ticker).cloned().unwrap_or_default())
        }

        fn display_name(&self, ticker: &str) -> Option<String> {
            (ticker == "ABB.ST").then(|| "ABB Ltd".to_string())
        }
    }

    fn quick_settings() -> FetchSettings {
        FetchSettings {
            retry: RetryPolicy::new(3, Duration::ZERO),
            pacing: Duration::ZERO,
            lookback_days: 365,
        }
    }

    fn dashboard(source: &StubSource) -> Dashboard<'_> {
        Dashboard::new(
            source,
            quick_settings(),
            AnalysisCache::new(Duration::from_secs(3600)),
            NaiveDate::from_ymd_opt(2024, 12, 31).unwrap(),
        )
    }

    #[test]
    fn analyze_uses_display_name() {
        let source = StubSource::new().with_rising("ABB.ST", 10);
        let mut dash = dashboard(&source);
        let a = dash.analyze("ABB.ST").unwrap();
        assert_eq!(a.name, "ABB Ltd");
        assert_eq!(a.bar_count(), 10);
    }

    #[test]
    fn analyze_caches_within_ttl() {
        let source = StubSource::new().with_rising("ABB.ST", 10);
        let mut dash = dashboard(&source);
        dash.analyze("ABB.ST").unwrap();
        dash.analyze("ABB.ST").unwrap();
        assert_eq!(source.calls.get(), 1);
        assert_eq!(dash.cache().len(), 1);
    }

    #[test]
    fn analyze_retries_transient_failures() {
        let source = StubSource::new().with_rising("ABB.ST", 10).failing("ABB.ST", 2);
        let mut dash = dashboard(&source);
        assert!(dash.analyze("ABB.ST").is_ok());
        assert_eq!(source.calls.get(), 3);
    }

    #[test]
    fn analyze_gives_up_after_max_attempts() {
        let source = StubSource::new().with_rising("ABB.ST", 10).failing("ABB.ST", 5);
        let mut dash = dashboard(&source);
        let err = dash.analyze("ABB.ST").unwrap_err();
        assert!(matches!(err, DashboardError::DataUnavailable { .. }));
        assert_eq!(source.calls.get(), 3);
        assert!(dash.cache().is_empty());
    }

    #[test]
    fn empty_series_is_unavailable() {
        let source = StubSource::new();
        let mut dash = dashboard(&source);
        let err = dash.analyze("NOPE.ST").unwrap_err();
        assert!(
            matches!(err, DashboardError::DataUnavailable { ticker, .. } if ticker == "NOPE.ST")
        );
    }

    #[test]
    fn market_overview_bullish_on_rising_index() {
        let source = StubSource::new().with_rising("^OMXSPI", 80);
        let mut dash = dashboard(&source);
        let overview = market_overview(&mut dash, "^OMXSPI");
        assert_eq!(overview.trend, MarketTrend::Bullish);
        assert_eq!(overview.price, Some(179.0));
    }

    #[test]
    fn market_overview_unknown_on_failure() {
        let source = StubSource::new();
        let mut dash = dashboard(&source);
        let overview = market_overview(&mut dash, "^OMXSPI");
        assert_eq!(overview.trend, MarketTrend::Unknown);
        assert_eq!(overview.price, None);
    }

    #[derive(Default)]
    struct MemoryBarCache {
        entries: RefCell<HashMap<String, CachedBars>>,
    }

    impl BarCache for MemoryBarCache {
        fn load(&self, ticker: &str) -> Result<Option<CachedBars>, DashboardError> {
            Ok(self.entries.borrow().get(ticker).cloned())
        }

        fn store(
            &self,
            ticker: &str,
            stored_at: DateTime<Utc>,
            bars: &[PriceBar],
        ) -> Result<(), DashboardError> {
            self.entries.borrow_mut().insert(
                ticker.to_string(),
                CachedBars {
                    stored_at,
                    bars: bars.to_vec(),
                },
            );
            Ok(())
        }
    }

    #[test]
    fn persisted_series_serves_a_later_dashboard() {
        let source = StubSource::new().with_rising("ABB.ST", 10);
        let persisted = MemoryBarCache::default();

        dashboard(&source).with_bar_cache(&persisted).analyze("ABB.ST").unwrap();
        let again = dashboard(&source)
            .with_bar_cache(&persisted)
            .analyze("ABB.ST")
            .unwrap();

        assert_eq!(source.calls.get(), 1);
        assert_eq!(again.name, "ABB Ltd");
        assert_eq!(again.bar_count(), 10);
    }

    #[test]
    fn stale_persisted_series_is_refetched() {
        let source = StubSource::new().with_rising("ABB.ST", 10);
        let persisted = MemoryBarCache::default();
        persisted.entries.borrow_mut().insert(
            "ABB.ST".to_string(),
            CachedBars {
                stored_at: Utc::now() - DateSpan::hours(2),
                bars: source.bars["ABB.ST"][..3].to_vec(),
            },
        );

        let a = dashboard(&source)
            .with_bar_cache(&persisted)
            .analyze("ABB.ST")
            .unwrap();

        assert_eq!(source.calls.get(), 1);
        assert_eq!(a.bar_count(), 10);
        assert_eq!(persisted.entries.borrow()["ABB.ST"].bars.len(), 10);
    }

    #[test]
    fn zero_ttl_bypasses_persisted_series() {
        let source = StubSource::new().with_rising("ABB.ST", 10);
        let persisted = MemoryBarCache::default();
        let today = NaiveDate::from_ymd_opt(2024, 12, 31).unwrap();
        for _ in 0..2 {
            Dashboard::new(&source, quick_settings(), AnalysisCache::new(Duration::ZERO), today)
                .with_bar_cache(&persisted)
                .analyze("ABB.ST")
                .unwrap();
        }
        assert_eq!(source.calls.get(), 2);
        assert!(persisted.entries.borrow().is_empty());
    }

    #[test]
    fn consecutive_fetches_are_paced() {
        let source = StubSource::new()
            .with_rising("ABB.ST", 10)
            .with_rising("AZN.ST", 10);
        let pacing = Duration::from_millis(30);
        let settings = FetchSettings {
            pacing,
            ..quick_settings()
        };
        let today = NaiveDate::from_ymd_opt(2024, 12, 31).unwrap();
        let mut dash = Dashboard::new(&source, settings, AnalysisCache::default(), today);

        let started = Instant::now();
        dash.analyze("ABB.ST").unwrap();
        dash.analyze("AZN.ST").unwrap();
        assert!(started.elapsed() >= pacing);
        assert_eq!(source.calls.get(), 2);
    }

    #[test]
    fn failed_attempt_waits_retry_delay() {
        let source = StubSource::new().with_rising("ABB.ST", 10).failing("ABB.ST", 1);
        let delay = Duration::from_millis(40);
        let settings = FetchSettings {
            retry: RetryPolicy::new(2, delay),
            ..quick_settings()
        };
        let today = NaiveDate::from_ymd_opt(2024, 12, 31).unwrap();
        let mut dash = Dashboard::new(&source, settings, AnalysisCache::default(), today);

        let started = Instant::now();
        assert!(dash.analyze("ABB.ST").is_ok());
        assert!(started.elapsed() >= delay);
        assert_eq!(source.calls.get(), 2);
    }

    #[test]
    fn huge_lookback_clamps_to_earliest_date() {
        let source = StubSource::new().with_rising("ABB.ST", 10);
        let settings = FetchSettings {
            lookback_days: i64::MAX,
            ..quick_settings()
        };
        let today = NaiveDate::from_ymd_opt(2024, 12, 31).unwrap();
        let mut dash = Dashboard::new(&source, settings, AnalysisCache::default(), today);
        assert_eq!(dash.analyze("ABB.ST").unwrap().bar_count(), 10);
    }

    #[test]
    fn stock_details_resolves_alias() {
        let source = StubSource::new().with_rising("VOLV-B.ST", 60);
        let mut dash = dashboard(&source);
        let details = stock_details(&mut dash, &TickerAliases::builtin(), "volvo").unwrap();
        assert_eq!(details.ticker, "VOLV-B.ST");
        assert_eq!(details.name, "VOLV-B.ST");
        assert_eq!(details.latest.close, 159.0);
        assert!(details.latest.sma50.is_some());
        assert!(details.latest.sma200.is_none());
        assert_eq!(details.history.len(), 60);
    }
}
