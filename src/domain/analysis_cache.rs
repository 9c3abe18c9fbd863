//! Per-ticker cache of computed analyses with a time-to-live.

use crate::domain::analysis::TickerAnalysis;
use std::collections::HashMap;
use std::time::{Duration, Instant};

pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(60 * 60);

pub struct AnalysisCache {
    ttl: Duration,
    entries: HashMap<String, CachedAnalysis>,
}

struct CachedAnalysis {
    stored_at: Instant,
    analysis: TickerAnalysis,
}

impl AnalysisCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: HashMap::new(),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Last successful analysis for `ticker` if younger than the TTL.
    pub fn get(&self, ticker: &str) -> Option<&TickerAnalysis> {
        self.get_at(ticker, Instant::now())
    }

    fn get_at(&self, ticker: &str, now: Instant) -> Option<&TickerAnalysis> {
        self.entries
            .get(ticker)
            .filter(|hit| now.saturating_duration_since(hit.stored_at) < self.ttl)
            .map(|hit| &hit.analysis)
    }

    pub fn insert(&mut self, analysis: TickerAnalysis) {
        self.entries.insert(
            analysis.ticker.clone(),
            CachedAnalysis {
                stored_at: Instant::now(),
                analysis,
            },
        );
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for AnalysisCache {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_TTL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn analysis(ticker: &str) -> TickerAnalysis {
        TickerAnalysis::new(ticker, ticker, Vec::new())
    }

    #[test]
    fn hit_within_ttl() {
        let mut cache = AnalysisCache::new(Duration::from_secs(3600));
        cache.insert(analysis("ABB.ST"));
        assert!(cache.get("ABB.ST").is_some());
        assert!(cache.get("AZN.ST").is_none());
    }

    #[test]
    fn zero_ttl_never_hits() {
        let mut cache = AnalysisCache::new(Duration::ZERO);
        cache.insert(analysis("ABB.ST"));
        assert!(cache.get("ABB.ST").is_none());
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn expired_after_ttl() {
        let mut cache = AnalysisCache::new(Duration::from_secs(60));
        cache.insert(analysis("ABB.ST"));
        let later = Instant::now() + Duration::from_secs(61);
        assert!(cache.get_at("ABB.ST", later).is_none());
    }

    #[test]
    fn insert_replaces_previous() {
        let mut cache = AnalysisCache::default();
        cache.insert(analysis("ABB.ST"));
        cache.insert(TickerAnalysis::new("ABB.ST", "ABB Ltd", Vec::new()));
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get("ABB.ST").unwrap().name, "ABB Ltd");
        assert_eq!(cache.ttl(), DEFAULT_CACHE_TTL);
    }
}
