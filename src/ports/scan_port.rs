//! Persisted screener runs, keyed by scan id.

use crate::domain::error::DashboardError;
use crate::domain::screener::ScreenerCandidate;

pub trait ScanStore {
    /// Store the ranked candidates of one run, replacing any earlier run
    /// with the same id.
    fn save(&self, scan_id: &str, candidates: &[ScreenerCandidate]) -> Result<(), DashboardError>;

    /// Candidates of a stored run in rank order. `ScanNotFound` if the id
    /// was never saved.
    fn load(&self, scan_id: &str) -> Result<Vec<ScreenerCandidate>, DashboardError>;
}
