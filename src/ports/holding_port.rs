//! Holdings persistence port.

use crate::domain::error::DashboardError;
use crate::domain::holding::Holding;

/// A stored row that failed validation on load.
#[derive(Debug, Clone, PartialEq)]
pub struct RejectedRow {
    /// 1-based line number in the source file.
    pub line: usize,
    pub raw: String,
    pub reason: String,
}

#[derive(Debug, Clone, Default)]
pub struct HoldingLoad {
    pub holdings: Vec<Holding>,
    pub rejected: Vec<RejectedRow>,
}

pub trait HoldingRepository {
    /// Read the whole collection. A missing store is an empty collection.
    fn load(&self) -> Result<HoldingLoad, DashboardError>;

    /// Replace the whole collection. `rejected` rows from the matching load
    /// are moved to quarantine rather than discarded.
    fn save(&self, holdings: &[Holding], rejected: &[RejectedRow]) -> Result<(), DashboardError>;
}
