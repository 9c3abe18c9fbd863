//! Domain error types.

/// Top-level error type for tradedash.
#[derive(Debug, thiserror::Error)]
pub enum DashboardError {
    #[error("no data for {ticker}: {reason}")]
    DataUnavailable { ticker: String, reason: String },

    #[error("insufficient data for {ticker}: have {bars} bars, need {minimum}")]
    InsufficientData {
        ticker: String,
        bars: usize,
        minimum: usize,
    },

    #[error("{ticker} is already in the portfolio as an open position")]
    DuplicateOpenPosition { ticker: String },

    #[error("no holding at index {index} (store has {len} records)")]
    RecordNotFound { index: usize, len: usize },

    #[error("invalid holding: {reason}")]
    InvalidHolding { reason: String },

    #[error("store error at {path}: {reason}")]
    StoreIo { path: String, reason: String },

    #[error("scan {scan_id} not found")]
    ScanNotFound { scan_id: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },
}

impl DashboardError {
    /// True for failures that only affect a single ticker in a batch.
    pub fn is_per_ticker(&self) -> bool {
        matches!(
            self,
            DashboardError::DataUnavailable { .. } | DashboardError::InsufficientData { .. }
        )
    }
}

impl From<&DashboardError> for std::process::ExitCode {
    fn from(err: &DashboardError) -> Self {
        let code: u8 = match err {
            DashboardError::StoreIo { .. } => 1,
            DashboardError::ConfigParse { .. } | DashboardError::ConfigInvalid { .. } => 2,
            DashboardError::DuplicateOpenPosition { .. }
            | DashboardError::RecordNotFound { .. }
            | DashboardError::InvalidHolding { .. } => 3,
            DashboardError::ScanNotFound { .. } => 4,
            DashboardError::DataUnavailable { .. } | DashboardError::InsufficientData { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}
