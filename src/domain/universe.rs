//! Ticker universe and search aliases.
//!
//! Parses ticker lists from configuration, supplies the default screener
//! universe, and resolves short names typed into search to exchange symbols.

use std::collections::{HashMap, HashSet};

/// Default screener universe: OMXS30 constituents.
pub const OMXS30_TICKERS: [&str; 30] = [
    "ABB.ST", "ALFA.ST", "ALIV-SDB.ST", "ASSA-B.ST", "AZN.ST", "ATCO-A.ST", "BOL.ST",
    "ERIC-B.ST", "ESSITY-B.ST", "EVO.ST", "GETI-B.ST", "HEXA-B.ST", "HM-B.ST", "INVE-B.ST",
    "KINV-B.ST", "NDA-SE.ST", "SAND.ST", "SCA-B.ST", "SEB-A.ST", "SHB-A.ST", "SINCH.ST",
    "SKF-B.ST", "SWED-A.ST", "SWMA.ST", "TELIA.ST", "TRUE-B.ST", "VOLV-B.ST", "EQT.ST",
    "NIBE-B.ST", "SBB-B.ST",
];

/// Default market index used for the trend banner.
pub const DEFAULT_MARKET_INDEX: &str = "^OMXSPI";

const BUILTIN_ALIASES: [(&str, &str); 8] = [
    ("VAR", "VAR.OL"),
    ("VÅR ENERGI", "VAR.OL"),
    ("VOLVO", "VOLV-B.ST"),
    ("VOLVO CAR", "VOLCAR-B.ST"),
    ("ERICSSON", "ERIC-B.ST"),
    ("MAERSK", "MAERSK-B.CO"),
    ("EQNR", "EQNR.OL"),
    ("EQUINOR", "EQNR.OL"),
];

#[derive(Debug, Clone, thiserror::Error)]
pub enum UniverseError {
    #[error("empty token in ticker list")]
    EmptyToken,

    #[error("duplicate ticker: {0}")]
    DuplicateTicker(String),
}

pub fn parse_tickers(input: &str) -> Result<Vec<String>, UniverseError> {
    let mut tickers = Vec::new();
    let mut seen = HashSet::new();

    for token in input.split(',') {
        let trimmed = token.trim();
        if trimmed.is_empty() {
            return Err(UniverseError::EmptyToken);
        }
        let ticker = trimmed.to_uppercase();
        if !seen.insert(ticker.clone()) {
            return Err(UniverseError::DuplicateTicker(ticker));
        }
        tickers.push(ticker);
    }

    Ok(tickers)
}

pub fn default_universe() -> Vec<String> {
    OMXS30_TICKERS.iter().map(|t| t.to_string()).collect()
}

/// Maps uppercased short names to exchange symbols.
#[derive(Debug, Clone)]
pub struct TickerAliases {
    map: HashMap<String, String>,
}

impl TickerAliases {
    pub fn builtin() -> Self {
        let map = BUILTIN_ALIASES
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Self { map }
    }

    pub fn insert(&mut self, alias: &str, ticker: &str) {
        self.map
            .insert(alias.trim().to_uppercase(), ticker.trim().to_uppercase());
    }

    /// Uppercase the query and map it through the alias table; unknown
    /// input is returned as the ticker itself.
    pub fn resolve(&self, query: &str) -> String {
        let key = query.trim().to_uppercase();
        self.map.get(&key).cloned().unwrap_or(key)
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

impl Default for TickerAliases {
    fn default() -> Self {
        Self::builtin()
    }
}
