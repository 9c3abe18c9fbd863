//! Configuration validation.
//!
//! Every key is optional; a key that is present must hold a usable value.
//! Runs before any command touches data.

use crate::domain::dashboard::MAX_LOOKBACK_DAYS;
use crate::domain::error::DashboardError;
use crate::domain::universe::{self, UniverseError};
use crate::ports::config_port::ConfigPort;

pub fn validate_dashboard_config(config: &dyn ConfigPort) -> Result<(), DashboardError> {
    validate_paths(config)?;
    validate_fetch(config)?;
    validate_market(config)?;
    validate_screener(config)?;
    validate_aliases(config)?;
    Ok(())
}

fn invalid(section: &str, key: &str, reason: String) -> DashboardError {
    DashboardError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason,
    }
}

fn validate_non_empty(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
) -> Result<(), DashboardError> {
    match config.get_string(section, key) {
        Some(s) if s.trim().is_empty() => {
            Err(invalid(section, key, format!("{} must not be empty", key)))
        }
        _ => Ok(()),
    }
}

fn validate_paths(config: &dyn ConfigPort) -> Result<(), DashboardError> {
    validate_non_empty(config, "data", "dir")?;
    validate_non_empty(config, "data", "cache_dir")?;
    validate_non_empty(config, "portfolio", "file")?;
    validate_non_empty(config, "portfolio", "scan_dir")?;
    Ok(())
}

fn validate_int_in_range(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    min: i64,
    max: Option<i64>,
) -> Result<(), DashboardError> {
    let Some(raw) = config.get_string(section, key) else {
        return Ok(());
    };
    let value: i64 = raw
        .trim()
        .parse()
        .map_err(|_| invalid(section, key, format!("{} must be an integer", key)))?;
    if value < min {
        return Err(invalid(section, key, format!("{} must be at least {}", key, min)));
    }
    if let Some(max) = max.filter(|max| value > *max) {
        return Err(invalid(section, key, format!("{} must be at most {}", key, max)));
    }
    Ok(())
}

fn validate_fetch(config: &dyn ConfigPort) -> Result<(), DashboardError> {
    validate_int_in_range(config, "fetch", "max_attempts", 1, None)?;
    validate_int_in_range(config, "fetch", "pacing_ms", 0, None)?;
    validate_int_in_range(config, "fetch", "cache_ttl_minutes", 0, None)?;
    validate_int_in_range(config, "fetch", "lookback_days", 1, Some(MAX_LOOKBACK_DAYS))?;

    if let Some(raw) = config.get_string("fetch", "retry_delay_secs") {
        let value: f64 = raw.trim().parse().map_err(|_| {
            invalid("fetch", "retry_delay_secs", "retry_delay_secs must be a number".into())
        })?;
        if !value.is_finite() || value < 0.0 {
            return Err(invalid(
                "fetch",
                "retry_delay_secs",
                "retry_delay_secs must be non-negative".into(),
            ));
        }
    }
    Ok(())
}

fn validate_market(config: &dyn ConfigPort) -> Result<(), DashboardError> {
    validate_non_empty(config, "market", "index")
}

fn validate_screener(config: &dyn ConfigPort) -> Result<(), DashboardError> {
    match config.get_string("screener", "tickers") {
        Some(list) => universe::parse_tickers(&list).map(|_| ()).map_err(|e| {
            let reason = match e {
                UniverseError::EmptyToken => "tickers contains an empty entry".to_string(),
                other => other.to_string(),
            };
            invalid("screener", "tickers", reason)
        }),
        None => Ok(()),
    }
}

fn validate_aliases(config: &dyn ConfigPort) -> Result<(), DashboardError> {
    for (alias, ticker) in config.section_entries("aliases") {
        if ticker.trim().is_empty() {
            return Err(invalid("aliases", &alias, format!("alias {} has no ticker", alias)));
        }
    }
    Ok(())
}
