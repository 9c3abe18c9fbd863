//! Core domain types and logic.

pub mod ohlcv;
pub mod indicator;
pub mod signal;
pub mod holding;
pub mod position_store;
pub mod analysis;
pub mod analysis_cache;
pub mod retry;
pub mod dashboard;
pub mod screener;
pub mod portfolio;
pub mod universe;
pub mod config_validation;
pub mod error;
