//! Concrete adapter implementations for ports.

pub mod csv_bar_cache;
pub mod csv_price_source;
pub mod csv_holding_repository;
pub mod csv_scan_store;
pub mod file_config_adapter;
pub mod text_report;
