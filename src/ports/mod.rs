//! Ports: the traits adapters implement.

pub mod cache_port;
pub mod config_port;
pub mod holding_port;
pub mod price_port;
pub mod scan_port;
