//! Concrete adapter implementations for ports.

pub mod csv_market_adapter;
pub mod file_config_adapter;
pub mod paper_execution_adapter;
