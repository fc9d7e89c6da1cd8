//! Core domain types and logic.

pub mod security;
pub mod window;
pub mod factor;
pub mod ttm;
pub mod fscore;
pub mod rank;
pub mod filter;
pub mod pipeline;
pub mod weights;
pub mod schedule;
pub mod rebalance;
pub mod strategy;
pub mod runner;
pub mod metrics;
pub mod config_validation;
pub mod error;
