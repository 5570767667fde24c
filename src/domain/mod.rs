//! Core domain types and logic.

pub mod ohlcv;
pub mod indicator;
pub mod position;
pub mod strategy;
pub mod portfolio;
pub mod execution;
pub mod backtest;
pub mod metrics;
pub mod config_validation;
pub mod error;
