//! Core domain types and logic.

pub mod ohlcv;
pub mod price_series;
pub mod indicator;
pub mod indicator_helpers;
pub mod signal;
pub mod strategy;
pub mod backtest;
pub mod trade;
pub mod config_validation;
pub mod error;
