//! Core domain types and logic.

pub mod ohlcv;
pub mod interval;
pub mod indicator;
pub mod renko;
pub mod aligner;
pub mod signal;
pub mod strategy;
pub mod metrics;
pub mod backtest;
pub mod universe;
pub mod config_validation;
pub mod error;
