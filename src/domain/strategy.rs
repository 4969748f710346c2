//! Renko + MACD strategy parameters.

use crate::domain::indicator::macd::{DEFAULT_FAST, DEFAULT_SIGNAL, DEFAULT_SLOW};
use crate::domain::indicator::slope::DEFAULT_WINDOW;
use crate::domain::renko::DEFAULT_ATR_WINDOW;

pub const DEFAULT_TREND_THRESHOLD: i64 = 2;

#[derive(Debug, Clone, PartialEq)]
pub struct StrategyParams {
    pub macd_fast: usize,
    pub macd_slow: usize,
    pub macd_signal: usize,
    /// ATR lookback used to size bricks.
    pub atr_window: usize,
    pub slope_window: usize,
    /// Minimum |bar_num| for an entry.
    pub trend_threshold: i64,
}

impl Default for StrategyParams {
    fn default() -> Self {
        Self {
            macd_fast: DEFAULT_FAST,
            macd_slow: DEFAULT_SLOW,
            macd_signal: DEFAULT_SIGNAL,
            atr_window: DEFAULT_ATR_WINDOW,
            slope_window: DEFAULT_WINDOW,
            trend_threshold: DEFAULT_TREND_THRESHOLD,
        }
    }
}
