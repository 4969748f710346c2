//! Technical indicator implementations.
//!
//! Every indicator produces an [`IndicatorSeries`] aligned index-for-index
//! with its input. Positions without enough history hold `None`.

pub mod atr;
pub mod ema;
pub mod macd;
pub mod slope;

pub use atr::calculate_atr;
pub use ema::calculate_ema;
pub use macd::{calculate_macd, MacdSeries};
pub use slope::calculate_slope;

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum IndicatorType {
    Atr(usize),
    Ema(usize),
    Macd {
        fast: usize,
        slow: usize,
        signal: usize,
    },
    MacdSignal {
        fast: usize,
        slow: usize,
        signal: usize,
    },
    Slope(usize),
}

#[derive(Debug, Clone)]
pub struct IndicatorSeries {
    pub indicator_type: IndicatorType,
    pub values: Vec<Option<f64>>,
}

impl IndicatorSeries {
    pub fn empty(indicator_type: IndicatorType) -> Self {
        Self {
            indicator_type,
            values: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<f64> {
        self.values.get(index).copied().flatten()
    }

    pub fn last(&self) -> Option<f64> {
        self.values.last().copied().flatten()
    }
}

impl fmt::Display for IndicatorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndicatorType::Atr(period) => write!(f, "ATR({})", period),
            IndicatorType::Ema(span) => write!(f, "EMA({})", span),
            IndicatorType::Macd { fast, slow, signal } => {
                write!(f, "MACD({},{},{})", fast, slow, signal)
            }
            IndicatorType::MacdSignal { fast, slow, signal } => {
                write!(f, "MACD_SIGNAL({},{},{})", fast, slow, signal)
            }
            IndicatorType::Slope(window) => write!(f, "SLOPE({})", window),
        }
    }
}
