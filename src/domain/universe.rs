//! Instrument universe: code list parsing and bar loading.
//!
//! Loads every configured code through the data port, drops incomplete rows,
//! and skips codes with no data or too little history for brick sizing.

use crate::domain::error::RenkotraderError;
use crate::domain::ohlcv::OhlcvBar;
use crate::ports::data_port::DataPort;
use chrono::NaiveDateTime;
use std::collections::HashSet;
use tracing::{info, warn};

pub const DEFAULT_UNIVERSE: [&str; 10] = [
    "MSFT", "AAPL", "META", "AMZN", "INTC", "CSCO", "VZ", "IBM", "TSLA", "AMD",
];

#[derive(Debug, Clone, thiserror::Error)]
pub enum UniverseError {
    #[error("empty token in code list")]
    EmptyToken,

    #[error("duplicate code: {0}")]
    DuplicateCode(String),
}

pub fn parse_codes(input: &str) -> Result<Vec<String>, UniverseError> {
    let mut codes = Vec::new();
    let mut seen = HashSet::new();

    for token in input.split(',') {
        let trimmed = token.trim();
        if trimmed.is_empty() {
            return Err(UniverseError::EmptyToken);
        }
        let code = trimmed.to_uppercase();
        if !seen.insert(code.clone()) {
            return Err(UniverseError::DuplicateCode(code));
        }
        codes.push(code);
    }

    Ok(codes)
}

pub fn default_codes() -> Vec<String> {
    DEFAULT_UNIVERSE.iter().map(|c| c.to_string()).collect()
}

/// One instrument's bars, sorted by timestamp.
#[derive(Debug, Clone)]
pub struct InstrumentBars {
    pub code: String,
    pub bars: Vec<OhlcvBar>,
}

impl InstrumentBars {
    pub fn new(code: &str, bars: Vec<OhlcvBar>) -> Self {
        Self {
            code: code.to_string(),
            bars,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SkippedCode {
    pub code: String,
    pub reason: SkipReason,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SkipReason {
    NoData,
    InsufficientBars { bars: usize },
    Failed(String),
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::NoData => write!(f, "no data"),
            SkipReason::InsufficientBars { bars } => write!(f, "only {} bars", bars),
            SkipReason::Failed(reason) => write!(f, "{}", reason),
        }
    }
}

pub struct UniverseData {
    pub instruments: Vec<InstrumentBars>,
    pub skipped: Vec<SkippedCode>,
}

/// Drop incomplete rows, sort by timestamp and keep the last row for any
/// repeated timestamp.
pub fn clean_bars(mut bars: Vec<OhlcvBar>) -> Vec<OhlcvBar> {
    bars.retain(OhlcvBar::is_complete);
    bars.sort_by_key(|b| b.timestamp);

    let mut cleaned: Vec<OhlcvBar> = Vec::with_capacity(bars.len());
    for bar in bars {
        match cleaned.last_mut() {
            Some(last) if last.timestamp == bar.timestamp => *last = bar,
            _ => cleaned.push(bar),
        }
    }
    cleaned
}

pub fn load_universe(
    data_port: &dyn DataPort,
    codes: &[String],
    start: Option<NaiveDateTime>,
    end: Option<NaiveDateTime>,
    min_bars: usize,
) -> Result<UniverseData, RenkotraderError> {
    let mut instruments = Vec::new();
    let mut skipped = Vec::new();

    for code in codes {
        let bars = match data_port.fetch_bars(code, start, end) {
            Ok(bars) => clean_bars(bars),
            Err(e) => {
                warn!(code = %code, error = %e, "skipping code");
                skipped.push(SkippedCode {
                    code: code.clone(),
                    reason: SkipReason::NoData,
                });
                continue;
            }
        };

        if bars.is_empty() {
            warn!(code = %code, "skipping code: no data found");
            skipped.push(SkippedCode {
                code: code.clone(),
                reason: SkipReason::NoData,
            });
            continue;
        }

        if bars.len() < min_bars {
            warn!(
                code = %code,
                bars = bars.len(),
                minimum = min_bars,
                "skipping code: insufficient history"
            );
            skipped.push(SkippedCode {
                code: code.clone(),
                reason: SkipReason::InsufficientBars { bars: bars.len() },
            });
            continue;
        }

        info!(code = %code, bars = bars.len(), "loaded");
        instruments.push(InstrumentBars {
            code: code.clone(),
            bars,
        });
    }

    if instruments.is_empty() {
        return Err(RenkotraderError::InsufficientData {
            code: "all".to_string(),
            bars: 0,
            minimum: min_bars,
        });
    }

    if !skipped.is_empty() {
        info!(
            loaded = instruments.len(),
            requested = codes.len(),
            "universe partially loaded"
        );
    }

    Ok(UniverseData {
        instruments,
        skipped,
    })
}
