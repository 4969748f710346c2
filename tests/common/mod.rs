#![allow(dead_code)]

use chrono::{NaiveDate, NaiveDateTime};
use renkotrader::domain::backtest::BacktestConfig;
use renkotrader::domain::error::RenkotraderError;
pub use renkotrader::domain::ohlcv::OhlcvBar;
use renkotrader::domain::strategy::StrategyParams;
use renkotrader::ports::data_port::DataPort;
use std::collections::HashMap;

pub struct MockDataPort {
    pub data: HashMap<String, Vec<OhlcvBar>>,
    pub errors: HashMap<String, String>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            errors: HashMap::new(),
        }
    }

    pub fn with_bars(mut self, code: &str, bars: Vec<OhlcvBar>) -> Self {
        self.data.insert(code.to_string(), bars);
        self
    }

    pub fn with_error(mut self, code: &str, reason: &str) -> Self {
        self.errors.insert(code.to_string(), reason.to_string());
        self
    }
}

impl DataPort for MockDataPort {
    fn fetch_bars(
        &self,
        code: &str,
        start: Option<NaiveDateTime>,
        end: Option<NaiveDateTime>,
    ) -> Result<Vec<OhlcvBar>, RenkotraderError> {
        if let Some(reason) = self.errors.get(code) {
            return Err(RenkotraderError::Data {
                reason: reason.clone(),
            });
        }
        Ok(self
            .data
            .get(code)
            .map(|bars| {
                bars.iter()
                    .filter(|b| start.is_none_or(|s| b.timestamp >= s))
                    .filter(|b| end.is_none_or(|e| b.timestamp <= e))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    fn list_symbols(&self) -> Result<Vec<String>, RenkotraderError> {
        let mut symbols: Vec<String> = self.data.keys().cloned().collect();
        symbols.sort();
        Ok(symbols)
    }
}

/// Session open on 2024-05-01 plus `step` five-minute bars.
pub fn ts(step: i64) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 5, 1)
        .unwrap()
        .and_hms_opt(9, 30, 0)
        .unwrap()
        + chrono::Duration::minutes(5 * step)
}

pub fn make_bar(code: &str, step: i64, open: f64, high: f64, low: f64, close: f64) -> OhlcvBar {
    OhlcvBar {
        code: code.to_string(),
        timestamp: ts(step),
        open,
        high,
        low,
        close,
        volume: 1000,
    }
}

/// Oscillating closes with a slow drift, wide enough to form bricks in both
/// directions.
pub fn wave_bars(code: &str, count: usize, amplitude: f64, drift: f64) -> Vec<OhlcvBar> {
    (0..count)
        .map(|i| {
            let close = 100.0 + ((i as f64) / 7.0).sin() * amplitude + i as f64 * drift;
            make_bar(code, i as i64, close, close + 0.6, close - 0.6, close)
        })
        .collect()
}

pub fn small_params() -> StrategyParams {
    StrategyParams {
        atr_window: 20,
        ..StrategyParams::default()
    }
}

pub fn sample_config(codes: &[&str]) -> BacktestConfig {
    BacktestConfig {
        codes: codes.iter().map(|c| c.to_string()).collect(),
        strategy: small_params(),
        ..BacktestConfig::default()
    }
}
