//! Backtest orchestration.
//!
//! Each instrument runs the full pipeline on its own: brick size, Renko
//! bricks, trend counter, alignment, indicators, then the sequential signal
//! scan. Instruments run in parallel and are joined in input order before
//! the portfolio is evaluated. A failing instrument is reported and left
//! out; it never aborts the others.

use crate::domain::aligner::{align, AlignedRow};
use crate::domain::error::RenkotraderError;
use crate::domain::interval::{Interval, TRADING_DAYS_PER_YEAR};
use crate::domain::metrics::{portfolio_returns, Metrics, PerformanceConfig};
use crate::domain::ohlcv::OhlcvBar;
use crate::domain::renko::{brick_size, build_bricks, trend_points};
use crate::domain::signal::{run_signals, PositionState};
use crate::domain::strategy::StrategyParams;
use crate::domain::universe::{InstrumentBars, SkipReason, SkippedCode};
use chrono::NaiveDateTime;
use rayon::prelude::*;
use tracing::{debug, info, warn};

pub const DEFAULT_RISK_FREE_RATE: f64 = 0.05;

#[derive(Debug, Clone)]
pub struct BacktestConfig {
    pub codes: Vec<String>,
    pub start: Option<NaiveDateTime>,
    pub end: Option<NaiveDateTime>,
    pub interval: Interval,
    pub bars_per_day: f64,
    pub trading_days_per_year: f64,
    pub risk_free_rate: f64,
    pub strategy: StrategyParams,
}

impl BacktestConfig {
    pub fn bars_per_year(&self) -> f64 {
        self.bars_per_day * self.trading_days_per_year
    }

    pub fn performance(&self) -> PerformanceConfig {
        PerformanceConfig {
            bars_per_year: self.bars_per_year(),
            risk_free_rate: self.risk_free_rate,
        }
    }
}

impl Default for BacktestConfig {
    fn default() -> Self {
        let interval = Interval::default();
        Self {
            codes: Vec::new(),
            start: None,
            end: None,
            interval,
            bars_per_day: interval.bars_per_day(),
            trading_days_per_year: TRADING_DAYS_PER_YEAR,
            risk_free_rate: DEFAULT_RISK_FREE_RATE,
            strategy: StrategyParams::default(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct InstrumentResult {
    pub code: String,
    pub brick_size: f64,
    pub brick_count: usize,
    pub rows: Vec<AlignedRow>,
    pub positions: Vec<PositionState>,
    pub returns: Vec<(NaiveDateTime, f64)>,
    pub entries: usize,
    pub metrics: Metrics,
}

impl InstrumentResult {
    pub fn return_values(&self) -> Vec<f64> {
        self.returns.iter().map(|(_, r)| *r).collect()
    }
}

#[derive(Debug, Clone)]
pub struct BacktestResult {
    pub instruments: Vec<InstrumentResult>,
    pub skipped: Vec<SkippedCode>,
    pub portfolio: Vec<(NaiveDateTime, f64)>,
    pub metrics: Metrics,
}

pub fn run_instrument(
    code: &str,
    bars: &[OhlcvBar],
    config: &BacktestConfig,
) -> Result<InstrumentResult, RenkotraderError> {
    if bars.is_empty() {
        return Err(RenkotraderError::NoData {
            code: code.to_string(),
        });
    }

    let params = &config.strategy;
    let size = brick_size(code, bars, params.atr_window)?;
    let bricks = build_bricks(bars, size);
    let points = trend_points(&bricks);
    debug!(code, brick_size = size, bricks = bricks.len(), "renko bricks built");

    let rows = align(bars, &points, params);
    let run = run_signals(&rows, params.trend_threshold);

    let returns: Vec<(NaiveDateTime, f64)> = rows
        .iter()
        .zip(&run.returns)
        .map(|(row, r)| (row.timestamp, *r))
        .collect();
    let metrics = Metrics::compute(&run.returns, &config.performance());

    Ok(InstrumentResult {
        code: code.to_string(),
        brick_size: size,
        brick_count: bricks.len(),
        rows,
        positions: run.positions,
        returns,
        entries: run.entries,
        metrics,
    })
}

pub fn run_backtest(
    instruments: &[InstrumentBars],
    config: &BacktestConfig,
) -> Result<BacktestResult, RenkotraderError> {
    info!(instruments = instruments.len(), "running backtest");

    let outcomes: Vec<(String, Result<InstrumentResult, RenkotraderError>)> = instruments
        .par_iter()
        .map(|inst| (inst.code.clone(), run_instrument(&inst.code, &inst.bars, config)))
        .collect();

    let mut results = Vec::with_capacity(outcomes.len());
    let mut skipped = Vec::new();
    for (code, outcome) in outcomes {
        match outcome {
            Ok(result) => {
                info!(
                    code = %result.code,
                    brick_size = result.brick_size,
                    entries = result.entries,
                    "instrument evaluated"
                );
                results.push(result);
            }
            Err(e) => {
                warn!(code = %code, error = %e, "skipping instrument");
                skipped.push(SkippedCode {
                    code,
                    reason: SkipReason::Failed(e.to_string()),
                });
            }
        }
    }

    if results.is_empty() {
        return Err(RenkotraderError::NoData {
            code: "all".to_string(),
        });
    }

    let portfolio = portfolio_returns(results.iter().map(|r| r.returns.as_slice()));
    let values: Vec<f64> = portfolio.iter().map(|(_, r)| *r).collect();
    let metrics = Metrics::compute(&values, &config.performance());

    Ok(BacktestResult {
        instruments: results,
        skipped,
        portfolio,
        metrics,
    })
}
