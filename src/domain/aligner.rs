//! Merges the Renko trend counter onto the bar timeline.
//!
//! `bar_num` at a bar is the counter of the last brick completed at or
//! before that bar's timestamp. MACD, signal and their slopes are computed
//! on the aligned close column after the merge.

use crate::domain::indicator::{calculate_macd, calculate_slope};
use crate::domain::ohlcv::OhlcvBar;
use crate::domain::renko::TrendPoint;
use crate::domain::strategy::StrategyParams;
use chrono::NaiveDateTime;

#[derive(Debug, Clone, PartialEq)]
pub struct AlignedRow {
    pub timestamp: NaiveDateTime,
    pub close: f64,
    pub bar_num: Option<i64>,
    pub macd: Option<f64>,
    pub macd_signal: Option<f64>,
    pub macd_slope: Option<f64>,
    pub macd_signal_slope: Option<f64>,
}

/// Carry-forward lookup of the trend counter for each bar.
///
/// Both inputs must be sorted by timestamp.
pub fn forward_fill(bars: &[OhlcvBar], points: &[TrendPoint]) -> Vec<Option<i64>> {
    let mut filled = Vec::with_capacity(bars.len());
    let mut next = 0;
    let mut current: Option<i64> = None;

    for bar in bars {
        while next < points.len() && points[next].timestamp <= bar.timestamp {
            current = Some(points[next].bar_num);
            next += 1;
        }
        filled.push(current);
    }
    filled
}

pub fn align(bars: &[OhlcvBar], points: &[TrendPoint], params: &StrategyParams) -> Vec<AlignedRow> {
    let bar_nums = forward_fill(bars, points);

    let closes: Vec<Option<f64>> = bars.iter().map(|b| Some(b.close)).collect();
    let macd = calculate_macd(
        &closes,
        params.macd_fast,
        params.macd_slow,
        params.macd_signal,
    );
    let macd_slope = calculate_slope(&macd.line.values, params.slope_window);
    let signal_slope = calculate_slope(&macd.signal.values, params.slope_window);

    bars.iter()
        .zip(bar_nums)
        .enumerate()
        .map(|(i, (bar, bar_num))| AlignedRow {
            timestamp: bar.timestamp,
            close: bar.close,
            bar_num,
            macd: macd.line.get(i),
            macd_signal: macd.signal.get(i),
            macd_slope: macd_slope.get(i),
            macd_signal_slope: signal_slope.get(i),
        })
        .collect()
}
