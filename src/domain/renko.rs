//! Renko brick construction and the signed trend counter.
//!
//! Bricks are built on bar closes. The brick size is derived from the last
//! ATR value of the raw bars; each brick is stamped with the timestamp of the
//! bar that completed it. A reversal needs two bricks of movement against
//! the current trend, and the first of them is absorbed by the reversal.

use crate::domain::error::RenkotraderError;
use crate::domain::indicator::calculate_atr;
use crate::domain::ohlcv::OhlcvBar;
use chrono::NaiveDateTime;

pub const DEFAULT_ATR_WINDOW: usize = 120;
pub const MIN_BRICK_SIZE: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
}

impl Direction {
    fn unit(direction: Option<Direction>) -> i64 {
        match direction {
            Some(Direction::Up) => 1,
            Some(Direction::Down) => -1,
            None => 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Brick {
    pub timestamp: NaiveDateTime,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    /// `None` for the seed brick at the start of the series.
    pub direction: Option<Direction>,
}

impl Brick {
    fn up(timestamp: NaiveDateTime, base: f64, size: f64) -> Self {
        Self {
            timestamp,
            open: base,
            high: base + size,
            low: base,
            close: base + size,
            direction: Some(Direction::Up),
        }
    }

    fn down(timestamp: NaiveDateTime, base: f64, size: f64) -> Self {
        Self {
            timestamp,
            open: base,
            high: base,
            low: base - size,
            close: base - size,
            direction: Some(Direction::Down),
        }
    }
}

/// A brick reduced to what the aligner needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrendPoint {
    pub timestamp: NaiveDateTime,
    pub bar_num: i64,
}

/// Brick size = max(0.5, ATR rounded half-to-even to a whole number).
///
/// Fails when fewer than `atr_window` bars are available or the ATR is not
/// finite, rather than producing a zero-size brick series.
pub fn brick_size(code: &str, bars: &[OhlcvBar], atr_window: usize) -> Result<f64, RenkotraderError> {
    if bars.len() < atr_window || atr_window == 0 {
        return Err(RenkotraderError::InsufficientData {
            code: code.to_string(),
            bars: bars.len(),
            minimum: atr_window.max(1),
        });
    }

    let atr = calculate_atr(bars, atr_window)
        .last()
        .filter(|v| v.is_finite())
        .ok_or_else(|| RenkotraderError::DegenerateBrickSize {
            code: code.to_string(),
            reason: format!("ATR({}) is undefined", atr_window),
        })?;

    Ok(atr.round_ties_even().max(MIN_BRICK_SIZE))
}

/// Period-close Renko bricks for a fixed brick size.
pub fn build_bricks(bars: &[OhlcvBar], size: f64) -> Vec<Brick> {
    let Some(first) = bars.first() else {
        return Vec::new();
    };
    if size.is_nan() || size <= 0.0 {
        return Vec::new();
    }

    let seed_close = (first.close / size).floor() * size;
    let mut bricks = vec![Brick {
        timestamp: first.timestamp,
        open: seed_close - size,
        high: seed_close,
        low: seed_close - size,
        close: seed_close,
        direction: None,
    }];

    let mut uptrend = true;
    let mut last_close = seed_close;

    for bar in bars {
        let moves = ((bar.close - last_close) / size).trunc() as i64;

        match (uptrend, moves) {
            (true, m) if m >= 1 => {
                for _ in 0..m {
                    bricks.push(Brick::up(bar.timestamp, last_close, size));
                    last_close += size;
                }
            }
            (true, m) if m <= -2 => {
                uptrend = false;
                last_close -= size;
                for _ in 0..(m.abs() - 1) {
                    bricks.push(Brick::down(bar.timestamp, last_close, size));
                    last_close -= size;
                }
            }
            (false, m) if m <= -1 => {
                for _ in 0..m.abs() {
                    bricks.push(Brick::down(bar.timestamp, last_close, size));
                    last_close -= size;
                }
            }
            (false, m) if m >= 2 => {
                uptrend = true;
                last_close += size;
                for _ in 0..(m - 1) {
                    bricks.push(Brick::up(bar.timestamp, last_close, size));
                    last_close += size;
                }
            }
            _ => {}
        }
    }

    bricks
}

/// Signed run-length counter: a unit extends the previous value when both
/// share a strict sign, otherwise it restarts the count.
pub fn trend_counter(directions: &[Option<Direction>]) -> Vec<i64> {
    let mut counts: Vec<i64> = Vec::with_capacity(directions.len());
    for &direction in directions {
        let unit = Direction::unit(direction);
        let count = match counts.last() {
            Some(&prev) if (unit > 0 && prev > 0) || (unit < 0 && prev < 0) => prev + unit,
            _ => unit,
        };
        counts.push(count);
    }
    counts
}

/// Trend counter per brick, keeping the last brick for each timestamp.
pub fn trend_points(bricks: &[Brick]) -> Vec<TrendPoint> {
    let directions: Vec<Option<Direction>> = bricks.iter().map(|b| b.direction).collect();
    let counts = trend_counter(&directions);

    let mut points: Vec<TrendPoint> = Vec::with_capacity(bricks.len());
    for (brick, bar_num) in bricks.iter().zip(counts) {
        match points.last_mut() {
            Some(last) if last.timestamp == brick.timestamp => last.bar_num = bar_num,
            _ => points.push(TrendPoint {
                timestamp: brick.timestamp,
                bar_num,
            }),
        }
    }
    points
}
