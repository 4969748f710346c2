//! Per-instrument position state machine.
//!
//! The return for a row is decided by the position held entering the row;
//! the transition is evaluated afterwards and governs the next row.

use crate::domain::aligner::AlignedRow;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PositionState {
    #[default]
    Flat,
    Long,
    Short,
}

impl fmt::Display for PositionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PositionState::Flat => write!(f, "Flat"),
            PositionState::Long => write!(f, "Long"),
            PositionState::Short => write!(f, "Short"),
        }
    }
}

/// Indicator values of one row, present only when every one is defined.
#[derive(Debug, Clone, Copy)]
struct Signals {
    bar_num: i64,
    macd: f64,
    signal: f64,
    macd_slope: f64,
    signal_slope: f64,
}

impl Signals {
    fn from_row(row: &AlignedRow) -> Option<Self> {
        let finite = |v: Option<f64>| v.filter(|x| x.is_finite());
        Some(Self {
            bar_num: row.bar_num?,
            macd: finite(row.macd)?,
            signal: finite(row.macd_signal)?,
            macd_slope: finite(row.macd_slope)?,
            signal_slope: finite(row.macd_signal_slope)?,
        })
    }

    fn bullish(&self) -> bool {
        self.macd > self.signal && self.macd_slope > self.signal_slope
    }

    fn bearish(&self) -> bool {
        self.macd < self.signal && self.macd_slope < self.signal_slope
    }

    fn long_entry(&self, threshold: i64) -> bool {
        self.bar_num >= threshold && self.bullish()
    }

    fn short_entry(&self, threshold: i64) -> bool {
        self.bar_num <= -threshold && self.bearish()
    }
}

#[derive(Debug, Clone)]
pub struct SignalStateMachine {
    state: PositionState,
    threshold: i64,
    prev_close: Option<f64>,
    row: usize,
    returns: Vec<f64>,
    positions: Vec<PositionState>,
    entries: usize,
}

/// Output of one instrument's scan.
#[derive(Debug, Clone, PartialEq)]
pub struct SignalRun {
    pub returns: Vec<f64>,
    /// Position held entering each row.
    pub positions: Vec<PositionState>,
    pub entries: usize,
    pub final_state: PositionState,
}

impl SignalStateMachine {
    pub fn new(threshold: i64) -> Self {
        Self {
            state: PositionState::Flat,
            threshold,
            prev_close: None,
            row: 0,
            returns: Vec::new(),
            positions: Vec::new(),
            entries: 0,
        }
    }

    pub fn state(&self) -> PositionState {
        self.state
    }

    /// Record the return for `row` and apply at most one transition.
    pub fn step(&mut self, row: &AlignedRow) -> f64 {
        let ret = match (self.state, self.prev_close) {
            (PositionState::Flat, _) => 0.0,
            (_, Some(prev)) if prev != 0.0 => row.close / prev - 1.0,
            // Zero closes never reach here through `clean_bars`; a hand-built
            // row with one records no return rather than an infinite one.
            _ => 0.0,
        };
        self.returns.push(ret);
        self.positions.push(self.state);

        let signals = if self.row > 0 {
            Signals::from_row(row)
        } else {
            None
        };
        if let Some(signals) = signals {
            let next = self.transition(&signals);
            if next != self.state && next != PositionState::Flat {
                self.entries += 1;
            }
            self.state = next;
        }

        self.prev_close = Some(row.close);
        self.row += 1;
        ret
    }

    fn transition(&self, s: &Signals) -> PositionState {
        let t = self.threshold;
        match self.state {
            PositionState::Flat if s.long_entry(t) => PositionState::Long,
            PositionState::Flat if s.short_entry(t) => PositionState::Short,
            PositionState::Long if s.short_entry(t) => PositionState::Short,
            PositionState::Long if s.bearish() => PositionState::Flat,
            PositionState::Short if s.long_entry(t) => PositionState::Long,
            PositionState::Short if s.bullish() => PositionState::Flat,
            state => state,
        }
    }

    pub fn finish(self) -> SignalRun {
        SignalRun {
            returns: self.returns,
            positions: self.positions,
            entries: self.entries,
            final_state: self.state,
        }
    }
}

/// Sequential scan over an instrument's aligned rows.
pub fn run_signals(rows: &[AlignedRow], threshold: i64) -> SignalRun {
    let mut machine = SignalStateMachine::new(threshold);
    for row in rows {
        machine.step(row);
    }
    machine.finish()
}
