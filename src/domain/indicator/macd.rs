//! MACD (Moving Average Convergence Divergence).
//!
//! MACD Line = EMA(fast) - EMA(slow)
//! Signal Line = EMA(signal) of MACD Line
//!
//! Default parameters: fast=12, slow=26, signal=9.
//! Warmup: line defined from index slow-1, signal from slow-1 + signal-1.

use crate::domain::indicator::{calculate_ema, IndicatorSeries, IndicatorType};

pub const DEFAULT_FAST: usize = 12;
pub const DEFAULT_SLOW: usize = 26;
pub const DEFAULT_SIGNAL: usize = 9;

#[derive(Debug, Clone)]
pub struct MacdSeries {
    pub line: IndicatorSeries,
    pub signal: IndicatorSeries,
}

pub fn calculate_macd(
    closes: &[Option<f64>],
    fast: usize,
    slow: usize,
    signal_period: usize,
) -> MacdSeries {
    let line_type = IndicatorType::Macd {
        fast,
        slow,
        signal: signal_period,
    };
    let signal_type = IndicatorType::MacdSignal {
        fast,
        slow,
        signal: signal_period,
    };

    if closes.is_empty() || fast == 0 || slow == 0 || signal_period == 0 {
        return MacdSeries {
            line: IndicatorSeries::empty(line_type),
            signal: IndicatorSeries::empty(signal_type),
        };
    }

    let ema_fast = calculate_ema(closes, fast);
    let ema_slow = calculate_ema(closes, slow);

    let line: Vec<Option<f64>> = ema_fast
        .values
        .iter()
        .zip(&ema_slow.values)
        .map(|(f, s)| match (f, s) {
            (Some(f), Some(s)) => Some(f - s),
            _ => None,
        })
        .collect();

    let signal = calculate_ema(&line, signal_period).values;

    MacdSeries {
        line: IndicatorSeries {
            indicator_type: line_type,
            values: line,
        },
        signal: IndicatorSeries {
            indicator_type: signal_type,
            values: signal,
        },
    }
}

pub fn calculate_macd_default(closes: &[Option<f64>]) -> MacdSeries {
    calculate_macd(closes, DEFAULT_FAST, DEFAULT_SLOW, DEFAULT_SIGNAL)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn ramp(count: usize) -> Vec<Option<f64>> {
        (0..count).map(|i| Some(100.0 + i as f64)).collect()
    }

    #[test]
    fn macd_warmup_default() {
        let series = calculate_macd_default(&ramp(40));

        for i in 0..DEFAULT_SLOW - 1 {
            assert!(series.line.values[i].is_none(), "line {} should be undefined", i);
        }
        assert!(series.line.values[DEFAULT_SLOW - 1].is_some());

        let warmup = DEFAULT_SLOW - 1 + DEFAULT_SIGNAL - 1;
        assert!(series.signal.values[warmup - 1].is_none());
        assert!(series.signal.values[warmup].is_some());
    }

    #[test]
    fn macd_fewer_than_slow_bars_entirely_undefined() {
        let series = calculate_macd_default(&ramp(DEFAULT_SLOW - 1));
        assert_eq!(series.line.len(), DEFAULT_SLOW - 1);
        assert!(series.line.values.iter().all(Option::is_none));
        assert!(series.signal.values.iter().all(Option::is_none));
    }

    #[test]
    fn macd_line_is_ema_fast_minus_ema_slow() {
        let closes = ramp(10);
        let series = calculate_macd(&closes, 3, 5, 2);
        let fast = calculate_ema(&closes, 3);
        let slow = calculate_ema(&closes, 5);

        for i in 4..10 {
            assert_relative_eq!(
                series.line.get(i).unwrap(),
                fast.get(i).unwrap() - slow.get(i).unwrap(),
                epsilon = 1e-12
            );
        }
    }

    #[test]
    fn macd_rising_prices_positive_line() {
        let series = calculate_macd_default(&ramp(60));
        assert!(series.line.last().unwrap() > 0.0);
        assert!(series.signal.last().unwrap() > 0.0);
    }

    #[test]
    fn macd_indicator_types() {
        let series = calculate_macd(&ramp(3), 5, 10, 3);
        assert_eq!(
            series.line.indicator_type,
            IndicatorType::Macd {
                fast: 5,
                slow: 10,
                signal: 3
            }
        );
        assert_eq!(series.signal.indicator_type.to_string(), "MACD_SIGNAL(5,10,3)");
    }

    #[test]
    fn macd_zero_period() {
        let closes = ramp(3);
        assert!(calculate_macd(&closes, 0, 26, 9).line.is_empty());
        assert!(calculate_macd(&closes, 12, 0, 9).line.is_empty());
        assert!(calculate_macd(&closes, 12, 26, 0).signal.is_empty());
    }

    #[test]
    fn macd_empty_input() {
        let series = calculate_macd_default(&[]);
        assert!(series.line.is_empty());
        assert!(series.signal.is_empty());
    }
}
