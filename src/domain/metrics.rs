//! Performance metrics over per-bar return series.
//!
//! All reductions are pure functions of the return slice. Annualization
//! uses the number of bars per year for the sampling interval.

use chrono::NaiveDateTime;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PerformanceConfig {
    pub bars_per_year: f64,
    pub risk_free_rate: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Metrics {
    pub bars: usize,
    pub total_return: f64,
    pub cagr: f64,
    pub volatility: f64,
    /// `None` when volatility is zero or undefined.
    pub sharpe_ratio: Option<f64>,
    pub max_drawdown: f64,
}

impl Metrics {
    pub fn compute(returns: &[f64], config: &PerformanceConfig) -> Self {
        let cagr_value = cagr(returns, config.bars_per_year);
        let vol = volatility(returns, config.bars_per_year);
        Metrics {
            bars: returns.len(),
            total_return: cumulative_returns(returns).last().map_or(0.0, |c| c - 1.0),
            cagr: cagr_value,
            volatility: vol,
            sharpe_ratio: sharpe_from(cagr_value, vol, config.risk_free_rate),
            max_drawdown: max_drawdown(returns),
        }
    }
}

/// Running product of (1 + r).
pub fn cumulative_returns(returns: &[f64]) -> Vec<f64> {
    returns
        .iter()
        .scan(1.0, |acc, r| {
            *acc *= 1.0 + r;
            Some(*acc)
        })
        .collect()
}

pub fn cagr(returns: &[f64], bars_per_year: f64) -> f64 {
    let Some(&final_value) = cumulative_returns(returns).last() else {
        return 0.0;
    };
    let years = returns.len() as f64 / bars_per_year;
    if years > 0.0 && final_value.is_finite() {
        final_value.powf(1.0 / years) - 1.0
    } else {
        0.0
    }
}

/// Sample standard deviation (n - 1) scaled by sqrt(bars_per_year).
pub fn volatility(returns: &[f64], bars_per_year: f64) -> f64 {
    if returns.len() < 2 {
        return 0.0;
    }

    if returns.iter().all(|r| *r == returns[0]) {
        return 0.0;
    }

    let n = returns.len() as f64;
    let mean = returns.iter().sum::<f64>() / n;
    let variance = returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / (n - 1.0);
    variance.sqrt() * bars_per_year.sqrt()
}

pub fn sharpe(returns: &[f64], config: &PerformanceConfig) -> Option<f64> {
    sharpe_from(
        cagr(returns, config.bars_per_year),
        volatility(returns, config.bars_per_year),
        config.risk_free_rate,
    )
}

fn sharpe_from(cagr: f64, volatility: f64, risk_free_rate: f64) -> Option<f64> {
    if volatility > 0.0 && volatility.is_finite() {
        Some((cagr - risk_free_rate) / volatility)
    } else {
        None
    }
}

/// Largest (running peak - value) / running peak of the cumulative curve.
pub fn max_drawdown(returns: &[f64]) -> f64 {
    let mut peak = f64::NEG_INFINITY;
    let mut max_dd = 0.0_f64;

    for value in cumulative_returns(returns) {
        if value > peak {
            peak = value;
        } else if peak > 0.0 {
            let dd = (peak - value) / peak;
            if dd > max_dd {
                max_dd = dd;
            }
        }
    }

    max_dd
}

/// Mean return across instruments at every timestamp of the unified
/// timeline. Instruments without a bar at a timestamp do not contribute.
pub fn portfolio_returns<'a, I>(series: I) -> Vec<(NaiveDateTime, f64)>
where
    I: IntoIterator<Item = &'a [(NaiveDateTime, f64)]>,
{
    let mut sums: BTreeMap<NaiveDateTime, (f64, usize)> = BTreeMap::new();
    for returns in series {
        for &(timestamp, ret) in returns {
            let entry = sums.entry(timestamp).or_insert((0.0, 0));
            entry.0 += ret;
            entry.1 += 1;
        }
    }

    sums.into_iter()
        .map(|(timestamp, (sum, count))| (timestamp, sum / count as f64))
        .collect()
}
