//! Configuration validation.
//!
//! Validates the `[backtest]` and `[strategy]` sections before a run and
//! builds the typed [`BacktestConfig`]. Every key is optional; absent keys
//! take the documented defaults.

use crate::domain::backtest::{BacktestConfig, DEFAULT_RISK_FREE_RATE};
use crate::domain::error::RenkotraderError;
use crate::domain::indicator::macd::{DEFAULT_FAST, DEFAULT_SIGNAL, DEFAULT_SLOW};
use crate::domain::indicator::slope;
use crate::domain::interval::{Interval, TRADING_DAYS_PER_YEAR};
use crate::domain::ohlcv::parse_timestamp;
use crate::domain::renko::DEFAULT_ATR_WINDOW;
use crate::domain::strategy::{StrategyParams, DEFAULT_TREND_THRESHOLD};
use crate::domain::universe::{default_codes, parse_codes};
use crate::ports::config_port::ConfigPort;
use chrono::NaiveDateTime;

pub const DEFAULT_DATA_DIR: &str = "data";

pub fn validate_backtest_config(config: &dyn ConfigPort) -> Result<(), RenkotraderError> {
    resolve_codes(config)?;
    resolve_interval(config)?;
    validate_bars_per_day(config)?;
    validate_trading_days(config)?;
    validate_risk_free_rate(config)?;
    resolve_window(config)?;
    Ok(())
}

pub fn validate_strategy_config(config: &dyn ConfigPort) -> Result<(), RenkotraderError> {
    strategy_params(config).map(|_| ())
}

/// Validate both sections and build the run configuration.
pub fn build_backtest_config(config: &dyn ConfigPort) -> Result<BacktestConfig, RenkotraderError> {
    validate_backtest_config(config)?;
    let strategy = strategy_params(config)?;
    let interval = resolve_interval(config)?;
    let (start, end) = resolve_window(config)?;

    Ok(BacktestConfig {
        codes: resolve_codes(config)?,
        start,
        end,
        interval,
        bars_per_day: config.get_double("backtest", "bars_per_day", interval.bars_per_day()),
        trading_days_per_year: config.get_double(
            "backtest",
            "trading_days_per_year",
            TRADING_DAYS_PER_YEAR,
        ),
        risk_free_rate: config.get_double("backtest", "risk_free_rate", DEFAULT_RISK_FREE_RATE),
        strategy,
    })
}

pub fn data_dir(config: &dyn ConfigPort) -> String {
    config
        .get_string("backtest", "data_dir")
        .unwrap_or_else(|| DEFAULT_DATA_DIR.to_string())
}

fn invalid(section: &str, key: &str, reason: impl Into<String>) -> RenkotraderError {
    RenkotraderError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: reason.into(),
    }
}

fn resolve_codes(config: &dyn ConfigPort) -> Result<Vec<String>, RenkotraderError> {
    match config.get_string("backtest", "codes") {
        Some(codes) => {
            parse_codes(&codes).map_err(|e| invalid("backtest", "codes", e.to_string()))
        }
        None => Ok(default_codes()),
    }
}

fn resolve_interval(config: &dyn ConfigPort) -> Result<Interval, RenkotraderError> {
    match config.get_string("backtest", "interval") {
        Some(s) => s.parse().map_err(|e: String| invalid("backtest", "interval", e)),
        None => Ok(Interval::default()),
    }
}

fn validate_bars_per_day(config: &dyn ConfigPort) -> Result<(), RenkotraderError> {
    if config.get_string("backtest", "bars_per_day").is_none() {
        return Ok(());
    }
    let value = config.get_double("backtest", "bars_per_day", 0.0);
    if value <= 0.0 {
        return Err(invalid(
            "backtest",
            "bars_per_day",
            "bars_per_day must be positive",
        ));
    }
    Ok(())
}

fn validate_trading_days(config: &dyn ConfigPort) -> Result<(), RenkotraderError> {
    let value = config.get_double("backtest", "trading_days_per_year", TRADING_DAYS_PER_YEAR);
    if value <= 0.0 {
        return Err(invalid(
            "backtest",
            "trading_days_per_year",
            "trading_days_per_year must be positive",
        ));
    }
    Ok(())
}

fn validate_risk_free_rate(config: &dyn ConfigPort) -> Result<(), RenkotraderError> {
    let value = config.get_double("backtest", "risk_free_rate", DEFAULT_RISK_FREE_RATE);
    if !(0.0..1.0).contains(&value) {
        return Err(invalid(
            "backtest",
            "risk_free_rate",
            "risk_free_rate must be between 0 and 1",
        ));
    }
    Ok(())
}

fn parse_bound(
    config: &dyn ConfigPort,
    key: &str,
) -> Result<Option<NaiveDateTime>, RenkotraderError> {
    match config.get_string("backtest", key) {
        None => Ok(None),
        Some(s) => parse_timestamp(&s).map(Some).ok_or_else(|| {
            invalid(
                "backtest",
                key,
                format!("invalid {} format, expected YYYY-MM-DD[ HH:MM:SS]", key),
            )
        }),
    }
}

fn resolve_window(
    config: &dyn ConfigPort,
) -> Result<(Option<NaiveDateTime>, Option<NaiveDateTime>), RenkotraderError> {
    let start = parse_bound(config, "start")?;
    let end = parse_bound(config, "end")?;

    if let (Some(s), Some(e)) = (start, end) {
        if s >= e {
            return Err(invalid("backtest", "start", "start must be before end"));
        }
    }
    Ok((start, end))
}

fn window(
    config: &dyn ConfigPort,
    key: &str,
    default: usize,
    minimum: i64,
) -> Result<usize, RenkotraderError> {
    let value = config.get_int("strategy", key, default as i64);
    if value < minimum {
        return Err(invalid(
            "strategy",
            key,
            format!("{} must be at least {}", key, minimum),
        ));
    }
    Ok(value as usize)
}

fn strategy_params(config: &dyn ConfigPort) -> Result<StrategyParams, RenkotraderError> {
    let macd_fast = window(config, "macd_fast", DEFAULT_FAST, 1)?;
    let macd_slow = window(config, "macd_slow", DEFAULT_SLOW, 1)?;
    let macd_signal = window(config, "macd_signal", DEFAULT_SIGNAL, 1)?;
    if macd_fast >= macd_slow {
        return Err(invalid(
            "strategy",
            "macd_fast",
            "macd_fast must be less than macd_slow",
        ));
    }

    let atr_window = window(config, "atr_window", DEFAULT_ATR_WINDOW, 1)?;
    let slope_window = window(config, "slope_window", slope::DEFAULT_WINDOW, 2)?;

    let trend_threshold = config.get_int("strategy", "trend_threshold", DEFAULT_TREND_THRESHOLD);
    if trend_threshold < 1 {
        return Err(invalid(
            "strategy",
            "trend_threshold",
            "trend_threshold must be at least 1",
        ));
    }

    Ok(StrategyParams {
        macd_fast,
        macd_slow,
        macd_signal,
        atr_window,
        slope_window,
        trend_threshold,
    })
}
