//! Integration tests for the evaluation pipeline.
//!
//! Tests cover:
//! - Hand-computed three-bar scenario (brick size, bar_num, MACD, returns)
//! - Universe loading through a mock data port with partial failures
//! - Multi-instrument backtest and portfolio aggregation
//! - CSV data adapter feeding the pipeline end to end

mod common;

use approx::assert_relative_eq;
use common::*;
use renkotrader::adapters::csv_adapter::CsvAdapter;
use renkotrader::domain::backtest::{run_backtest, run_instrument, BacktestConfig};
use renkotrader::domain::error::RenkotraderError;
use renkotrader::domain::metrics::portfolio_returns;
use renkotrader::domain::renko::{brick_size, build_bricks, trend_points};
use renkotrader::domain::signal::PositionState;
use renkotrader::domain::strategy::StrategyParams;
use renkotrader::domain::universe::{load_universe, SkipReason};
use std::fs;

mod three_bar_scenario {
    use super::*;

    // TR = [0.8, 1.4, 1.3], ATR(3) = 1.1667 -> brick size 1.0.
    fn bars() -> Vec<OhlcvBar> {
        vec![
            make_bar("TEST", 0, 10.0, 10.4, 9.6, 10.2),
            make_bar("TEST", 1, 10.2, 11.6, 10.2, 11.5),
            make_bar("TEST", 2, 11.5, 12.8, 11.5, 12.6),
        ]
    }

    fn config() -> BacktestConfig {
        BacktestConfig {
            codes: vec!["TEST".into()],
            strategy: StrategyParams {
                macd_fast: 1,
                macd_slow: 2,
                macd_signal: 2,
                atr_window: 3,
                slope_window: 2,
                trend_threshold: 1,
            },
            ..BacktestConfig::default()
        }
    }

    #[test]
    fn brick_size_is_one() {
        assert_eq!(brick_size("TEST", &bars(), 3).unwrap(), 1.0);
    }

    #[test]
    fn bricks_and_trend_counter() {
        // Seed at floor(10.2) = 10, then one up brick on each later bar.
        let bricks = build_bricks(&bars(), 1.0);
        let closes: Vec<f64> = bricks.iter().map(|b| b.close).collect();
        assert_eq!(closes, vec![10.0, 11.0, 12.0]);

        let points = trend_points(&bricks);
        let nums: Vec<i64> = points.iter().map(|p| p.bar_num).collect();
        assert_eq!(nums, vec![0, 1, 2]);
        assert_eq!(points[2].timestamp, ts(2));
    }

    #[test]
    fn reference_table() {
        let result = run_instrument("TEST", &bars(), &config()).unwrap();

        assert_eq!(result.brick_size, 1.0);
        assert_eq!(result.brick_count, 3);

        let nums: Vec<Option<i64>> = result.rows.iter().map(|r| r.bar_num).collect();
        assert_eq!(nums, vec![Some(0), Some(1), Some(2)]);

        // EMA(1) = close; EMA(2) = [-, 11.175, 158.1/13].
        assert_eq!(result.rows[0].macd, None);
        assert_relative_eq!(result.rows[1].macd.unwrap(), 0.325, epsilon = 1e-12);
        assert_relative_eq!(result.rows[2].macd.unwrap(), 5.7 / 13.0, epsilon = 1e-12);

        assert_eq!(result.rows[1].macd_signal, None);
        assert_relative_eq!(
            result.rows[2].macd_signal.unwrap(),
            (0.325 / 3.0 + 5.7 / 13.0) * 0.75,
            epsilon = 1e-12
        );

        // A slope window touching an undefined MACD is undefined.
        assert_eq!(result.rows[0].macd_slope, Some(0.0));
        assert_eq!(result.rows[1].macd_slope, None);
        assert_relative_eq!(result.rows[2].macd_slope.unwrap(), 45.0, epsilon = 1e-9);
        assert_eq!(result.rows[2].macd_signal_slope, None);

        assert_eq!(result.return_values(), vec![0.0, 0.0, 0.0]);
        assert!(result.positions.iter().all(|p| *p == PositionState::Flat));
        assert_eq!(result.entries, 0);
        assert_eq!(result.metrics.total_return, 0.0);
        assert_eq!(result.metrics.cagr, 0.0);
        assert_eq!(result.metrics.sharpe_ratio, None);
    }
}

mod universe_loading {
    use super::*;

    #[test]
    fn partial_universe_skips_bad_codes() {
        let port = MockDataPort::new()
            .with_bars("MSFT", wave_bars("MSFT", 120, 6.0, 0.02))
            .with_bars("AAPL", wave_bars("AAPL", 10, 6.0, 0.02))
            .with_error("IBM", "file not found");

        let codes: Vec<String> = ["MSFT", "AAPL", "IBM", "AMD"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let data = load_universe(&port, &codes, None, None, 20).unwrap();

        assert_eq!(data.instruments.len(), 1);
        assert_eq!(data.instruments[0].code, "MSFT");
        assert_eq!(data.skipped.len(), 3);
        assert_eq!(data.skipped[0].code, "AAPL");
        assert_eq!(
            data.skipped[0].reason,
            SkipReason::InsufficientBars { bars: 10 }
        );
        assert_eq!(data.skipped[1].reason, SkipReason::NoData);
        assert_eq!(data.skipped[2].code, "AMD");
    }

    #[test]
    fn window_is_applied() {
        let port = MockDataPort::new().with_bars("MSFT", wave_bars("MSFT", 100, 6.0, 0.0));
        let codes = vec!["MSFT".to_string()];
        let data = load_universe(&port, &codes, Some(ts(10)), Some(ts(59)), 20).unwrap();

        let bars = &data.instruments[0].bars;
        assert_eq!(bars.len(), 50);
        assert_eq!(bars[0].timestamp, ts(10));
    }

    #[test]
    fn empty_universe_is_error() {
        let port = MockDataPort::new();
        let codes = vec!["MSFT".to_string()];
        let err = load_universe(&port, &codes, None, None, 20).err().unwrap();
        assert!(matches!(err, RenkotraderError::InsufficientData { .. }));
    }
}

mod full_backtest_pipeline {
    use super::*;

    #[test]
    fn multi_instrument_portfolio() {
        let port = MockDataPort::new()
            .with_bars("MSFT", wave_bars("MSFT", 300, 8.0, 0.03))
            .with_bars("AAPL", wave_bars("AAPL", 250, 5.0, -0.02));
        let config = sample_config(&["MSFT", "AAPL"]);

        let data = load_universe(&port, &config.codes, None, None, 20).unwrap();
        let result = run_backtest(&data.instruments, &config).unwrap();

        assert_eq!(result.instruments.len(), 2);
        assert_eq!(result.instruments[0].code, "MSFT");
        assert_eq!(result.instruments[1].code, "AAPL");
        assert_eq!(result.portfolio.len(), 300);

        // Where both trade, the portfolio is the plain mean.
        let msft = &result.instruments[0].returns;
        let aapl = &result.instruments[1].returns;
        for i in [0usize, 100, 249] {
            assert_eq!(result.portfolio[i].0, msft[i].0);
            assert_relative_eq!(
                result.portfolio[i].1,
                (msft[i].1 + aapl[i].1) / 2.0,
                epsilon = 1e-15
            );
        }
        // Past AAPL's last bar only MSFT contributes.
        assert_eq!(result.portfolio[299].1, msft[299].1);

        assert_eq!(
            result.portfolio,
            portfolio_returns([msft.as_slice(), aapl.as_slice()])
        );
        assert!(result.metrics.max_drawdown >= 0.0 && result.metrics.max_drawdown <= 1.0);
    }

    #[test]
    fn trending_wave_trades() {
        let bars = wave_bars("MSFT", 400, 10.0, 0.05);
        let result = run_instrument("MSFT", &bars, &sample_config(&["MSFT"])).unwrap();

        assert!(result.entries > 0);
        assert!(result.positions.iter().any(|p| *p != PositionState::Flat));
        for (i, (pos, (_, ret))) in result.positions.iter().zip(&result.returns).enumerate() {
            match pos {
                PositionState::Flat => assert_eq!(*ret, 0.0),
                _ => assert_relative_eq!(
                    *ret,
                    bars[i].close / bars[i - 1].close - 1.0,
                    epsilon = 1e-12
                ),
            }
        }
    }

    #[test]
    fn short_history_instrument_is_isolated() {
        let port = MockDataPort::new()
            .with_bars("MSFT", wave_bars("MSFT", 200, 8.0, 0.0))
            .with_bars("IBM", wave_bars("IBM", 30, 8.0, 0.0));
        let config = sample_config(&["MSFT", "IBM"]);

        let data = load_universe(&port, &config.codes, None, None, 20).unwrap();
        let mut short = data.instruments.clone();
        short[1].bars.truncate(5);

        let result = run_backtest(&short, &config).unwrap();
        assert_eq!(result.instruments.len(), 1);
        assert_eq!(result.skipped.len(), 1);
        assert_eq!(result.skipped[0].code, "IBM");
    }
}

mod csv_pipeline {
    use super::*;
    use renkotrader::ports::data_port::DataPort;

    fn write_csv(dir: &std::path::Path, code: &str, bars: &[OhlcvBar]) {
        let mut content = String::from("timestamp,open,high,low,close,volume\n");
        for b in bars {
            content.push_str(&format!(
                "{},{},{},{},{},{}\n",
                b.timestamp.format("%Y-%m-%d %H:%M:%S"),
                b.open,
                b.high,
                b.low,
                b.close,
                b.volume
            ));
        }
        content.push_str("2024-05-01 23:55:00,,,,,\n");
        fs::write(dir.join(format!("{}.csv", code)), content).unwrap();
    }

    #[test]
    fn csv_files_match_in_memory_run() {
        let dir = tempfile::TempDir::new().unwrap();
        let bars = wave_bars("MSFT", 150, 7.0, 0.01);
        write_csv(dir.path(), "MSFT", &bars);

        let adapter = CsvAdapter::new(dir.path().to_path_buf());
        assert_eq!(adapter.list_symbols().unwrap(), vec!["MSFT"]);

        let config = sample_config(&["MSFT"]);
        let data = load_universe(&adapter, &config.codes, None, None, 20).unwrap();
        assert_eq!(data.instruments[0].bars.len(), 150);

        let from_csv = run_backtest(&data.instruments, &config).unwrap();
        let direct = run_instrument("MSFT", &bars, &config).unwrap();

        assert_eq!(from_csv.instruments[0].brick_size, direct.brick_size);
        assert_eq!(from_csv.instruments[0].positions, direct.positions);
        for (a, b) in from_csv.instruments[0].returns.iter().zip(&direct.returns) {
            assert_eq!(a.0, b.0);
            assert_relative_eq!(a.1, b.1, epsilon = 1e-12);
        }
    }
}
