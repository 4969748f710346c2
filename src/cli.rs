//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::info;

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::csv_report_adapter::CsvReportAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::domain::backtest::{self as backtest_engine, BacktestConfig, BacktestResult};
use crate::domain::config_validation::{
    build_backtest_config, data_dir, validate_backtest_config, validate_strategy_config,
};
use crate::domain::error::RenkotraderError;
use crate::domain::indicator::IndicatorType;
use crate::domain::metrics::Metrics;
use crate::domain::universe::{load_universe, parse_codes, SkippedCode};
use crate::ports::data_port::DataPort;
use crate::ports::report_port::ReportPort;

#[derive(Parser, Debug)]
#[command(name = "renkotrader", about = "Intraday Renko + MACD strategy evaluator")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a backtest
    Backtest {
        #[arg(short, long)]
        config: PathBuf,
        /// Comma-separated codes, replacing the configured universe
        #[arg(long)]
        code: Option<String>,
        #[arg(long)]
        data_dir: Option<PathBuf>,
        /// Write per-bar returns as CSV
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[arg(long)]
        dry_run: bool,
    },
    /// Validate a configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// List codes with a bar file in the data directory
    ListSymbols {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        data_dir: Option<PathBuf>,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Backtest {
            config,
            code,
            data_dir,
            output,
            dry_run,
        } => run_backtest(
            &config,
            code.as_deref(),
            data_dir.as_deref(),
            output.as_deref(),
            dry_run,
        ),
        Command::Validate { config } => run_validate(&config),
        Command::ListSymbols { config, data_dir } => run_list_symbols(&config, data_dir.as_deref()),
    }
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, ExitCode> {
    FileConfigAdapter::from_file(path).map_err(|e| {
        let err = RenkotraderError::ConfigParse {
            file: path.display().to_string(),
            reason: e.to_string(),
        };
        eprintln!("error: {err}");
        ExitCode::from(&err)
    })
}

fn fail(err: RenkotraderError) -> ExitCode {
    eprintln!("error: {err}");
    (&err).into()
}

/// `--code` replaces the configured universe.
pub fn apply_code_override(
    config: &mut BacktestConfig,
    code_override: Option<&str>,
) -> Result<(), RenkotraderError> {
    if let Some(codes) = code_override {
        config.codes = parse_codes(codes).map_err(|e| RenkotraderError::ConfigInvalid {
            section: "backtest".into(),
            key: "codes".into(),
            reason: e.to_string(),
        })?;
    }
    Ok(())
}

fn resolve_data_dir(adapter: &FileConfigAdapter, data_dir_override: Option<&Path>) -> PathBuf {
    data_dir_override
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(data_dir(adapter)))
}

fn run_backtest(
    config_path: &Path,
    code_override: Option<&str>,
    data_dir_override: Option<&Path>,
    output_path: Option<&Path>,
    dry_run: bool,
) -> ExitCode {
    info!(path = %config_path.display(), "loading config");
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    let mut bt_config = match build_backtest_config(&adapter) {
        Ok(c) => c,
        Err(e) => return fail(e),
    };
    if let Err(e) = apply_code_override(&mut bt_config, code_override) {
        return fail(e);
    }
    let dir = resolve_data_dir(&adapter, data_dir_override);

    if dry_run {
        print_plan(&bt_config, &dir);
        eprintln!("\nDry run complete: configuration is valid");
        return ExitCode::SUCCESS;
    }

    let data_port = CsvAdapter::new(dir);
    run_backtest_pipeline(&data_port, &bt_config, output_path)
}

pub fn run_backtest_pipeline(
    data_port: &dyn DataPort,
    bt_config: &BacktestConfig,
    output_path: Option<&Path>,
) -> ExitCode {
    let universe = match load_universe(
        data_port,
        &bt_config.codes,
        bt_config.start,
        bt_config.end,
        bt_config.strategy.atr_window,
    ) {
        Ok(u) => u,
        Err(e) => return fail(e),
    };

    let result = match backtest_engine::run_backtest(&universe.instruments, bt_config) {
        Ok(r) => r,
        Err(e) => return fail(e),
    };

    print_summary(&result, &universe.skipped);

    if let Some(path) = output_path {
        if let Err(e) = CsvReportAdapter::new().write(&result, path) {
            return fail(e);
        }
        eprintln!("\nReturns written to: {}", path.display());
    }

    ExitCode::SUCCESS
}

fn format_sharpe(sharpe: Option<f64>) -> String {
    sharpe.map_or_else(|| "n/a".to_string(), |s| format!("{:.2}", s))
}

fn print_metrics(metrics: &Metrics) {
    println!("Bars:             {}", metrics.bars);
    println!("Total Return:     {:.2}%", metrics.total_return * 100.0);
    println!("CAGR:             {:.2}%", metrics.cagr * 100.0);
    println!("Volatility:       {:.2}%", metrics.volatility * 100.0);
    println!("Sharpe Ratio:     {}", format_sharpe(metrics.sharpe_ratio));
    println!("Max Drawdown:     -{:.1}%", metrics.max_drawdown * 100.0);
}

pub fn print_summary(result: &BacktestResult, load_skipped: &[SkippedCode]) {
    println!("=== Portfolio ===");
    print_metrics(&result.metrics);

    println!("\n=== Per-Instrument Summary ===");
    for inst in &result.instruments {
        println!(
            "  {}:  brick {:.2}, {} entries, CAGR {:.2}%, Sharpe {}, MaxDD -{:.1}%",
            inst.code,
            inst.brick_size,
            inst.entries,
            inst.metrics.cagr * 100.0,
            format_sharpe(inst.metrics.sharpe_ratio),
            inst.metrics.max_drawdown * 100.0,
        );
    }

    let skipped: Vec<&SkippedCode> = load_skipped.iter().chain(&result.skipped).collect();
    if !skipped.is_empty() {
        println!("\n=== Skipped ===");
        for s in skipped {
            println!("  {}: {}", s.code, s.reason);
        }
    }
}

fn print_plan(config: &BacktestConfig, dir: &Path) {
    let params = &config.strategy;
    eprintln!("\nUniverse:");
    eprintln!("  codes:    {}", config.codes.join(", "));
    eprintln!("  data_dir: {}", dir.display());
    eprintln!(
        "  window:   {} to {}",
        config
            .start
            .map_or_else(|| "first bar".to_string(), |t| t.to_string()),
        config
            .end
            .map_or_else(|| "last bar".to_string(), |t| t.to_string()),
    );

    eprintln!("\nSampling:");
    eprintln!("  interval:      {}", config.interval);
    eprintln!("  bars/year:     {}", config.bars_per_year());
    eprintln!("  risk-free:     {}", config.risk_free_rate);

    eprintln!("\nIndicators to compute:");
    let indicators = [
        IndicatorType::Atr(params.atr_window),
        IndicatorType::Macd {
            fast: params.macd_fast,
            slow: params.macd_slow,
            signal: params.macd_signal,
        },
        IndicatorType::MacdSignal {
            fast: params.macd_fast,
            slow: params.macd_slow,
            signal: params.macd_signal,
        },
        IndicatorType::Slope(params.slope_window),
    ];
    for ind in &indicators {
        eprintln!("  {}", ind);
    }
    eprintln!("  trend threshold: {}", params.trend_threshold);
}

fn run_validate(config_path: &Path) -> ExitCode {
    eprintln!("Validating config: {}", config_path.display());
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    if let Err(e) = validate_backtest_config(&adapter) {
        return fail(e);
    }
    if let Err(e) = validate_strategy_config(&adapter) {
        return fail(e);
    }

    match build_backtest_config(&adapter) {
        Ok(config) => {
            print_plan(&config, &resolve_data_dir(&adapter, None));
            eprintln!("\nConfiguration is valid.");
            ExitCode::SUCCESS
        }
        Err(e) => fail(e),
    }
}

fn run_list_symbols(config_path: &Path, data_dir_override: Option<&Path>) -> ExitCode {
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    let dir = resolve_data_dir(&adapter, data_dir_override);
    let symbols = match CsvAdapter::new(dir.clone()).list_symbols() {
        Ok(s) => s,
        Err(e) => return fail(e),
    };

    if symbols.is_empty() {
        eprintln!("No symbols found in {}", dir.display());
    } else {
        for symbol in &symbols {
            println!("{}", symbol);
        }
        eprintln!("{} symbols found", symbols.len());
    }
    ExitCode::SUCCESS
}
