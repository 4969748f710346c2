//! Report generation port.

use crate::domain::backtest::BacktestResult;
use crate::domain::error::RenkotraderError;
use std::path::Path;

/// Port for writing backtest return series.
pub trait ReportPort {
    fn write(&self, result: &BacktestResult, output_path: &Path) -> Result<(), RenkotraderError>;
}
