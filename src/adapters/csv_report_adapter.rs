//! Wide-format CSV return report.
//!
//! One row per timestamp on the portfolio timeline: `timestamp`, one column
//! per evaluated instrument, then `portfolio`. An instrument with no bar at a
//! timestamp leaves its cell empty.

use crate::domain::backtest::BacktestResult;
use crate::domain::error::RenkotraderError;
use crate::ports::report_port::ReportPort;
use chrono::NaiveDateTime;
use std::collections::HashMap;
use std::path::Path;
use tracing::info;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Default)]
pub struct CsvReportAdapter;

impl CsvReportAdapter {
    pub fn new() -> Self {
        Self
    }
}

fn csv_error(e: csv::Error) -> RenkotraderError {
    RenkotraderError::Data {
        reason: format!("CSV write error: {}", e),
    }
}

impl ReportPort for CsvReportAdapter {
    fn write(&self, result: &BacktestResult, output_path: &Path) -> Result<(), RenkotraderError> {
        let mut writer = csv::Writer::from_path(output_path).map_err(csv_error)?;

        let mut header = vec!["timestamp".to_string()];
        header.extend(result.instruments.iter().map(|r| r.code.clone()));
        header.push("portfolio".to_string());
        writer.write_record(&header).map_err(csv_error)?;

        let lookups: Vec<HashMap<NaiveDateTime, f64>> = result
            .instruments
            .iter()
            .map(|r| r.returns.iter().copied().collect())
            .collect();

        for (ts, portfolio) in &result.portfolio {
            let mut record = Vec::with_capacity(header.len());
            record.push(ts.format(TIMESTAMP_FORMAT).to_string());
            for lookup in &lookups {
                record.push(lookup.get(ts).map(|r| r.to_string()).unwrap_or_default());
            }
            record.push(portfolio.to_string());
            writer.write_record(&record).map_err(csv_error)?;
        }

        writer.flush()?;
        info!(
            path = %output_path.display(),
            rows = result.portfolio.len(),
            "returns written"
        );
        Ok(())
    }
}
