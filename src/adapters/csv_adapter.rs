//! CSV bar-file data adapter.
//!
//! One file per instrument, `<base_path>/<CODE>.csv`, with a header row.
//! Columns are located by name: `timestamp` (or `datetime` / `date`),
//! `open`, `high`, `low`, `close`, optional `adj_close` (preferred over
//! `close`) and `volume`. Rows with a missing or unparsable field are
//! dropped.

use crate::domain::error::RenkotraderError;
use crate::domain::ohlcv::{parse_timestamp, OhlcvBar};
use crate::ports::data_port::DataPort;
use chrono::NaiveDateTime;
use std::fs;
use std::path::PathBuf;
use tracing::{debug, warn};

pub struct CsvAdapter {
    base_path: PathBuf,
}

struct Columns {
    timestamp: usize,
    open: usize,
    high: usize,
    low: usize,
    close: usize,
    volume: usize,
}

impl Columns {
    fn from_headers(headers: &csv::StringRecord) -> Result<Self, RenkotraderError> {
        let names: Vec<String> = headers
            .iter()
            .map(|h| h.trim().to_lowercase().replace(' ', "_"))
            .collect();
        let find = |candidates: &[&str]| {
            candidates
                .iter()
                .find_map(|c| names.iter().position(|n| n == c))
        };
        let require = |candidates: &[&str]| {
            find(candidates).ok_or_else(|| RenkotraderError::Data {
                reason: format!("missing {} column", candidates[0]),
            })
        };

        Ok(Self {
            timestamp: require(&["timestamp", "datetime", "date"])?,
            open: require(&["open"])?,
            high: require(&["high"])?,
            low: require(&["low"])?,
            close: require(&["adj_close", "close"])?,
            volume: require(&["volume"])?,
        })
    }

    fn parse(&self, code: &str, record: &csv::StringRecord) -> Option<OhlcvBar> {
        let field = |i: usize| record.get(i).map(str::trim).filter(|s| !s.is_empty());
        let number = |i: usize| field(i)?.parse::<f64>().ok().filter(|v| v.is_finite());

        Some(OhlcvBar {
            code: code.to_string(),
            timestamp: parse_timestamp(field(self.timestamp)?)?,
            open: number(self.open)?,
            high: number(self.high)?,
            low: number(self.low)?,
            close: number(self.close)?,
            volume: number(self.volume)? as i64,
        })
    }
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn csv_path(&self, code: &str) -> PathBuf {
        self.base_path.join(format!("{}.csv", code))
    }
}

impl DataPort for CsvAdapter {
    fn fetch_bars(
        &self,
        code: &str,
        start: Option<NaiveDateTime>,
        end: Option<NaiveDateTime>,
    ) -> Result<Vec<OhlcvBar>, RenkotraderError> {
        let path = self.csv_path(code);
        let content = fs::read_to_string(&path).map_err(|e| RenkotraderError::Data {
            reason: format!("failed to read {}: {}", path.display(), e),
        })?;

        let mut rdr = csv::ReaderBuilder::new()
            .flexible(true)
            .from_reader(content.as_bytes());
        let headers = rdr.headers().map_err(|e| RenkotraderError::Data {
            reason: format!("CSV header error in {}: {}", path.display(), e),
        })?;
        let columns = Columns::from_headers(headers)?;

        let mut bars = Vec::new();
        let mut dropped = 0usize;

        for result in rdr.records() {
            let record = result.map_err(|e| RenkotraderError::Data {
                reason: format!("CSV parse error: {}", e),
            })?;

            let Some(bar) = columns.parse(code, &record) else {
                dropped += 1;
                continue;
            };

            if start.is_some_and(|s| bar.timestamp < s) || end.is_some_and(|e| bar.timestamp > e) {
                continue;
            }
            bars.push(bar);
        }

        if dropped > 0 {
            warn!(code, dropped, "dropped incomplete rows");
        }
        debug!(code, bars = bars.len(), path = %path.display(), "read bars");

        bars.sort_by_key(|b| b.timestamp);
        Ok(bars)
    }

    fn list_symbols(&self) -> Result<Vec<String>, RenkotraderError> {
        let entries = fs::read_dir(&self.base_path).map_err(|e| RenkotraderError::Data {
            reason: format!(
                "failed to read directory {}: {}",
                self.base_path.display(),
                e
            ),
        })?;

        let mut symbols = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| RenkotraderError::Data {
                reason: format!("directory entry error: {}", e),
            })?;

            let name = entry.file_name();
            let name_str = name.to_string_lossy();
            if let Some(code) = name_str.strip_suffix(".csv") {
                symbols.push(code.to_string());
            }
        }

        symbols.sort();
        Ok(symbols)
    }
}
