//! Market data access port.

use crate::domain::error::RenkotraderError;
use crate::domain::ohlcv::OhlcvBar;
use chrono::NaiveDateTime;

pub trait DataPort {
    /// Bars for `code` within the optional inclusive window, sorted by
    /// timestamp. Rows with missing fields are not returned.
    fn fetch_bars(
        &self,
        code: &str,
        start: Option<NaiveDateTime>,
        end: Option<NaiveDateTime>,
    ) -> Result<Vec<OhlcvBar>, RenkotraderError>;

    fn list_symbols(&self) -> Result<Vec<String>, RenkotraderError>;
}
