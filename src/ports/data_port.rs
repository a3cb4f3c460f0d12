//! Price data access port.
//!
//! Providers validate symbols against their own catalog and return bars
//! sorted ascending by date. Failures surface as data errors
//! (`BacktesterError::is_data_error`) before any simulation runs.

use crate::domain::error::BacktesterError;
use crate::domain::ohlcv::PriceBar;

pub trait DataPort {
    fn fetch_prices(&self, symbol: &str) -> Result<Vec<PriceBar>, BacktesterError>;

    fn list_symbols(&self) -> Result<Vec<String>, BacktesterError>;

    fn is_valid_symbol(&self, symbol: &str) -> Result<bool, BacktesterError> {
        Ok(self.list_symbols()?.iter().any(|s| s == symbol))
    }
}
