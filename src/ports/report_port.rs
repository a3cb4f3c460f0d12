//! Backtest result output port.

use std::path::Path;

use crate::domain::backtest::BacktestResult;
use crate::domain::error::BacktesterError;

pub trait ReportPort {
    fn write(&self, result: &BacktestResult, output_path: &Path) -> Result<(), BacktesterError>;
}
