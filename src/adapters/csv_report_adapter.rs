//! CSV report adapter implementing ReportPort.
//!
//! Writes the annotated series, one row per bar:
//! `date, close, <indicator columns...>, market_return, in_position, shares, balance`.
//! Undefined indicator values are written as empty fields.

use std::path::Path;

use crate::domain::backtest::BacktestResult;
use crate::domain::error::BacktesterError;
use crate::ports::report_port::ReportPort;

pub struct CsvReportAdapter;

impl CsvReportAdapter {
    pub fn new() -> Self {
        CsvReportAdapter
    }

    fn header(result: &BacktestResult) -> Vec<String> {
        let mut header = vec!["date".to_string(), "close".to_string()];
        header.extend(result.indicators.types().iter().map(|t| t.column_name()));
        header.extend(
            ["market_return", "in_position", "shares", "balance"]
                .iter()
                .map(|s| s.to_string()),
        );
        header
    }

    fn format_optional(value: Option<f64>) -> String {
        value.map(|v| v.to_string()).unwrap_or_default()
    }

    fn rows(result: &BacktestResult) -> Vec<Vec<String>> {
        let types = result.indicators.types();
        result
            .series
            .bars()
            .iter()
            .zip(&result.states)
            .enumerate()
            .map(|(i, (bar, state))| {
                let mut row = vec![bar.date.format("%Y-%m-%d").to_string(), bar.close.to_string()];
                row.extend(
                    result
                        .indicators
                        .row(&types, i)
                        .into_iter()
                        .map(Self::format_optional),
                );
                row.push(Self::format_optional(result.returns.value_at(i)));
                row.push(state.in_position.to_string());
                row.push(state.shares.to_string());
                row.push(state.balance.to_string());
                row
            })
            .collect()
    }
}

impl Default for CsvReportAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportPort for CsvReportAdapter {
    fn write(&self, result: &BacktestResult, output_path: &Path) -> Result<(), BacktesterError> {
        let csv_error = |e: csv::Error| {
            BacktesterError::Io(std::io::Error::other(format!(
                "failed to write {}: {}",
                output_path.display(),
                e
            )))
        };

        let mut writer = csv::Writer::from_path(output_path).map_err(csv_error)?;
        writer.write_record(Self::header(result)).map_err(csv_error)?;
        for row in Self::rows(result) {
            writer.write_record(&row).map_err(csv_error)?;
        }
        writer.flush()?;
        Ok(())
    }
}
