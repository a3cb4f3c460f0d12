//! Technical indicator implementations.
//!
//! - `IndicatorPoint`: a single point in an indicator time series
//! - `IndicatorType`: indicator identity + parameters (serves as HashMap key)
//! - `IndicatorSeries`: a time series of indicator values, one per bar
//!
//! Warmup bars carry `value: None`. They are never filled with a placeholder
//! number, so an undefined value cannot leak into arithmetic.

pub mod returns;
pub mod sma;

use chrono::NaiveDate;
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorPoint {
    pub date: NaiveDate,
    pub value: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum IndicatorType {
    /// Strict window: undefined until `period` bars are available.
    Sma(usize),
    /// Defined from bar 0, averaging whatever history exists (min_periods = 1).
    SmaPartial(usize),
    /// Bar-over-bar fractional change of the close.
    Returns,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorSeries {
    pub indicator_type: IndicatorType,
    pub values: Vec<IndicatorPoint>,
}

impl IndicatorSeries {
    /// Value at bar `index`; `None` during warmup or past the end.
    pub fn value_at(&self, index: usize) -> Option<f64> {
        self.values.get(index).and_then(|p| p.value)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Index of the first defined value, if any.
    pub fn first_defined(&self) -> Option<usize> {
        self.values.iter().position(|p| p.value.is_some())
    }
}

impl IndicatorType {
    /// Column name used in reports.
    pub fn column_name(&self) -> String {
        match self {
            IndicatorType::Sma(period) => format!("sma_{}", period),
            IndicatorType::SmaPartial(period) => format!("mavg_{}", period),
            IndicatorType::Returns => "market_return".to_string(),
        }
    }
}

impl fmt::Display for IndicatorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndicatorType::Sma(period) => write!(f, "SMA({})", period),
            IndicatorType::SmaPartial(period) => write!(f, "SMA({}, min_periods=1)", period),
            IndicatorType::Returns => write!(f, "RETURNS"),
        }
    }
}
