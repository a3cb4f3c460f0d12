//! Price bar representation.

use chrono::NaiveDate;

/// One daily observation. Only `close` is required by the simulation;
/// the other fields are carried through when the provider supplies them.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceBar {
    pub date: NaiveDate,
    pub open: Option<f64>,
    pub high: Option<f64>,
    pub low: Option<f64>,
    pub close: f64,
    pub volume: Option<f64>,
}

impl PriceBar {
    pub fn from_close(date: NaiveDate, close: f64) -> Self {
        PriceBar {
            date,
            open: None,
            high: None,
            low: None,
            close,
            volume: None,
        }
    }
}
