//! Bar-over-bar market return.
//!
//! R[i] = (C[i] - C[i-1]) / C[i-1]
//! Undefined at bar 0, and wherever C[i-1] == 0.

use crate::domain::indicator::{IndicatorPoint, IndicatorSeries, IndicatorType};
use crate::domain::ohlcv::PriceBar;

pub fn calculate_returns(bars: &[PriceBar]) -> IndicatorSeries {
    let mut values = Vec::with_capacity(bars.len());

    for i in 0..bars.len() {
        let value = if i == 0 {
            None
        } else {
            let prev_close = bars[i - 1].close;
            if prev_close == 0.0 {
                None
            } else {
                Some((bars[i].close - prev_close) / prev_close)
            }
        };

        values.push(IndicatorPoint {
            date: bars[i].date,
            value,
        });
    }

    IndicatorSeries {
        indicator_type: IndicatorType::Returns,
        values,
    }
}
