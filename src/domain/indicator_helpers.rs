//! Materialised indicator sets.
//!
//! Every requested indicator is computed over the whole series before the
//! engine walks a single bar. Strategies read from the finished set by index.

use std::collections::BTreeMap;

use crate::domain::indicator::returns::calculate_returns;
use crate::domain::indicator::sma::{calculate_sma, calculate_sma_partial};
use crate::domain::indicator::{IndicatorSeries, IndicatorType};
use crate::domain::ohlcv::PriceBar;
use crate::domain::price_series::PriceSeries;

/// Parallel indicator columns, each indexed like the bars they were built from.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IndicatorSet {
    series: BTreeMap<IndicatorType, IndicatorSeries>,
}

impl IndicatorSet {
    pub fn get(&self, indicator_type: &IndicatorType) -> Option<&IndicatorSeries> {
        self.series.get(indicator_type)
    }

    /// `None` when the indicator was not computed or is still warming up.
    pub fn value(&self, indicator_type: &IndicatorType, index: usize) -> Option<f64> {
        self.series
            .get(indicator_type)
            .and_then(|s| s.value_at(index))
    }

    /// Values of `types` at one bar, in the order given.
    pub fn row(&self, types: &[IndicatorType], index: usize) -> Vec<Option<f64>> {
        types.iter().map(|t| self.value(t, index)).collect()
    }

    pub fn types(&self) -> Vec<IndicatorType> {
        self.series.keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    fn insert(&mut self, series: IndicatorSeries) {
        self.series.insert(series.indicator_type, series);
    }
}

pub fn compute_indicator(bars: &[PriceBar], indicator_type: IndicatorType) -> IndicatorSeries {
    match indicator_type {
        IndicatorType::Sma(period) => calculate_sma(bars, period),
        IndicatorType::SmaPartial(period) => calculate_sma_partial(bars, period),
        IndicatorType::Returns => calculate_returns(bars),
    }
}

/// Compute every requested indicator. Duplicates are computed once.
pub fn compute_indicators(bars: &[PriceBar], types: &[IndicatorType]) -> IndicatorSet {
    let mut set = IndicatorSet::default();
    for &t in types {
        if set.get(&t).is_none() {
            set.insert(compute_indicator(bars, t));
        }
    }
    set
}

/// Strict-window SMAs for each window length.
pub fn compute_moving_averages(series: &PriceSeries, windows: &[usize]) -> IndicatorSet {
    let types: Vec<IndicatorType> = windows.iter().map(|&w| IndicatorType::Sma(w)).collect();
    compute_indicators(series.bars(), &types)
}

pub fn compute_returns(series: &PriceSeries) -> IndicatorSeries {
    calculate_returns(series.bars())
}
