//! Per-bar trading decisions and the strategy interface.
//!
//! A strategy is a pure decision function over a [`DecisionContext`]. The
//! context only exposes data up to the bar being decided, so a strategy cannot
//! read future prices. All cash and share bookkeeping belongs to the engine.

use std::fmt;

use crate::domain::indicator::IndicatorType;
use crate::domain::indicator_helpers::IndicatorSet;
use crate::domain::price_series::PriceSeries;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Decision {
    Buy,
    Sell,
    Hold,
}

impl Decision {
    /// +1 for buy, -1 for sell, 0 for hold.
    pub fn as_signal(self) -> i8 {
        match self {
            Decision::Buy => 1,
            Decision::Sell => -1,
            Decision::Hold => 0,
        }
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Decision::Buy => write!(f, "buy"),
            Decision::Sell => write!(f, "sell"),
            Decision::Hold => write!(f, "hold"),
        }
    }
}

/// Read-only view of the series as of one bar.
#[derive(Debug, Clone, Copy)]
pub struct DecisionContext<'a> {
    series: &'a PriceSeries,
    indicators: &'a IndicatorSet,
    index: usize,
    in_position: bool,
}

impl<'a> DecisionContext<'a> {
    pub fn new(
        series: &'a PriceSeries,
        indicators: &'a IndicatorSet,
        index: usize,
        in_position: bool,
    ) -> Self {
        DecisionContext {
            series,
            indicators,
            index,
            in_position,
        }
    }

    /// The bar being decided.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn in_position(&self) -> bool {
        self.in_position
    }

    /// Close at `index`, or `None` if `index` lies after the current bar.
    pub fn close(&self, index: usize) -> Option<f64> {
        if index > self.index {
            return None;
        }
        self.series.bars().get(index).map(|b| b.close)
    }

    /// Indicator value at `index`, or `None` if undefined or in the future.
    pub fn indicator(&self, indicator_type: &IndicatorType, index: usize) -> Option<f64> {
        if index > self.index {
            return None;
        }
        self.indicators.value(indicator_type, index)
    }
}

pub trait SignalStrategy: Send + Sync {
    /// Registry identifier.
    fn name(&self) -> &str;

    /// Indicators the engine must materialise before the first decision.
    fn required_indicators(&self) -> Vec<IndicatorType>;

    fn decide(&self, ctx: &DecisionContext<'_>) -> Decision;
}
