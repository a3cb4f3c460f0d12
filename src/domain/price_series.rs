//! Validated, date-ordered price series.
//!
//! A `PriceSeries` is immutable once built. Indicators and trading state are
//! stored in parallel vectors indexed like `bars()`, never written back here.

use crate::domain::error::BacktesterError;
use crate::domain::ohlcv::PriceBar;

#[derive(Debug, Clone, PartialEq)]
pub struct PriceSeries {
    symbol: String,
    bars: Vec<PriceBar>,
}

impl PriceSeries {
    /// Build a series from bars that are already sorted ascending by date.
    pub fn new(symbol: impl Into<String>, bars: Vec<PriceBar>) -> Result<Self, BacktesterError> {
        if bars.is_empty() {
            return Err(BacktesterError::InvalidSeries {
                reason: "series must contain at least one bar".into(),
            });
        }

        for (i, bar) in bars.iter().enumerate() {
            if !bar.close.is_finite() || bar.close <= 0.0 {
                return Err(BacktesterError::InvalidSeries {
                    reason: format!(
                        "bar {} ({}) has a non-positive or non-numeric close",
                        i, bar.date
                    ),
                });
            }
            if i > 0 && bars[i - 1].date >= bar.date {
                return Err(BacktesterError::InvalidSeries {
                    reason: format!(
                        "dates must be strictly ascending: {} follows {}",
                        bar.date,
                        bars[i - 1].date
                    ),
                });
            }
        }

        Ok(PriceSeries {
            symbol: symbol.into(),
            bars,
        })
    }

    /// Sort by date, then validate. Duplicate dates are still rejected.
    pub fn from_unsorted(
        symbol: impl Into<String>,
        mut bars: Vec<PriceBar>,
    ) -> Result<Self, BacktesterError> {
        bars.sort_by_key(|b| b.date);
        Self::new(symbol, bars)
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn bars(&self) -> &[PriceBar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    /// Always false for a constructed series; present for API symmetry.
    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.close).collect()
    }

    pub fn last(&self) -> &PriceBar {
        &self.bars[self.bars.len() - 1]
    }

    /// Copy of the first `len` bars. Used to check that a decision at bar i
    /// does not change when later bars are removed.
    pub fn truncated(&self, len: usize) -> Result<Self, BacktesterError> {
        let end = len.min(self.bars.len());
        Self::new(self.symbol.clone(), self.bars[..end].to_vec())
    }
}
