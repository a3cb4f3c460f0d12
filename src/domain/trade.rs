//! Executed trade records.

use chrono::NaiveDate;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TradeKind {
    Buy,
    Sell,
    /// Forced sale at the final bar.
    Liquidation,
}

impl fmt::Display for TradeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TradeKind::Buy => write!(f, "buy"),
            TradeKind::Sell => write!(f, "sell"),
            TradeKind::Liquidation => write!(f, "liquidation"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Trade {
    pub kind: TradeKind,
    pub index: usize,
    pub date: NaiveDate,
    pub shares: u64,
    pub price: f64,
    pub balance_after: f64,
}

impl Trade {
    /// Cash moved by the trade: negative for buys, positive for sales.
    pub fn cash_flow(&self) -> f64 {
        let gross = self.shares as f64 * self.price;
        match self.kind {
            TradeKind::Buy => -gross,
            TradeKind::Sell | TradeKind::Liquidation => gross,
        }
    }
}
