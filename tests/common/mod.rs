#![allow(dead_code)]

use chrono::NaiveDate;
use cryptobt::domain::backtest::BacktestConfig;
use cryptobt::domain::error::BacktesterError;
use cryptobt::domain::indicator::IndicatorType;
pub use cryptobt::domain::ohlcv::PriceBar;
use cryptobt::domain::price_series::PriceSeries;
use cryptobt::domain::signal::{Decision, DecisionContext, SignalStrategy};
use cryptobt::ports::data_port::DataPort;
use std::cell::Cell;
use std::collections::HashMap;

/// In-memory price source. Symbols listed in `errors` fail with a provider
/// status error.
pub struct MockDataPort {
    pub data: HashMap<String, Vec<PriceBar>>,
    pub errors: HashMap<String, u16>,
    pub fetches: Cell<usize>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            errors: HashMap::new(),
            fetches: Cell::new(0),
        }
    }

    pub fn with_bars(mut self, symbol: &str, bars: Vec<PriceBar>) -> Self {
        self.data.insert(symbol.to_string(), bars);
        self
    }

    pub fn with_status(mut self, symbol: &str, status: u16) -> Self {
        self.errors.insert(symbol.to_string(), status);
        self
    }
}

impl DataPort for MockDataPort {
    fn fetch_prices(&self, symbol: &str) -> Result<Vec<PriceBar>, BacktesterError> {
        self.fetches.set(self.fetches.get() + 1);
        if let Some(&status) = self.errors.get(symbol) {
            return Err(BacktesterError::ProviderStatus {
                resource: "cryptocurrency pricing data".into(),
                status,
            });
        }
        self.data
            .get(symbol)
            .cloned()
            .ok_or_else(|| BacktesterError::InvalidSymbol {
                symbol: symbol.to_string(),
            })
    }

    fn list_symbols(&self) -> Result<Vec<String>, BacktesterError> {
        let mut symbols: Vec<String> = self
            .data
            .keys()
            .chain(self.errors.keys())
            .cloned()
            .collect();
        symbols.sort();
        Ok(symbols)
    }
}

/// Emits a fixed decision per bar, `Hold` past the end of the script.
pub struct Scripted(pub Vec<Decision>);

impl SignalStrategy for Scripted {
    fn name(&self) -> &str {
        "scripted"
    }

    fn required_indicators(&self) -> Vec<IndicatorType> {
        vec![]
    }

    fn decide(&self, ctx: &DecisionContext<'_>) -> Decision {
        self.0.get(ctx.index()).copied().unwrap_or(Decision::Hold)
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn make_bar(date: &str, close: f64) -> PriceBar {
    PriceBar {
        date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
        open: Some(close - 1.0),
        high: Some(close + 1.0),
        low: Some(close - 2.0),
        close,
        volume: Some(1000.0),
    }
}

/// One bar per day from 2023-01-01 with the given closes.
pub fn bars_from_closes(closes: &[f64]) -> Vec<PriceBar> {
    let start = date(2023, 1, 1);
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| PriceBar::from_close(start + chrono::Duration::days(i as i64), close))
        .collect()
}

pub fn series_from_closes(closes: &[f64]) -> PriceSeries {
    PriceSeries::new("BTCUSD", bars_from_closes(closes)).unwrap()
}

/// `count` closes rising by 1.0 per bar from `start_price`.
pub fn ramp(count: usize, start_price: f64) -> Vec<f64> {
    (0..count).map(|i| start_price + i as f64).collect()
}

/// Declining leg followed by a rising leg; turns the medium/slow averages
/// over once the rise is long enough.
pub fn dip_then_rise(fall: usize, rise: usize) -> Vec<f64> {
    let mut closes: Vec<f64> = (0..fall).map(|i| 200.0 - i as f64).collect();
    let bottom = closes.last().copied().unwrap_or(200.0);
    closes.extend((1..=rise).map(|i| bottom + 2.0 * i as f64));
    closes
}

pub fn config(capital: f64) -> BacktestConfig {
    BacktestConfig {
        initial_capital: capital,
        ..BacktestConfig::default()
    }
}
