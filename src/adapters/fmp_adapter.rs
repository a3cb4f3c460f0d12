//! Financial Modeling Prep price adapter.
//!
//! Validates the symbol against the provider's cryptocurrency catalog, then
//! fetches the daily history. The catalog is requested at most once per
//! adapter. Credentials come from an explicit [`FmpConfig`]; nothing is read
//! from the environment. There is no retry logic.

use std::sync::OnceLock;
use std::time::Duration;

use chrono::NaiveDate;
use serde::Deserialize;
use tracing::info;

use crate::domain::error::BacktesterError;
use crate::domain::ohlcv::PriceBar;
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FmpConfig {
    pub api_key: String,
    /// Catalog URL prefix; `apikey=<key>` is appended directly.
    pub symbols_url: String,
    /// History URL prefix; `<SYMBOL>?apikey=<key>` is appended directly.
    pub prices_url: String,
}

impl FmpConfig {
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, BacktesterError> {
        let get = |key: &str| {
            config
                .get_string("fmp", key)
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| BacktesterError::missing("fmp", key))
        };
        Ok(FmpConfig {
            api_key: get("api_key")?,
            symbols_url: get("symbols_url")?,
            prices_url: get("prices_url")?,
        })
    }
}

#[derive(Debug, Deserialize)]
struct HistoricalResponse {
    historical: Vec<HistoricalBar>,
}

#[derive(Debug, Deserialize)]
struct HistoricalBar {
    date: String,
    open: Option<f64>,
    high: Option<f64>,
    low: Option<f64>,
    close: Option<f64>,
    volume: Option<f64>,
}

pub struct FmpAdapter {
    config: FmpConfig,
    client: reqwest::blocking::Client,
    symbols: OnceLock<Vec<String>>,
}

impl FmpAdapter {
    pub fn new(config: FmpConfig) -> Result<Self, BacktesterError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| BacktesterError::ProviderRequest {
                reason: format!("failed to build HTTP client: {}", e),
            })?;

        Ok(Self {
            config,
            client,
            symbols: OnceLock::new(),
        })
    }

    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, BacktesterError> {
        Self::new(FmpConfig::from_config(config)?)
    }

    fn symbols_url(&self) -> String {
        format!("{}apikey={}", self.config.symbols_url, self.config.api_key)
    }

    fn prices_url(&self, symbol: &str) -> String {
        format!(
            "{}{}?apikey={}",
            self.config.prices_url, symbol, self.config.api_key
        )
    }

    fn get_body(&self, url: &str, resource: &str) -> Result<String, BacktesterError> {
        let response = self
            .client
            .get(url)
            .send()
            .map_err(|e| BacktesterError::ProviderRequest {
                reason: format!("an error occurred while fetching {}: {}", resource, e),
            })?;

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            return Err(BacktesterError::ProviderStatus {
                resource: resource.to_string(),
                status: status.as_u16(),
            });
        }

        response.text().map_err(|e| BacktesterError::ProviderRequest {
            reason: format!("failed to read {} response: {}", resource, e),
        })
    }

    /// Symbols from a catalog payload. Entries without a `symbol` are skipped.
    pub(crate) fn parse_symbols(body: &str) -> Result<Vec<String>, BacktesterError> {
        let entries: Vec<serde_json::Value> =
            serde_json::from_str(body).map_err(|e| BacktesterError::DataFormat {
                reason: format!("invalid cryptocurrency list: {}", e),
            })?;

        Ok(entries
            .iter()
            .filter_map(|entry| entry.get("symbol").and_then(|s| s.as_str()))
            .map(str::to_string)
            .collect())
    }

    /// Bars from a history payload, sorted ascending by date.
    pub(crate) fn parse_prices(body: &str) -> Result<Vec<PriceBar>, BacktesterError> {
        let response: HistoricalResponse =
            serde_json::from_str(body).map_err(|e| BacktesterError::DataFormat {
                reason: format!("invalid pricing data: {}", e),
            })?;

        let mut bars = response
            .historical
            .into_iter()
            .map(|bar| {
                let date = NaiveDate::parse_from_str(&bar.date, "%Y-%m-%d").map_err(|e| {
                    BacktesterError::DataFormat {
                        reason: format!("invalid date {:?}: {}", bar.date, e),
                    }
                })?;
                let close = bar.close.ok_or_else(|| BacktesterError::InvalidSeries {
                    reason: format!("missing close value on {}", date),
                })?;
                Ok(PriceBar {
                    date,
                    open: bar.open,
                    high: bar.high,
                    low: bar.low,
                    close,
                    volume: bar.volume,
                })
            })
            .collect::<Result<Vec<_>, BacktesterError>>()?;

        bars.sort_by_key(|b| b.date);
        Ok(bars)
    }
}

impl DataPort for FmpAdapter {
    fn fetch_prices(&self, symbol: &str) -> Result<Vec<PriceBar>, BacktesterError> {
        if !self.is_valid_symbol(symbol)? {
            return Err(BacktesterError::InvalidSymbol {
                symbol: symbol.to_string(),
            });
        }

        let body = self.get_body(
            &self.prices_url(symbol),
            &format!("cryptocurrency pricing data for {}", symbol),
        )?;
        info!(symbol, "request for pricing data was successful");

        let bars = Self::parse_prices(&body)?;
        if bars.is_empty() {
            return Err(BacktesterError::NoData {
                symbol: symbol.to_string(),
            });
        }
        Ok(bars)
    }

    fn list_symbols(&self) -> Result<Vec<String>, BacktesterError> {
        if let Some(symbols) = self.symbols.get() {
            return Ok(symbols.clone());
        }

        let body = self.get_body(&self.symbols_url(), "cryptocurrencies")?;
        info!("request for fetching cryptocurrency list was successful");

        let symbols = Self::parse_symbols(&body)?;
        let _ = self.symbols.set(symbols.clone());
        Ok(symbols)
    }
}
