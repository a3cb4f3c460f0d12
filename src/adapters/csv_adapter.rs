//! CSV file price adapter.
//!
//! One file per symbol, `<base_path>/<SYMBOL>.csv`, with a header row.
//! `date` and `close` columns are required; `open`, `high`, `low` and
//! `volume` are read when present. Columns are located by header name.

use crate::domain::error::BacktesterError;
use crate::domain::ohlcv::PriceBar;
use crate::ports::data_port::DataPort;
use chrono::NaiveDate;
use std::fs;
use std::path::PathBuf;

pub struct CsvAdapter {
    base_path: PathBuf,
}

/// Header positions for one file.
struct Columns {
    date: usize,
    open: Option<usize>,
    high: Option<usize>,
    low: Option<usize>,
    close: usize,
    volume: Option<usize>,
}

impl Columns {
    fn from_headers(headers: &csv::StringRecord) -> Result<Self, BacktesterError> {
        let find = |name: &str| {
            headers
                .iter()
                .position(|h| h.trim().eq_ignore_ascii_case(name))
        };
        let required = |name: &str| {
            find(name).ok_or_else(|| BacktesterError::InvalidSeries {
                reason: format!("no {} column found", name),
            })
        };

        Ok(Columns {
            date: required("date")?,
            open: find("open"),
            high: find("high"),
            low: find("low"),
            close: required("close")?,
            volume: find("volume"),
        })
    }
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn csv_path(&self, symbol: &str) -> PathBuf {
        self.base_path.join(format!("{}.csv", symbol))
    }

    fn parse_optional(
        record: &csv::StringRecord,
        column: Option<usize>,
        name: &str,
    ) -> Result<Option<f64>, BacktesterError> {
        match column.and_then(|c| record.get(c)).map(str::trim) {
            None | Some("") => Ok(None),
            Some(raw) => raw.parse().map(Some).map_err(|e| BacktesterError::DataFormat {
                reason: format!("invalid {} value {:?}: {}", name, raw, e),
            }),
        }
    }

    fn parse_bars(content: &str) -> Result<Vec<PriceBar>, BacktesterError> {
        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        let headers = rdr.headers().map_err(|e| BacktesterError::DataFormat {
            reason: format!("CSV header error: {}", e),
        })?;
        let columns = Columns::from_headers(headers)?;
        let mut bars = Vec::new();

        for result in rdr.records() {
            let record = result.map_err(|e| BacktesterError::DataFormat {
                reason: format!("CSV parse error: {}", e),
            })?;

            let date_str = record.get(columns.date).unwrap_or_default().trim();
            let date = NaiveDate::parse_from_str(date_str, "%Y-%m-%d").map_err(|e| {
                BacktesterError::DataFormat {
                    reason: format!("invalid date {:?}: {}", date_str, e),
                }
            })?;

            let close = Self::parse_optional(&record, Some(columns.close), "close")?.ok_or_else(
                || BacktesterError::InvalidSeries {
                    reason: format!("missing close value on {}", date),
                },
            )?;

            bars.push(PriceBar {
                date,
                open: Self::parse_optional(&record, columns.open, "open")?,
                high: Self::parse_optional(&record, columns.high, "high")?,
                low: Self::parse_optional(&record, columns.low, "low")?,
                close,
                volume: Self::parse_optional(&record, columns.volume, "volume")?,
            });
        }

        bars.sort_by_key(|b| b.date);
        Ok(bars)
    }
}

impl DataPort for CsvAdapter {
    fn fetch_prices(&self, symbol: &str) -> Result<Vec<PriceBar>, BacktesterError> {
        let path = self.csv_path(symbol);
        if !path.is_file() {
            return Err(BacktesterError::InvalidSymbol {
                symbol: symbol.to_string(),
            });
        }

        let content = fs::read_to_string(&path).map_err(|e| BacktesterError::ProviderRequest {
            reason: format!("failed to read {}: {}", path.display(), e),
        })?;
        let bars = Self::parse_bars(&content)?;
        if bars.is_empty() {
            return Err(BacktesterError::NoData {
                symbol: symbol.to_string(),
            });
        }
        Ok(bars)
    }

    fn list_symbols(&self) -> Result<Vec<String>, BacktesterError> {
        let entries = fs::read_dir(&self.base_path).map_err(|e| BacktesterError::ProviderRequest {
            reason: format!(
                "failed to read directory {}: {}",
                self.base_path.display(),
                e
            ),
        })?;

        let mut symbols = Vec::new();
        for entry in entries {
            let path = entry
                .map_err(|e| BacktesterError::ProviderRequest {
                    reason: format!(
                        "failed to read directory {}: {}",
                        self.base_path.display(),
                        e
                    ),
                })?
                .path();
            if path.extension().is_some_and(|ext| ext == "csv") {
                if let Some(stem) = path.file_stem() {
                    symbols.push(stem.to_string_lossy().into_owned());
                }
            }
        }

        symbols.sort();
        Ok(symbols)
    }
}
