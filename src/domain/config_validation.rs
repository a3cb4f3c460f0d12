//! Configuration validation.
//!
//! Every check runs before the backtest starts, so a bad config never
//! reaches the simulation loop.

use crate::domain::error::BacktesterError;
use crate::domain::strategy::registry::{StrategyParams, StrategyRegistry};
use crate::ports::config_port::ConfigPort;

pub const DEFAULT_STRATEGY: &str = "triple_sma";

pub fn validate_backtest_config(
    config: &dyn ConfigPort,
    registry: &StrategyRegistry,
) -> Result<(), BacktesterError> {
    validate_initial_capital(config)?;
    validate_starting_shares(config)?;
    validate_in_position(config)?;
    validate_starting_position(config)?;
    validate_strategy(config, registry)?;
    Ok(())
}

pub fn validate_data_config(config: &dyn ConfigPort) -> Result<(), BacktesterError> {
    match data_source(config).as_str() {
        "csv" => {
            require(config, "data", "csv_dir")?;
        }
        "fmp" => {
            if !cfg!(feature = "fmp") {
                return Err(BacktesterError::invalid(
                    "data",
                    "source",
                    "fmp support is not enabled in this build",
                ));
            }
            for key in ["api_key", "symbols_url", "prices_url"] {
                require(config, "fmp", key)?;
            }
        }
        other => {
            return Err(BacktesterError::invalid(
                "data",
                "source",
                format!("unknown data source {:?}, expected csv or fmp", other),
            ));
        }
    }
    Ok(())
}

/// `[data] source`, lowercased. Defaults to `csv`.
pub fn data_source(config: &dyn ConfigPort) -> String {
    config
        .get_string("data", "source")
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "csv".to_string())
}

/// `[backtest] strategy`. Defaults to `triple_sma`.
pub fn strategy_name(config: &dyn ConfigPort) -> String {
    config
        .get_string("backtest", "strategy")
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| DEFAULT_STRATEGY.to_string())
}

/// Parse a comma-separated list of positive window lengths, e.g. `10, 20, 50`.
pub fn parse_windows(raw: &str) -> Result<Vec<usize>, BacktesterError> {
    let windows = raw
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| match s.parse::<usize>() {
            Ok(0) | Err(_) => Err(BacktesterError::invalid(
                "backtest",
                "sma_windows",
                format!("{:?} is not a positive integer", s),
            )),
            Ok(w) => Ok(w),
        })
        .collect::<Result<Vec<_>, _>>()?;

    if windows.is_empty() {
        return Err(BacktesterError::invalid(
            "backtest",
            "sma_windows",
            "at least one window is required",
        ));
    }
    Ok(windows)
}

/// Windows for `strategy`: `[backtest] sma_windows` when set, otherwise the
/// registered defaults.
pub fn strategy_params(
    config: &dyn ConfigPort,
    registry: &StrategyRegistry,
    strategy: &str,
) -> Result<StrategyParams, BacktesterError> {
    let entry = registry
        .get(strategy)
        .ok_or_else(|| BacktesterError::UnknownStrategy {
            name: strategy.to_string(),
        })?;

    let windows = match config.get_string("backtest", "sma_windows") {
        Some(raw) if !raw.trim().is_empty() => parse_windows(&raw)?,
        _ => entry.default_windows.to_vec(),
    };
    Ok(StrategyParams { windows })
}

fn require(config: &dyn ConfigPort, section: &str, key: &str) -> Result<String, BacktesterError> {
    config
        .get_string(section, key)
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| BacktesterError::missing(section, key))
}

fn validate_initial_capital(config: &dyn ConfigPort) -> Result<(), BacktesterError> {
    let Some(raw) = config.get_string("backtest", "initial_capital") else {
        return Ok(());
    };
    match raw.trim().parse::<f64>() {
        Ok(v) if v.is_finite() && v > 0.0 => Ok(()),
        _ => Err(BacktesterError::invalid(
            "backtest",
            "initial_capital",
            "initial_capital must be a positive number",
        )),
    }
}

fn validate_starting_shares(config: &dyn ConfigPort) -> Result<(), BacktesterError> {
    let Some(raw) = config.get_string("backtest", "starting_shares") else {
        return Ok(());
    };
    raw.trim().parse::<u64>().map(|_| ()).map_err(|_| {
        BacktesterError::invalid(
            "backtest",
            "starting_shares",
            "starting_shares must be a non-negative integer",
        )
    })
}

fn validate_starting_position(config: &dyn ConfigPort) -> Result<(), BacktesterError> {
    let in_position = config.get_bool("backtest", "in_position", false);
    if !in_position && config.get_int("backtest", "starting_shares", 0) > 0 {
        return Err(BacktesterError::invalid(
            "backtest",
            "starting_shares",
            "starting_shares requires in_position = true",
        ));
    }
    Ok(())
}

fn validate_in_position(config: &dyn ConfigPort) -> Result<(), BacktesterError> {
    let Some(raw) = config.get_string("backtest", "in_position") else {
        return Ok(());
    };
    match raw.trim().to_lowercase().as_str() {
        "true" | "yes" | "1" | "false" | "no" | "0" => Ok(()),
        _ => Err(BacktesterError::invalid(
            "backtest",
            "in_position",
            "in_position must be true or false",
        )),
    }
}

/// Known name, and windows the strategy accepts.
fn validate_strategy(
    config: &dyn ConfigPort,
    registry: &StrategyRegistry,
) -> Result<(), BacktesterError> {
    let name = strategy_name(config);
    let params = strategy_params(config, registry, &name)?;
    registry.create(&name, &params)?;
    Ok(())
}
