//! Name-to-constructor lookup for signal strategies.

use std::collections::BTreeMap;

use crate::domain::error::BacktesterError;
use crate::domain::signal::SignalStrategy;
use crate::domain::strategy::sma_crossover::{self, SmaCrossover};
use crate::domain::strategy::triple_sma::{self, TripleSma};

/// Construction parameters shared by all registered strategies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StrategyParams {
    pub windows: Vec<usize>,
}

pub type StrategyConstructor =
    fn(&StrategyParams) -> Result<Box<dyn SignalStrategy>, BacktesterError>;

fn build_triple_sma(params: &StrategyParams) -> Result<Box<dyn SignalStrategy>, BacktesterError> {
    Ok(Box::new(TripleSma::from_windows(&params.windows)?))
}

fn build_sma_crossover(
    params: &StrategyParams,
) -> Result<Box<dyn SignalStrategy>, BacktesterError> {
    Ok(Box::new(SmaCrossover::from_windows(&params.windows)?))
}

#[derive(Debug, Clone, Copy)]
pub struct StrategyEntry {
    pub constructor: StrategyConstructor,
    pub default_windows: &'static [usize],
    pub description: &'static str,
}

#[derive(Debug, Clone, Default)]
pub struct StrategyRegistry {
    entries: BTreeMap<String, StrategyEntry>,
}

impl StrategyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding `triple_sma` and `sma_crossover`.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(
            triple_sma::NAME,
            StrategyEntry {
                constructor: build_triple_sma,
                default_windows: &TripleSma::DEFAULT_WINDOWS,
                description: "fast/medium/slow SMA crossover with price confirmation",
            },
        );
        registry.register(
            sma_crossover::NAME,
            StrategyEntry {
                constructor: build_sma_crossover,
                default_windows: &SmaCrossover::DEFAULT_WINDOWS,
                description: "short/long SMA crossover signal",
            },
        );
        registry
    }

    /// Add or replace an entry.
    pub fn register(&mut self, name: &str, entry: StrategyEntry) {
        self.entries.insert(name.to_string(), entry);
    }

    pub fn get(&self, name: &str) -> Option<&StrategyEntry> {
        self.entries.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn names(&self) -> Vec<&str> {
        self.entries.keys().map(String::as_str).collect()
    }

    pub fn create(
        &self,
        name: &str,
        params: &StrategyParams,
    ) -> Result<Box<dyn SignalStrategy>, BacktesterError> {
        let entry = self
            .entries
            .get(name)
            .ok_or_else(|| BacktesterError::UnknownStrategy {
                name: name.to_string(),
            })?;
        (entry.constructor)(params)
    }

    /// Create with the entry's default windows.
    pub fn create_default(&self, name: &str) -> Result<Box<dyn SignalStrategy>, BacktesterError> {
        let entry = self
            .entries
            .get(name)
            .ok_or_else(|| BacktesterError::UnknownStrategy {
                name: name.to_string(),
            })?;
        (entry.constructor)(&StrategyParams {
            windows: entry.default_windows.to_vec(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::indicator::IndicatorType;
    use crate::domain::signal::{Decision, DecisionContext};

    #[test]
    fn defaults_are_registered() {
        let registry = StrategyRegistry::with_defaults();
        assert_eq!(registry.names(), vec!["sma_crossover", "triple_sma"]);
        assert!(registry.contains("triple_sma"));
        assert!(!registry.contains("rsi"));
    }

    #[test]
    fn create_by_name() {
        let registry = StrategyRegistry::with_defaults();
        let strategy = registry
            .create(
                "triple_sma",
                &StrategyParams {
                    windows: vec![5, 10, 20],
                },
            )
            .unwrap();
        assert_eq!(strategy.name(), "triple_sma");
        assert_eq!(
            strategy.required_indicators(),
            vec![
                IndicatorType::Sma(5),
                IndicatorType::Sma(10),
                IndicatorType::Sma(20)
            ]
        );
    }

    #[test]
    fn unknown_name_is_configuration_error() {
        let registry = StrategyRegistry::with_defaults();
        let err = registry
            .create("macd", &StrategyParams { windows: vec![] })
            .err()
            .unwrap();
        assert!(matches!(err, BacktesterError::UnknownStrategy { ref name } if name == "macd"));
        assert_eq!(err.to_string(), "strategy macd is not supported");
        assert!(err.is_configuration_error());
    }

    #[test]
    fn bad_params_propagate() {
        let registry = StrategyRegistry::with_defaults();
        let result = registry.create(
            "sma_crossover",
            &StrategyParams {
                windows: vec![10, 5],
            },
        );
        assert!(matches!(result, Err(BacktesterError::ConfigInvalid { .. })));
    }

    #[test]
    fn create_default_uses_entry_windows() {
        let registry = StrategyRegistry::with_defaults();
        let strategy = registry.create_default("sma_crossover").unwrap();
        assert_eq!(
            strategy.required_indicators(),
            vec![IndicatorType::SmaPartial(40), IndicatorType::SmaPartial(100)]
        );
        assert!(registry.create_default("nope").is_err());
    }

    struct AlwaysHold;

    impl SignalStrategy for AlwaysHold {
        fn name(&self) -> &str {
            "hold"
        }
        fn required_indicators(&self) -> Vec<IndicatorType> {
            vec![]
        }
        fn decide(&self, _ctx: &DecisionContext<'_>) -> Decision {
            Decision::Hold
        }
    }

    fn build_hold(_: &StrategyParams) -> Result<Box<dyn SignalStrategy>, BacktesterError> {
        Ok(Box::new(AlwaysHold))
    }

    #[test]
    fn custom_registration() {
        let mut registry = StrategyRegistry::new();
        registry.register(
            "hold",
            StrategyEntry {
                constructor: build_hold,
                default_windows: &[],
                description: "never trades",
            },
        );
        let strategy = registry.create_default("hold").unwrap();
        assert_eq!(strategy.name(), "hold");
    }
}
