//! Three moving average crossover.
//!
//! Buy (flat only) when the medium SMA crosses above the slow SMA between the
//! previous and current bar, the fast SMA is above the medium, and the close
//! is above the fast. Sell (long only) on the exact mirror image. Any
//! undefined SMA at either bar means no signal.

use crate::domain::error::BacktesterError;
use crate::domain::indicator::IndicatorType;
use crate::domain::signal::{Decision, DecisionContext, SignalStrategy};

pub const NAME: &str = "triple_sma";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TripleSma {
    fast: usize,
    medium: usize,
    slow: usize,
}

/// SMA values at one bar.
#[derive(Debug, Clone, Copy)]
struct Averages {
    fast: f64,
    medium: f64,
    slow: f64,
}

impl TripleSma {
    pub const DEFAULT_WINDOWS: [usize; 3] = [10, 20, 50];

    pub fn new(fast: usize, medium: usize, slow: usize) -> Result<Self, BacktesterError> {
        for (label, window) in [("fast", fast), ("medium", medium), ("slow", slow)] {
            if window == 0 {
                return Err(BacktesterError::invalid(
                    "backtest",
                    "sma_windows",
                    format!("{} window must be a positive integer", label),
                ));
            }
        }
        if !(fast < medium && medium < slow) {
            return Err(BacktesterError::invalid(
                "backtest",
                "sma_windows",
                "windows must be in strictly ascending order",
            ));
        }
        Ok(TripleSma { fast, medium, slow })
    }

    pub fn from_windows(windows: &[usize]) -> Result<Self, BacktesterError> {
        match windows {
            [fast, medium, slow] => Self::new(*fast, *medium, *slow),
            _ => Err(BacktesterError::invalid(
                "backtest",
                "sma_windows",
                format!("{} expects 3 windows, got {}", NAME, windows.len()),
            )),
        }
    }

    pub fn windows(&self) -> [usize; 3] {
        [self.fast, self.medium, self.slow]
    }

    fn averages(&self, ctx: &DecisionContext<'_>, index: usize) -> Option<Averages> {
        Some(Averages {
            fast: ctx.indicator(&IndicatorType::Sma(self.fast), index)?,
            medium: ctx.indicator(&IndicatorType::Sma(self.medium), index)?,
            slow: ctx.indicator(&IndicatorType::Sma(self.slow), index)?,
        })
    }
}

impl SignalStrategy for TripleSma {
    fn name(&self) -> &str {
        NAME
    }

    fn required_indicators(&self) -> Vec<IndicatorType> {
        vec![
            IndicatorType::Sma(self.fast),
            IndicatorType::Sma(self.medium),
            IndicatorType::Sma(self.slow),
        ]
    }

    fn decide(&self, ctx: &DecisionContext<'_>) -> Decision {
        let i = ctx.index();
        if i == 0 {
            return Decision::Hold;
        }

        let (Some(prev), Some(curr), Some(close)) =
            (self.averages(ctx, i - 1), self.averages(ctx, i), ctx.close(i))
        else {
            return Decision::Hold;
        };

        if !ctx.in_position() {
            let crossed_up = prev.medium < prev.slow && curr.medium > curr.slow;
            if crossed_up && curr.fast > curr.medium && close > curr.fast {
                return Decision::Buy;
            }
        } else {
            let crossed_down = prev.medium > prev.slow && curr.medium < curr.slow;
            if crossed_down && curr.fast < curr.medium && close < curr.fast {
                return Decision::Sell;
            }
        }

        Decision::Hold
    }
}
