//! Two moving average crossover.
//!
//! Both averages use partial windows (defined from bar 0). The raw signal is 1
//! when short > long, evaluated only from bar `short_window` onward; earlier
//! bars stay at 0. The decision is the first difference of the raw signal:
//! 0 -> 1 buys, 1 -> 0 sells, no change holds. Position state is ignored.

use crate::domain::error::BacktesterError;
use crate::domain::indicator::IndicatorType;
use crate::domain::indicator_helpers::compute_indicators;
use crate::domain::price_series::PriceSeries;
use crate::domain::signal::{Decision, DecisionContext, SignalStrategy};

pub const NAME: &str = "sma_crossover";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SmaCrossover {
    short_window: usize,
    long_window: usize,
}

impl SmaCrossover {
    pub const DEFAULT_WINDOWS: [usize; 2] = [40, 100];

    pub fn new(short_window: usize, long_window: usize) -> Result<Self, BacktesterError> {
        if short_window == 0 || long_window == 0 {
            return Err(BacktesterError::invalid(
                "backtest",
                "sma_windows",
                "windows must be positive integers",
            ));
        }
        if short_window >= long_window {
            return Err(BacktesterError::invalid(
                "backtest",
                "sma_windows",
                "short window must be less than long window",
            ));
        }
        Ok(SmaCrossover {
            short_window,
            long_window,
        })
    }

    pub fn from_windows(windows: &[usize]) -> Result<Self, BacktesterError> {
        match windows {
            [short, long] => Self::new(*short, *long),
            _ => Err(BacktesterError::invalid(
                "backtest",
                "sma_windows",
                format!("{} expects 2 windows, got {}", NAME, windows.len()),
            )),
        }
    }

    pub fn windows(&self) -> [usize; 2] {
        [self.short_window, self.long_window]
    }

    fn raw_signal(&self, ctx: &DecisionContext<'_>, index: usize) -> i8 {
        if index < self.short_window {
            return 0;
        }
        let short = ctx.indicator(&IndicatorType::SmaPartial(self.short_window), index);
        let long = ctx.indicator(&IndicatorType::SmaPartial(self.long_window), index);
        match (short, long) {
            (Some(s), Some(l)) if s > l => 1,
            _ => 0,
        }
    }

    /// The full signal column (+1 / -1 / 0 per bar) for a series.
    pub fn generate_signals(&self, series: &PriceSeries) -> Vec<i8> {
        let indicators = compute_indicators(series.bars(), &self.required_indicators());
        (0..series.len())
            .map(|i| {
                self.decide(&DecisionContext::new(series, &indicators, i, false))
                    .as_signal()
            })
            .collect()
    }
}

impl SignalStrategy for SmaCrossover {
    fn name(&self) -> &str {
        NAME
    }

    fn required_indicators(&self) -> Vec<IndicatorType> {
        vec![
            IndicatorType::SmaPartial(self.short_window),
            IndicatorType::SmaPartial(self.long_window),
        ]
    }

    fn decide(&self, ctx: &DecisionContext<'_>) -> Decision {
        let i = ctx.index();
        if i == 0 {
            return Decision::Hold;
        }
        match self.raw_signal(ctx, i) - self.raw_signal(ctx, i - 1) {
            1 => Decision::Buy,
            -1 => Decision::Sell,
            _ => Decision::Hold,
        }
    }
}
