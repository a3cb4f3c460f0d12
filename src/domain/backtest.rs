//! Backtest engine and event loop.
//!
//! The engine walks bars 1..n in order. Bar 0 only seeds the initial state.
//! At each bar it asks the strategy for a decision and applies it:
//!
//! - buy while flat: shares = floor(balance / close), balance -= shares * close
//! - sell while long: balance += shares * close, shares = 0
//!
//! Every bar gets a state snapshot whether or not a trade happened. If the
//! account is still long after the last bar it is liquidated at the last close
//! and the last snapshot is overwritten. The loop itself cannot fail.

use tracing::{debug, info};

use crate::domain::error::BacktesterError;
use crate::domain::indicator::IndicatorSeries;
use crate::domain::indicator::returns::calculate_returns;
use crate::domain::indicator_helpers::{IndicatorSet, compute_indicators};
use crate::domain::price_series::PriceSeries;
use crate::domain::signal::{Decision, DecisionContext, SignalStrategy};
use crate::domain::trade::{Trade, TradeKind};

#[derive(Debug, Clone, PartialEq)]
pub struct BacktestConfig {
    pub initial_capital: f64,
    pub in_position: bool,
    pub starting_shares: u64,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        BacktestConfig {
            initial_capital: 100_000.0,
            in_position: false,
            starting_shares: 0,
        }
    }
}

impl BacktestConfig {
    pub fn validate(&self) -> Result<(), BacktesterError> {
        if !self.initial_capital.is_finite() || self.initial_capital <= 0.0 {
            return Err(BacktesterError::invalid(
                "backtest",
                "initial_capital",
                "initial_capital must be a positive number",
            ));
        }
        if !self.in_position && self.starting_shares > 0 {
            return Err(BacktesterError::invalid(
                "backtest",
                "starting_shares",
                "starting_shares requires in_position = true",
            ));
        }
        Ok(())
    }
}

/// Account state recorded at one bar.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TradingState {
    pub in_position: bool,
    pub shares: u64,
    pub balance: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BacktestResult {
    pub strategy: String,
    pub series: PriceSeries,
    pub indicators: IndicatorSet,
    pub returns: IndicatorSeries,
    /// One entry per bar, indexed like `series.bars()`.
    pub states: Vec<TradingState>,
    pub trades: Vec<Trade>,
    pub final_balance: f64,
}

impl BacktestResult {
    pub fn final_state(&self) -> TradingState {
        self.states[self.states.len() - 1]
    }

    pub fn trades_of(&self, kind: TradeKind) -> impl Iterator<Item = &Trade> {
        self.trades.iter().filter(move |t| t.kind == kind)
    }
}

pub struct BacktestEngine {
    series: PriceSeries,
    strategy: Box<dyn SignalStrategy>,
    config: BacktestConfig,
}

impl BacktestEngine {
    /// All precondition checks happen here; `run` never fails.
    pub fn new(
        series: PriceSeries,
        strategy: Box<dyn SignalStrategy>,
        config: BacktestConfig,
    ) -> Result<Self, BacktesterError> {
        config.validate()?;
        Ok(BacktestEngine {
            series,
            strategy,
            config,
        })
    }

    pub fn series(&self) -> &PriceSeries {
        &self.series
    }

    pub fn config(&self) -> &BacktestConfig {
        &self.config
    }

    pub fn strategy_name(&self) -> &str {
        self.strategy.name()
    }

    /// Run the simulation. Takes `&self`: repeated runs are identical.
    pub fn run(&self) -> BacktestResult {
        let series = &self.series;
        let bars = series.bars();
        let indicators = compute_indicators(bars, &self.strategy.required_indicators());
        let returns = calculate_returns(bars);

        let mut account = Account::new(&self.config);
        let mut states = Vec::with_capacity(bars.len());
        let mut trades = Vec::new();
        states.push(account.snapshot());

        for i in 1..bars.len() {
            let ctx = DecisionContext::new(series, &indicators, i, account.in_position);
            let decision = self.strategy.decide(&ctx);
            let bar = &bars[i];

            match decision {
                Decision::Buy if !account.in_position => {
                    let shares = account.buy(bar.close);
                    info!(
                        symbol = series.symbol(),
                        date = %bar.date,
                        shares,
                        price = bar.close,
                        balance = account.balance,
                        "buy"
                    );
                    trades.push(account.trade(TradeKind::Buy, i, bar.date, shares, bar.close));
                }
                Decision::Sell if account.in_position => {
                    let shares = account.sell(bar.close);
                    info!(
                        symbol = series.symbol(),
                        date = %bar.date,
                        shares,
                        price = bar.close,
                        previous_close = bars[i - 1].close,
                        balance = account.balance,
                        "sell"
                    );
                    trades.push(account.trade(TradeKind::Sell, i, bar.date, shares, bar.close));
                }
                Decision::Hold => {}
                ignored => debug!(index = i, decision = %ignored, "decision does not apply to current position"),
            }

            states.push(account.snapshot());
        }

        if account.in_position {
            let last_index = bars.len() - 1;
            let last = series.last();
            let shares = account.sell(last.close);
            info!(
                symbol = series.symbol(),
                date = %last.date,
                shares,
                price = last.close,
                balance = account.balance,
                "forced liquidation at end of series"
            );
            trades.push(account.trade(
                TradeKind::Liquidation,
                last_index,
                last.date,
                shares,
                last.close,
            ));
            states[last_index] = account.snapshot();
        }

        info!(
            symbol = series.symbol(),
            strategy = self.strategy.name(),
            final_balance = account.balance,
            "backtest complete"
        );

        BacktestResult {
            strategy: self.strategy.name().to_string(),
            series: series.clone(),
            indicators,
            returns,
            states,
            trades,
            final_balance: account.balance,
        }
    }
}

/// Mutable simulation state, owned by one run.
#[derive(Debug, Clone, Copy)]
struct Account {
    in_position: bool,
    shares: u64,
    balance: f64,
}

impl Account {
    fn new(config: &BacktestConfig) -> Self {
        Account {
            in_position: config.in_position,
            shares: config.starting_shares,
            balance: config.initial_capital,
        }
    }

    fn snapshot(&self) -> TradingState {
        TradingState {
            in_position: self.in_position,
            shares: self.shares,
            balance: self.balance,
        }
    }

    /// Buy as many whole shares as the balance covers. The position opens
    /// even when that number is zero.
    fn buy(&mut self, price: f64) -> u64 {
        let mut shares = (self.balance / price).floor() as u64;
        while shares > 0 && shares as f64 * price > self.balance {
            shares -= 1;
        }
        self.balance -= shares as f64 * price;
        self.shares = shares;
        self.in_position = true;
        shares
    }

    /// Sell every held share. Returns the number sold.
    fn sell(&mut self, price: f64) -> u64 {
        let sold = self.shares;
        self.balance += sold as f64 * price;
        self.shares = 0;
        self.in_position = false;
        sold
    }

    fn trade(
        &self,
        kind: TradeKind,
        index: usize,
        date: chrono::NaiveDate,
        shares: u64,
        price: f64,
    ) -> Trade {
        Trade {
            kind,
            index,
            date,
            shares,
            price,
            balance_after: self.balance,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::indicator::IndicatorType;
    use crate::domain::ohlcv::PriceBar;
    use chrono::{Duration, NaiveDate};

    /// Emits a fixed decision per bar.
    struct Scripted(Vec<Decision>);

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

    fn make_series(prices: &[f64]) -> PriceSeries {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let bars = prices
            .iter()
            .enumerate()
            .map(|(i, &close)| PriceBar::from_close(start + Duration::days(i as i64), close))
            .collect();
        PriceSeries::new("TEST", bars).unwrap()
    }

    fn config(capital: f64) -> BacktestConfig {
        BacktestConfig {
            initial_capital: capital,
            ..BacktestConfig::default()
        }
    }

    fn run(prices: &[f64], script: Vec<Decision>, config: BacktestConfig) -> BacktestResult {
        BacktestEngine::new(make_series(prices), Box::new(Scripted(script)), config)
            .unwrap()
            .run()
    }

    use Decision::{Buy, Hold, Sell};

    #[test]
    fn config_defaults() {
        let c = BacktestConfig::default();
        assert!((c.initial_capital - 100_000.0).abs() < f64::EPSILON);
        assert!(!c.in_position);
        assert_eq!(c.starting_shares, 0);
    }

    #[test]
    fn rejects_non_positive_capital() {
        for capital in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            let result = BacktestEngine::new(
                make_series(&[1.0]),
                Box::new(Scripted(vec![])),
                config(capital),
            );
            assert!(matches!(
                result,
                Err(BacktesterError::ConfigInvalid { ref key, .. }) if key == "initial_capital"
            ));
        }
    }

    #[test]
    fn rejects_starting_shares_while_flat() {
        let config = BacktestConfig {
            initial_capital: 100.0,
            in_position: false,
            starting_shares: 10,
        };
        let result = BacktestEngine::new(
            make_series(&[10.0, 10.0, 10.0]),
            Box::new(Scripted(vec![Hold, Buy])),
            config,
        );
        assert!(matches!(
            result,
            Err(BacktesterError::ConfigInvalid { ref key, .. }) if key == "starting_shares"
        ));
    }

    #[test]
    fn starting_shares_while_long_are_sold() {
        let config = BacktestConfig {
            initial_capital: 100.0,
            in_position: true,
            starting_shares: 10,
        };
        let result = run(&[10.0, 10.0, 10.0], vec![Hold, Buy], config);
        assert!(result.trades_of(TradeKind::Buy).next().is_none());
        assert!((result.final_balance - 200.0).abs() < 1e-9);
    }

    #[test]
    fn bar_zero_seeds_state_and_is_never_traded() {
        let result = run(&[10.0, 10.0], vec![Buy, Hold], config(100.0));
        assert!(result.trades.is_empty());
        assert_eq!(
            result.states[0],
            TradingState {
                in_position: false,
                shares: 0,
                balance: 100.0
            }
        );
    }

    #[test]
    fn buy_then_sell() {
        let result = run(
            &[10.0, 10.0, 12.0, 15.0],
            vec![Hold, Buy, Hold, Sell],
            config(105.0),
        );

        assert_eq!(result.states.len(), 4);
        assert_eq!(result.states[1].shares, 10);
        assert!((result.states[1].balance - 5.0).abs() < 1e-9);
        assert!(result.states[1].in_position);
        assert_eq!(result.states[2], result.states[1]);
        assert_eq!(result.states[3].shares, 0);
        assert!(!result.states[3].in_position);
        assert!((result.final_balance - 155.0).abs() < 1e-9);

        assert_eq!(result.trades.len(), 2);
        assert_eq!(result.trades[0].kind, TradeKind::Buy);
        assert_eq!(result.trades[1].kind, TradeKind::Sell);
        assert!((result.trades[1].price - 15.0).abs() < f64::EPSILON);
    }

    #[test]
    fn sell_credits_current_close_not_previous() {
        let result = run(&[10.0, 10.0, 20.0], vec![Hold, Buy, Sell], config(100.0));
        // 10 shares bought at 10, sold at bar 2's close of 20.
        assert!((result.final_balance - 200.0).abs() < 1e-9);
    }

    #[test]
    fn zero_affordable_shares_still_goes_long() {
        let result = run(&[150.0, 150.0, 150.0], vec![Hold, Buy, Hold], config(100.0));
        let s = result.states[1];
        assert!(s.in_position);
        assert_eq!(s.shares, 0);
        assert!((s.balance - 100.0).abs() < f64::EPSILON);
        assert_eq!(result.trades[0].shares, 0);
    }

    #[test]
    fn buy_ignored_while_long_and_sell_ignored_while_flat() {
        let result = run(
            &[10.0, 10.0, 5.0, 10.0, 10.0],
            vec![Hold, Sell, Buy, Buy, Hold],
            config(100.0),
        );
        assert_eq!(result.trades_of(TradeKind::Sell).count(), 0);
        assert_eq!(result.trades_of(TradeKind::Buy).count(), 1);
        assert_eq!(result.trades[0].index, 2);
        assert_eq!(result.states[2].shares, 20);
        assert_eq!(result.states[3].shares, 20);
    }

    #[test]
    fn forced_liquidation_overwrites_last_snapshot() {
        let result = run(&[10.0, 10.0, 12.0], vec![Hold, Buy, Hold], config(100.0));

        let before = result.states[1];
        let last = result.final_state();
        assert!(!last.in_position);
        assert_eq!(last.shares, 0);
        assert!((last.balance - (before.balance + 10.0 * 12.0)).abs() < 1e-9);
        assert!((result.final_balance - 120.0).abs() < 1e-9);

        let liquidation = result.trades.last().unwrap();
        assert_eq!(liquidation.kind, TradeKind::Liquidation);
        assert_eq!(liquidation.index, 2);
    }

    #[test]
    fn initial_position_is_liquidated_on_single_bar() {
        let cfg = BacktestConfig {
            initial_capital: 50.0,
            in_position: true,
            starting_shares: 3,
        };
        let result = run(&[20.0], vec![], cfg);
        assert_eq!(result.states.len(), 1);
        assert!(!result.states[0].in_position);
        assert!((result.final_balance - 110.0).abs() < 1e-9);
    }

    #[test]
    fn starting_shares_sold_on_first_sell() {
        let cfg = BacktestConfig {
            initial_capital: 10.0,
            in_position: true,
            starting_shares: 4,
        };
        let result = run(&[5.0, 6.0, 7.0], vec![Hold, Sell, Hold], cfg);
        assert_eq!(result.trades[0].shares, 4);
        assert!((result.final_balance - 34.0).abs() < 1e-9);
    }

    #[test]
    fn buy_conserves_cash() {
        let result = run(&[7.0, 7.0, 7.0], vec![Hold, Buy, Hold], config(1000.0));
        let trade = &result.trades[0];
        assert_eq!(trade.shares, 142);
        let recomposed = trade.shares as f64 * trade.price + trade.balance_after;
        assert!((recomposed - 1000.0).abs() < 1e-9);
        assert!(trade.balance_after >= 0.0);
    }

    #[test]
    fn run_is_repeatable() {
        let engine = BacktestEngine::new(
            make_series(&[10.0, 9.0, 11.0, 8.0]),
            Box::new(Scripted(vec![Hold, Buy, Sell, Buy])),
            config(100.0),
        )
        .unwrap();
        assert_eq!(engine.run(), engine.run());
    }

    #[test]
    fn result_carries_returns_and_strategy_name() {
        let result = run(&[100.0, 110.0], vec![], config(100.0));
        assert_eq!(result.strategy, "scripted");
        assert_eq!(result.returns.value_at(0), None);
        assert!((result.returns.value_at(1).unwrap() - 0.1).abs() < 1e-12);
    }
}
