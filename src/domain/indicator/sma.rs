//! Simple moving average of closing prices.
//!
//! SMA(n)[i] = mean(C[i-n+1..=i])
//! Strict variant: first (n-1) bars undefined.
//! Partial variant: defined from bar 0 over min(i+1, n) bars.
//!
//! The window sum is updated incrementally with Neumaier compensation, so
//! long series do not accumulate rounding drift.

use crate::domain::indicator::{IndicatorPoint, IndicatorSeries, IndicatorType};
use crate::domain::ohlcv::PriceBar;

pub fn calculate_sma(bars: &[PriceBar], period: usize) -> IndicatorSeries {
    rolling_mean(bars, period, period, IndicatorType::Sma(period))
}

pub fn calculate_sma_partial(bars: &[PriceBar], period: usize) -> IndicatorSeries {
    rolling_mean(bars, period, 1, IndicatorType::SmaPartial(period))
}

/// Compensated running sum.
#[derive(Debug, Default, Clone, Copy)]
struct RollingSum {
    sum: f64,
    compensation: f64,
}

impl RollingSum {
    fn add(&mut self, x: f64) {
        let t = self.sum + x;
        if self.sum.abs() >= x.abs() {
            self.compensation += (self.sum - t) + x;
        } else {
            self.compensation += (x - t) + self.sum;
        }
        self.sum = t;
    }

    fn value(&self) -> f64 {
        self.sum + self.compensation
    }
}

fn rolling_mean(
    bars: &[PriceBar],
    period: usize,
    min_periods: usize,
    indicator_type: IndicatorType,
) -> IndicatorSeries {
    let mut values = Vec::with_capacity(bars.len());
    let mut sum = RollingSum::default();

    for (i, bar) in bars.iter().enumerate() {
        sum.add(bar.close);
        if period > 0 && i >= period {
            sum.add(-bars[i - period].close);
        }

        let count = (i + 1).min(period);
        let value = if period > 0 && count >= min_periods {
            Some(sum.value() / count as f64)
        } else {
            None
        };

        values.push(IndicatorPoint {
            date: bar.date,
            value,
        });
    }

    IndicatorSeries {
        indicator_type,
        values,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn make_bars(prices: &[f64]) -> Vec<PriceBar> {
        prices
            .iter()
            .enumerate()
            .map(|(i, &close)| {
                PriceBar::from_close(NaiveDate::from_ymd_opt(2024, 1, (i + 1) as u32).unwrap(), close)
            })
            .collect()
    }

    #[test]
    fn sma_warmup_is_undefined() {
        let bars = make_bars(&[10.0, 20.0, 30.0, 40.0, 50.0]);
        let series = calculate_sma(&bars, 3);

        assert_eq!(series.values.len(), 5);
        assert_eq!(series.value_at(0), None);
        assert_eq!(series.value_at(1), None);
        assert!(series.value_at(2).is_some());
        assert_eq!(series.first_defined(), Some(2));
    }

    #[test]
    fn sma_basic_calculation() {
        let bars = make_bars(&[10.0, 20.0, 30.0, 40.0, 50.0]);
        let series = calculate_sma(&bars, 3);

        assert!((series.value_at(2).unwrap() - 20.0).abs() < 1e-10);
        assert!((series.value_at(3).unwrap() - 30.0).abs() < 1e-10);
        assert!((series.value_at(4).unwrap() - 40.0).abs() < 1e-10);
    }

    #[test]
    fn sma_period_one_is_close() {
        let bars = make_bars(&[3.0, 7.0, 11.0]);
        let series = calculate_sma(&bars, 1);
        let values: Vec<f64> = series.values.iter().map(|p| p.value.unwrap()).collect();
        assert_eq!(values, vec![3.0, 7.0, 11.0]);
    }

    #[test]
    fn sma_window_longer_than_series_is_all_undefined() {
        let bars = make_bars(&[1.0, 2.0, 3.0]);
        let series = calculate_sma(&bars, 3);
        assert!(series.value_at(2).is_some());

        let series = calculate_sma(&bars, 4);
        assert_eq!(series.values.len(), 3);
        assert!(series.values.iter().all(|p| p.value.is_none()));
    }

    #[test]
    fn sma_zero_period_is_all_undefined() {
        let bars = make_bars(&[1.0, 2.0]);
        let series = calculate_sma(&bars, 0);
        assert!(series.values.iter().all(|p| p.value.is_none()));
    }

    #[test]
    fn partial_sma_defined_from_first_bar() {
        let bars = make_bars(&[10.0, 20.0, 30.0, 40.0]);
        let series = calculate_sma_partial(&bars, 3);

        assert!((series.value_at(0).unwrap() - 10.0).abs() < 1e-10);
        assert!((series.value_at(1).unwrap() - 15.0).abs() < 1e-10);
        assert!((series.value_at(2).unwrap() - 20.0).abs() < 1e-10);
        assert!((series.value_at(3).unwrap() - 30.0).abs() < 1e-10);
    }

    #[test]
    fn rolling_sum_matches_direct_mean() {
        let prices: Vec<f64> = (0..40).map(|i| 100.0 + ((i * 7) % 13) as f64).collect();
        let bars = make_bars(&prices[..28]);
        let series = calculate_sma(&bars, 5);

        for i in 4..bars.len() {
            let direct: f64 = prices[i - 4..=i].iter().sum::<f64>() / 5.0;
            approx::assert_abs_diff_eq!(series.value_at(i).unwrap(), direct, epsilon = 1e-9);
        }
    }

    #[test]
    fn long_series_does_not_drift() {
        let mut prices: Vec<f64> = (0..50_000)
            .map(|i| 1_000_000.0 + ((i * 37) % 101) as f64 * 0.137)
            .collect();
        prices.extend(std::iter::repeat_n(7.25, 10));
        let bars: Vec<PriceBar> = prices
            .iter()
            .enumerate()
            .map(|(i, &close)| {
                let date = NaiveDate::from_ymd_opt(2000, 1, 1).unwrap() + chrono::Duration::days(i as i64);
                PriceBar::from_close(date, close)
            })
            .collect();

        let series = calculate_sma(&bars, 3);
        let last = bars.len() - 1;
        approx::assert_abs_diff_eq!(series.value_at(last).unwrap(), 7.25, epsilon = 1e-9);

        for i in (2..last).step_by(997) {
            let direct: f64 = prices[i - 2..=i].iter().sum::<f64>() / 3.0;
            approx::assert_relative_eq!(series.value_at(i).unwrap(), direct, max_relative = 1e-12);
        }
    }

    #[test]
    fn indicator_types() {
        let bars = make_bars(&[1.0]);
        assert_eq!(calculate_sma(&bars, 5).indicator_type, IndicatorType::Sma(5));
        assert_eq!(
            calculate_sma_partial(&bars, 5).indicator_type,
            IndicatorType::SmaPartial(5)
        );
    }
}
