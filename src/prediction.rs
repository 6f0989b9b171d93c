//! Trend-based rate prediction.
//!
//! Fits `rate = intercept + slope * t` by ordinary least squares over the
//! whole history of a currency pair, where `t` is the effective date as epoch
//! milliseconds, and evaluates the line at the current instant.

use chrono::{DateTime, Utc};
use rust_decimal::prelude::ToPrimitive;

use crate::error::{RateError, Result};
use crate::exchange_rate::ExchangeRate;

pub const DEFAULT_MIN_WINDOW: usize = 7;

/// Least-squares line through a set of `(x, y)` points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearFit {
    slope: f64,
    x_mean: f64,
    y_mean: f64,
    r_squared: f64,
}

impl LinearFit {
    /// Fails with `DegenerateRegression` when every `x` is the same, since
    /// the slope is then undefined.
    pub fn fit(points: &[(f64, f64)]) -> Result<Self> {
        if points.is_empty() {
            return Err(RateError::NoHistoricalData);
        }

        let n = points.len() as f64;
        let x_mean = points.iter().map(|(x, _)| x).sum::<f64>() / n;
        let y_mean = points.iter().map(|(_, y)| y).sum::<f64>() / n;

        let (sxx, sxy) = points.iter().fold((0.0, 0.0), |(sxx, sxy), (x, y)| {
            let dx = x - x_mean;
            (sxx + dx * dx, sxy + dx * (y - y_mean))
        });

        if sxx <= f64::EPSILON {
            return Err(RateError::DegenerateRegression);
        }

        let slope = sxy / sxx;

        let ss_tot: f64 = points.iter().map(|(_, y)| (y - y_mean).powi(2)).sum();
        let ss_res: f64 = points
            .iter()
            .map(|(x, y)| (y - (y_mean + slope * (x - x_mean))).powi(2))
            .sum();
        let r_squared = if ss_tot > 1e-12 {
            1.0 - ss_res / ss_tot
        } else {
            1.0
        };

        Ok(Self {
            slope,
            x_mean,
            y_mean,
            r_squared,
        })
    }

    pub fn slope(&self) -> f64 {
        self.slope
    }

    pub fn intercept(&self) -> f64 {
        self.y_mean - self.slope * self.x_mean
    }

    pub fn r_squared(&self) -> f64 {
        self.r_squared
    }

    /// Value of the line at `x`. Computed around the means, which equals
    /// `intercept + slope * x` without losing precision at epoch scale.
    pub fn value_at(&self, x: f64) -> f64 {
        self.y_mean + self.slope * (x - self.x_mean)
    }
}

/// Extrapolates the current rate of a pair from its recorded history.
#[derive(Debug, Clone, Copy)]
pub struct Predictor {
    min_window: usize,
}

impl Default for Predictor {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_WINDOW)
    }
}

impl Predictor {
    pub fn new(min_window: usize) -> Self {
        Self { min_window }
    }

    pub fn predict(&self, records: &[ExchangeRate]) -> Result<f64> {
        self.predict_at(records, Utc::now())
    }

    /// All records take part in the fit, however many there are beyond
    /// `min_window`. Records are assumed to belong to a single pair.
    pub fn predict_at(&self, records: &[ExchangeRate], now: DateTime<Utc>) -> Result<f64> {
        if records.is_empty() {
            return Err(RateError::NoHistoricalData);
        }
        if records.len() < self.min_window {
            return Err(RateError::InsufficientHistory {
                required: self.min_window,
                actual: records.len(),
            });
        }

        let points = records
            .iter()
            .map(|r| {
                let y = r.rate.to_f64().ok_or_else(|| {
                    RateError::InvalidRecord(format!("rate {} is not representable", r.rate))
                })?;
                Ok((r.timestamp_millis() as f64, y))
            })
            .collect::<Result<Vec<_>>>()?;

        let fit = LinearFit::fit(&points)?;
        let predicted = fit.value_at(now.timestamp_millis() as f64);
        if !predicted.is_finite() {
            return Err(RateError::DegenerateRegression);
        }

        log::debug!(
            "Fitted {} points: slope {:e}/ms, r² {:.4}",
            points.len(),
            fit.slope(),
            fit.r_squared()
        );
        log::info!("Predicted rate at {}: {}", now, predicted);

        Ok(predicted)
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use chrono::{Days, NaiveDate, NaiveTime};
    use rust_decimal::Decimal;
    use rust_decimal::prelude::FromPrimitive;

    use super::*;

    fn record(id: i64, date: NaiveDate, rate: f64) -> ExchangeRate {
        ExchangeRate {
            id,
            base_currency: "USD".to_string(),
            target_currency: "EUR".to_string(),
            rate: Decimal::from_f64(rate).unwrap(),
            effective_date: date,
        }
    }

    fn noon(date: NaiveDate) -> DateTime<Utc> {
        date.and_time(NaiveTime::from_hms_opt(12, 0, 0).unwrap())
            .and_utc()
    }

    #[test]
    fn fit_recovers_exact_line() {
        let points: Vec<_> = (0..10).map(|i| (i as f64, 3.0 + 0.5 * i as f64)).collect();
        let fit = LinearFit::fit(&points).unwrap();

        assert!((fit.slope() - 0.5).abs() < 1e-12);
        assert!((fit.intercept() - 3.0).abs() < 1e-12);
        assert!((fit.r_squared() - 1.0).abs() < 1e-12);
        assert!((fit.value_at(20.0) - 13.0).abs() < 1e-12);
    }

    #[test]
    fn fit_rejects_zero_variance() {
        let points = vec![(5.0, 1.0), (5.0, 2.0), (5.0, 3.0)];
        assert_matches!(LinearFit::fit(&points), Err(RateError::DegenerateRegression));
    }

    #[test]
    fn empty_history_is_reported_before_window() {
        let predictor = Predictor::default();
        assert_matches!(predictor.predict(&[]), Err(RateError::NoHistoricalData));
    }

    #[test]
    fn short_history_is_insufficient() {
        let start = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
        let records: Vec<_> = (0..6)
            .map(|i| record(i, start + Days::new(i as u64), 1.0))
            .collect();

        assert_matches!(
            Predictor::new(7).predict(&records),
            Err(RateError::InsufficientHistory {
                required: 7,
                actual: 6
            })
        );
    }

    #[test]
    fn same_day_history_is_degenerate() {
        let date = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
        let records: Vec<_> = (0..7).map(|i| record(i, date, 1.0 + i as f64)).collect();

        assert_matches!(
            Predictor::new(7).predict(&records),
            Err(RateError::DegenerateRegression)
        );
    }

    #[test]
    fn linear_history_extrapolates_to_now() {
        let start = NaiveDate::from_ymd_opt(2026, 5, 1).unwrap();
        // rate = 1.5 + 0.01 per day, shuffled to prove order does not matter
        let mut records: Vec<_> = (0..10)
            .map(|i| record(i, start + Days::new(i as u64), 1.5 + 0.01 * i as f64))
            .collect();
        records.reverse();
        records.swap(2, 7);

        let now = noon(start + Days::new(14));
        let predicted = Predictor::new(7).predict_at(&records, now).unwrap();

        assert!((predicted - (1.5 + 0.01 * 14.5)).abs() < 1e-9, "{predicted}");
    }

    #[test]
    fn uses_every_record_not_just_the_window() {
        let start = NaiveDate::from_ymd_opt(2026, 5, 1).unwrap();
        // flat at 1.0 for three weeks, then a week rising sharply
        let mut records: Vec<_> = (0..21)
            .map(|i| record(i, start + Days::new(i as u64), 1.0))
            .collect();
        records.extend((21..28).map(|i| record(i, start + Days::new(i as u64), 1.0 + (i - 20) as f64)));

        let now = noon(start + Days::new(28));
        let predicted = Predictor::new(7).predict_at(&records, now).unwrap();

        // a fit over only the last 7 points would reach 9.5
        assert!(predicted < 9.0, "{predicted}");
        assert!(predicted > 1.0, "{predicted}");
    }

    #[test]
    fn declining_usd_eur_history_extrapolates_within_trend() {
        let today = NaiveDate::from_ymd_opt(2026, 10, 16).unwrap();
        let rates = [2.2, 2.2, 2.0, 1.8, 1.6, 1.4, 1.2];
        let records: Vec<_> = rates
            .iter()
            .enumerate()
            .map(|(i, &rate)| record(i as i64, today - Days::new(7 - i as u64), rate))
            .collect();

        let predicted = Predictor::default().predict_at(&records, noon(today)).unwrap();

        assert!(predicted > 0.8 && predicted < 1.2, "{predicted}");
        assert!(predicted.is_finite());
    }
}
