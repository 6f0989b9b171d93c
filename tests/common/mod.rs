#![allow(dead_code)]

use std::sync::Arc;

use chrono::{Days, NaiveDate};
use fxrate::service::{self, ExchangeRateService};
use fxrate::store::{MemoryRateStore, RateStore};
use fxrate::{ExchangeRate, Predictor};
use rust_decimal::Decimal;
use rust_decimal::prelude::FromPrimitive;

pub fn rate(id: i64, base: &str, target: &str, value: f64, date: NaiveDate) -> ExchangeRate {
    ExchangeRate {
        id,
        base_currency: base.to_string(),
        target_currency: target.to_string(),
        rate: Decimal::from_f64(value).unwrap(),
        effective_date: date,
    }
}

pub fn days_ahead(days: u64) -> NaiveDate {
    service::today() + Days::new(days)
}

pub fn days_ago(days: u64) -> NaiveDate {
    service::today() - Days::new(days)
}

pub fn setup() -> (Arc<MemoryRateStore>, ExchangeRateService) {
    let store = Arc::new(MemoryRateStore::new());
    let service = ExchangeRateService::new(store.clone() as Arc<dyn RateStore>, Predictor::new(7));
    (store, service)
}

/// USD/EUR falling from 2.2 to 1.2 over the seven days before today.
pub fn declining_usd_eur() -> Vec<ExchangeRate> {
    [2.2, 2.2, 2.0, 1.8, 1.6, 1.4, 1.2]
        .iter()
        .enumerate()
        .map(|(i, &value)| rate(i as i64 + 1, "USD", "EUR", value, days_ago(7 - i as u64)))
        .collect()
}
