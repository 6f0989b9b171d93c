use chrono::{NaiveDate, NaiveTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A rate of one unit of `base_currency` expressed in `target_currency`,
/// valid from `effective_date` on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ExchangeRate {
    pub id: i64,
    pub base_currency: String,
    pub target_currency: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub rate: Decimal,
    pub effective_date: NaiveDate,
}

impl ExchangeRate {
    /// Milliseconds since the Unix epoch of midnight UTC on the effective date.
    pub fn timestamp_millis(&self) -> i64 {
        self.effective_date
            .and_time(NaiveTime::MIN)
            .and_utc()
            .timestamp_millis()
    }
}

/// Lookup body for the date + currency pair query. Any other record fields
/// sent along are ignored.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RatePairQuery {
    pub effective_date: NaiveDate,
    pub base_currency: String,
    pub target_currency: String,
}

/// Body of a delete request; only the id is read.
#[derive(Debug, Clone, Deserialize)]
pub struct RateRef {
    pub id: i64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictionQuery {
    pub base_currency: String,
    pub target_currency: String,
}
