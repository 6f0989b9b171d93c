use std::sync::Arc;

use chrono::{NaiveDate, Utc};

use crate::error::{RateError, Result};
use crate::exchange_rate::{ExchangeRate, RatePairQuery};
use crate::prediction::Predictor;
use crate::store::RateStore;
use crate::validation::{can_create, ensure_mutable, validate_record};

/// Exchange-rate operations over a shared store.
#[derive(Clone)]
pub struct ExchangeRateService {
    store: Arc<dyn RateStore>,
    predictor: Predictor,
}

/// Current calendar date in UTC; all effective-date rules use it.
pub fn today() -> NaiveDate {
    Utc::now().date_naive()
}

/// Storage failures on a write reach the client as `Rejected`.
fn rejected(err: RateError) -> RateError {
    match err {
        RateError::Storage(source) => {
            log::warn!("Store rejected write: {}", source);
            RateError::Rejected(source.to_string())
        }
        other => other,
    }
}

impl ExchangeRateService {
    pub fn new(store: Arc<dyn RateStore>, predictor: Predictor) -> Self {
        Self { store, predictor }
    }

    pub async fn create(&self, rate: ExchangeRate) -> Result<ExchangeRate> {
        validate_record(&rate)?;
        if !can_create(self.store.as_ref(), rate.id).await? {
            log::warn!("Rejected create of existing exchange rate {}", rate.id);
            return Err(RateError::DuplicateRecord);
        }
        // exists() above is advisory; the conditional insert is what decides
        if !self.store.insert_if_absent(&rate).await.map_err(rejected)? {
            log::warn!(
                "Rejected create of {} {}/{} on {}: key taken",
                rate.id,
                rate.base_currency,
                rate.target_currency,
                rate.effective_date
            );
            return Err(RateError::DuplicateRecord);
        }
        log::info!(
            "Created exchange rate {} {}/{} = {} from {}",
            rate.id,
            rate.base_currency,
            rate.target_currency,
            rate.rate,
            rate.effective_date
        );
        Ok(rate)
    }

    pub async fn retrieve_by_id(&self, id: i64) -> Result<ExchangeRate> {
        self.store.get(id).await?.ok_or(RateError::NotFound(id))
    }

    pub async fn retrieve_by_date_and_pair(
        &self,
        query: &RatePairQuery,
    ) -> Result<Option<ExchangeRate>> {
        self.store
            .get_by_date_and_pair(
                query.effective_date,
                &query.base_currency,
                &query.target_currency,
            )
            .await
    }

    /// The date rule is checked against the incoming payload, before the
    /// existence check. The store only overwrites a record that still exists,
    /// so a concurrent delete is never undone.
    pub async fn update(&self, rate: ExchangeRate) -> Result<ExchangeRate> {
        if let Err(err) = ensure_mutable(rate.effective_date, today(), "update") {
            log::warn!("Rejected update of {}: effective {}", rate.id, rate.effective_date);
            return Err(err);
        }
        validate_record(&rate)?;

        let saved = self
            .store
            .update_existing(&rate)
            .await
            .map_err(rejected)?
            .ok_or(RateError::NotFound(rate.id))?;
        log::info!("Updated exchange rate {}", saved.id);
        Ok(saved)
    }

    /// The date rule is checked against the stored record, not the request.
    pub async fn delete(&self, id: i64) -> Result<()> {
        let existing = self.retrieve_by_id(id).await?;
        if let Err(err) = ensure_mutable(existing.effective_date, today(), "delete") {
            log::warn!("Rejected delete of {}: effective {}", id, existing.effective_date);
            return Err(err);
        }

        self.store.delete(&existing).await?;
        log::info!("Deleted exchange rate {}", id);
        Ok(())
    }

    pub async fn predict(&self, base_currency: &str, target_currency: &str) -> Result<f64> {
        let history = self
            .store
            .list_by_pair(base_currency, target_currency)
            .await?;
        if history.is_empty() {
            return Err(RateError::NoHistoricalData);
        }
        self.predictor.predict(&history)
    }
}
