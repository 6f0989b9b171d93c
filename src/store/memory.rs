use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::NaiveDate;
use tokio::sync::RwLock;

use super::RateStore;
use crate::error::{RateError, Result};
use crate::exchange_rate::ExchangeRate;

/// Process-local store. Every write takes the single lock, so the natural-key
/// check and the insert happen atomically.
#[derive(Debug, Default)]
pub struct MemoryRateStore {
    rates: RwLock<BTreeMap<i64, ExchangeRate>>,
}

impl MemoryRateStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.rates.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.rates.read().await.is_empty()
    }
}

fn same_key(a: &ExchangeRate, b: &ExchangeRate) -> bool {
    a.effective_date == b.effective_date
        && a.base_currency == b.base_currency
        && a.target_currency == b.target_currency
}

#[async_trait]
impl RateStore for MemoryRateStore {
    async fn exists(&self, id: i64) -> Result<bool> {
        Ok(self.rates.read().await.contains_key(&id))
    }

    async fn get(&self, id: i64) -> Result<Option<ExchangeRate>> {
        Ok(self.rates.read().await.get(&id).cloned())
    }

    async fn get_by_date_and_pair(
        &self,
        effective_date: NaiveDate,
        base_currency: &str,
        target_currency: &str,
    ) -> Result<Option<ExchangeRate>> {
        let rates = self.rates.read().await;
        Ok(rates
            .values()
            .find(|r| {
                r.effective_date == effective_date
                    && r.base_currency == base_currency
                    && r.target_currency == target_currency
            })
            .cloned())
    }

    async fn list_by_pair(
        &self,
        base_currency: &str,
        target_currency: &str,
    ) -> Result<Vec<ExchangeRate>> {
        let rates = self.rates.read().await;
        Ok(rates
            .values()
            .filter(|r| r.base_currency == base_currency && r.target_currency == target_currency)
            .cloned()
            .collect())
    }

    async fn insert_if_absent(&self, rate: &ExchangeRate) -> Result<bool> {
        let mut rates = self.rates.write().await;
        if rates.contains_key(&rate.id) || rates.values().any(|r| same_key(r, rate)) {
            return Ok(false);
        }
        rates.insert(rate.id, rate.clone());
        Ok(true)
    }

    async fn update_existing(&self, rate: &ExchangeRate) -> Result<Option<ExchangeRate>> {
        let mut rates = self.rates.write().await;
        if !rates.contains_key(&rate.id) {
            return Ok(None);
        }
        if rates.values().any(|r| r.id != rate.id && same_key(r, rate)) {
            return Err(RateError::DuplicateRecord);
        }
        rates.insert(rate.id, rate.clone());
        Ok(Some(rate.clone()))
    }

    async fn save(&self, rate: &ExchangeRate) -> Result<ExchangeRate> {
        let mut rates = self.rates.write().await;
        if rates.values().any(|r| r.id != rate.id && same_key(r, rate)) {
            return Err(RateError::DuplicateRecord);
        }
        rates.insert(rate.id, rate.clone());
        Ok(rate.clone())
    }

    async fn delete(&self, rate: &ExchangeRate) -> Result<()> {
        self.rates.write().await.remove(&rate.id);
        Ok(())
    }

    async fn next_id(&self) -> Result<i64> {
        let rates = self.rates.read().await;
        Ok(rates.keys().next_back().map_or(1, |id| id + 1))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use assert_matches::assert_matches;
    use rust_decimal::Decimal;

    use super::*;

    fn rate(id: i64, day: u32, base: &str) -> ExchangeRate {
        ExchangeRate {
            id,
            base_currency: base.to_string(),
            target_currency: "EUR".to_string(),
            rate: Decimal::new(12, 1),
            effective_date: NaiveDate::from_ymd_opt(2026, 3, day).unwrap(),
        }
    }

    #[tokio::test]
    async fn insert_if_absent_rejects_taken_id_and_natural_key() {
        let store = MemoryRateStore::new();

        assert!(store.insert_if_absent(&rate(1, 1, "USD")).await.unwrap());
        assert!(!store.insert_if_absent(&rate(1, 2, "USD")).await.unwrap());
        assert!(!store.insert_if_absent(&rate(2, 1, "USD")).await.unwrap());
        assert!(store.insert_if_absent(&rate(2, 1, "GBP")).await.unwrap());
        assert_eq!(store.len().await, 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_inserts_of_one_id_admit_a_single_winner() {
        let store = Arc::new(MemoryRateStore::new());

        let tasks: Vec<_> = (1..=28)
            .map(|day| {
                let store = store.clone();
                tokio::spawn(async move { store.insert_if_absent(&rate(7, day, "USD")).await })
            })
            .collect();

        let mut inserted = 0;
        for task in tasks {
            if task.await.unwrap().unwrap() {
                inserted += 1;
            }
        }

        assert_eq!(inserted, 1);
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn update_existing_never_inserts() {
        let store = MemoryRateStore::new();

        assert_eq!(store.update_existing(&rate(1, 1, "USD")).await.unwrap(), None);
        assert!(store.is_empty().await);

        store.save(&rate(1, 1, "USD")).await.unwrap();
        store.save(&rate(2, 2, "USD")).await.unwrap();
        let moved = rate(1, 3, "USD");
        assert_eq!(
            store.update_existing(&moved).await.unwrap(),
            Some(moved.clone())
        );
        assert_matches!(
            store.update_existing(&rate(1, 2, "USD")).await,
            Err(RateError::DuplicateRecord)
        );
        assert_eq!(store.get(1).await.unwrap(), Some(moved));
    }

    #[tokio::test]
    async fn save_rejects_moving_onto_another_records_key() {
        let store = MemoryRateStore::new();
        store.save(&rate(1, 1, "USD")).await.unwrap();
        store.save(&rate(2, 2, "USD")).await.unwrap();

        assert_matches!(
            store.save(&rate(2, 1, "USD")).await,
            Err(RateError::DuplicateRecord)
        );
        // rewriting a record onto its own key is an update
        assert!(store.save(&rate(1, 1, "USD")).await.is_ok());
    }

    #[tokio::test]
    async fn lookups_filter_by_pair() {
        let store = MemoryRateStore::new();
        for (id, base) in [(1, "USD"), (2, "GBP"), (3, "USD")] {
            store.save(&rate(id, id as u32, base)).await.unwrap();
        }

        assert_eq!(store.list_by_pair("USD", "EUR").await.unwrap().len(), 2);
        assert!(store.list_by_pair("EUR", "USD").await.unwrap().is_empty());
        let found = store
            .get_by_date_and_pair(NaiveDate::from_ymd_opt(2026, 3, 2).unwrap(), "GBP", "EUR")
            .await
            .unwrap();
        assert_eq!(found.map(|r| r.id), Some(2));
        assert_eq!(store.next_id().await.unwrap(), 4);
    }

    #[tokio::test]
    async fn next_id_starts_at_one() {
        let store = MemoryRateStore::new();
        assert_eq!(store.next_id().await.unwrap(), 1);
        assert!(store.is_empty().await);
    }
}
