use async_trait::async_trait;
use chrono::NaiveDate;

use crate::error::Result;
use crate::exchange_rate::ExchangeRate;

mod memory;
mod postgres;

pub use memory::MemoryRateStore;
pub use postgres::PgRateStore;

/// Keyed storage for exchange-rate records.
///
/// Implementations own per-record atomicity: `insert_if_absent` must never let
/// two concurrent callers both succeed for the same id or the same
/// `(effective_date, base, target)` triple.
#[async_trait]
pub trait RateStore: Send + Sync {
    async fn exists(&self, id: i64) -> Result<bool>;

    async fn get(&self, id: i64) -> Result<Option<ExchangeRate>>;

    async fn get_by_date_and_pair(
        &self,
        effective_date: NaiveDate,
        base_currency: &str,
        target_currency: &str,
    ) -> Result<Option<ExchangeRate>>;

    /// All records of a currency pair, in no particular order.
    async fn list_by_pair(
        &self,
        base_currency: &str,
        target_currency: &str,
    ) -> Result<Vec<ExchangeRate>>;

    /// Stores `rate` unless its id or natural key is taken. Returns whether
    /// the record was inserted.
    async fn insert_if_absent(&self, rate: &ExchangeRate) -> Result<bool>;

    /// Overwrites the record with `rate.id` only if it is still stored.
    /// Returns `None` when no such record exists; nothing is inserted then.
    async fn update_existing(&self, rate: &ExchangeRate) -> Result<Option<ExchangeRate>>;

    /// Insert-or-update by id.
    async fn save(&self, rate: &ExchangeRate) -> Result<ExchangeRate>;

    async fn delete(&self, rate: &ExchangeRate) -> Result<()>;

    /// Smallest id greater than every stored id.
    async fn next_id(&self) -> Result<i64>;
}
