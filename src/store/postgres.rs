use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

use super::RateStore;
use crate::error::{RateError, Result};
use crate::exchange_rate::ExchangeRate;

const COLUMNS: &str = "id, base_currency, target_currency, rate, effective_date";

/// Postgres-backed store. Uniqueness of the id and of the
/// `(effective_date, base_currency, target_currency)` triple is enforced by
/// the table constraints in `migrations/`.
#[derive(Debug, Clone)]
pub struct PgRateStore {
    pool: PgPool,
}

impl PgRateStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;
        Ok(Self::new(pool))
    }

    pub async fn migrate(&self) -> anyhow::Result<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

fn map_unique_violation(err: sqlx::Error) -> RateError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => RateError::DuplicateRecord,
        _ => RateError::Storage(err),
    }
}

#[async_trait]
impl RateStore for PgRateStore {
    async fn exists(&self, id: i64) -> Result<bool> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM exchange_rates WHERE id = $1)")
                .bind(id)
                .fetch_one(&self.pool)
                .await?;
        Ok(exists)
    }

    async fn get(&self, id: i64) -> Result<Option<ExchangeRate>> {
        let rate = sqlx::query_as::<_, ExchangeRate>(&format!(
            "SELECT {COLUMNS} FROM exchange_rates WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(rate)
    }

    async fn get_by_date_and_pair(
        &self,
        effective_date: NaiveDate,
        base_currency: &str,
        target_currency: &str,
    ) -> Result<Option<ExchangeRate>> {
        let rate = sqlx::query_as::<_, ExchangeRate>(&format!(
            "SELECT {COLUMNS} FROM exchange_rates \
             WHERE effective_date = $1 AND base_currency = $2 AND target_currency = $3"
        ))
        .bind(effective_date)
        .bind(base_currency)
        .bind(target_currency)
        .fetch_optional(&self.pool)
        .await?;
        Ok(rate)
    }

    async fn list_by_pair(
        &self,
        base_currency: &str,
        target_currency: &str,
    ) -> Result<Vec<ExchangeRate>> {
        let rates = sqlx::query_as::<_, ExchangeRate>(&format!(
            "SELECT {COLUMNS} FROM exchange_rates \
             WHERE base_currency = $1 AND target_currency = $2"
        ))
        .bind(base_currency)
        .bind(target_currency)
        .fetch_all(&self.pool)
        .await?;
        Ok(rates)
    }

    async fn insert_if_absent(&self, rate: &ExchangeRate) -> Result<bool> {
        let result = sqlx::query(
            "INSERT INTO exchange_rates (id, base_currency, target_currency, rate, effective_date) \
             VALUES ($1, $2, $3, $4, $5) ON CONFLICT DO NOTHING",
        )
        .bind(rate.id)
        .bind(&rate.base_currency)
        .bind(&rate.target_currency)
        .bind(rate.rate)
        .bind(rate.effective_date)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    async fn update_existing(&self, rate: &ExchangeRate) -> Result<Option<ExchangeRate>> {
        sqlx::query_as::<_, ExchangeRate>(&format!(
            "UPDATE exchange_rates SET \
                 base_currency = $2, \
                 target_currency = $3, \
                 rate = $4, \
                 effective_date = $5 \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        ))
        .bind(rate.id)
        .bind(&rate.base_currency)
        .bind(&rate.target_currency)
        .bind(rate.rate)
        .bind(rate.effective_date)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_unique_violation)
    }

    async fn save(&self, rate: &ExchangeRate) -> Result<ExchangeRate> {
        sqlx::query_as::<_, ExchangeRate>(&format!(
            "INSERT INTO exchange_rates (id, base_currency, target_currency, rate, effective_date) \
             VALUES ($1, $2, $3, $4, $5) \
             ON CONFLICT (id) DO UPDATE SET \
                 base_currency = EXCLUDED.base_currency, \
                 target_currency = EXCLUDED.target_currency, \
                 rate = EXCLUDED.rate, \
                 effective_date = EXCLUDED.effective_date \
             RETURNING {COLUMNS}"
        ))
        .bind(rate.id)
        .bind(&rate.base_currency)
        .bind(&rate.target_currency)
        .bind(rate.rate)
        .bind(rate.effective_date)
        .fetch_one(&self.pool)
        .await
        .map_err(map_unique_violation)
    }

    async fn delete(&self, rate: &ExchangeRate) -> Result<()> {
        sqlx::query("DELETE FROM exchange_rates WHERE id = $1")
            .bind(rate.id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn next_id(&self) -> Result<i64> {
        let max: Option<i64> = sqlx::query_scalar("SELECT MAX(id) FROM exchange_rates")
            .fetch_one(&self.pool)
            .await?;
        Ok(max.map_or(1, |id| id + 1))
    }
}
