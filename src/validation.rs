use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::error::{RateError, Result};
use crate::exchange_rate::ExchangeRate;
use crate::store::RateStore;

/// Width of the currency code columns in `migrations/`.
pub const MAX_CURRENCY_CODE_LEN: usize = 16;

/// True iff no record with `id` exists yet.
pub async fn can_create(store: &dyn RateStore, id: i64) -> Result<bool> {
    Ok(!store.exists(id).await?)
}

/// A record may change only while its effective date is strictly after `today`.
pub fn is_mutable(effective_date: NaiveDate, today: NaiveDate) -> bool {
    effective_date > today
}

pub fn ensure_mutable(effective_date: NaiveDate, today: NaiveDate, op: &'static str) -> Result<()> {
    if is_mutable(effective_date, today) {
        Ok(())
    } else {
        Err(RateError::PastEffectiveDate(op))
    }
}

pub fn validate_record(rate: &ExchangeRate) -> Result<()> {
    if rate.rate <= Decimal::ZERO {
        return Err(RateError::InvalidRecord(format!(
            "rate must be positive, got {}",
            rate.rate
        )));
    }
    check_code("base", &rate.base_currency)?;
    check_code("target", &rate.target_currency)
}

fn check_code(side: &str, code: &str) -> Result<()> {
    if code.trim().is_empty() {
        return Err(RateError::InvalidRecord(format!("{side} currency is empty")));
    }
    if code.chars().count() > MAX_CURRENCY_CODE_LEN {
        return Err(RateError::InvalidRecord(format!(
            "{side} currency {code:?} is longer than {MAX_CURRENCY_CODE_LEN} characters"
        )));
    }
    Ok(())
}
