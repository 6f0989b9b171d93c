//! History import from the Central Bank of Russia daily XML feed.

use std::str::FromStr;

use anyhow::Result;
use chrono::{Days, NaiveDate};
use reqwest::Client;
use rust_decimal::Decimal;

use crate::exchange_rate::ExchangeRate;
use crate::store::RateStore;
use crate::val_curs::ValCurs;

/// Every CBR rate is quoted in roubles.
pub const TARGET_CURRENCY: &str = "RUB";

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ImportSummary {
    pub inserted: usize,
    pub skipped: usize,
}

pub struct CbrClient {
    client: Client,
    base_url: String,
}

impl CbrClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into(),
        }
    }

    pub fn get_url(&self, date: NaiveDate) -> String {
        format!("{}?date_req={}", self.base_url, date.format("%d/%m/%Y"))
    }

    pub async fn get_val_curs(&self, date: NaiveDate) -> Result<ValCurs> {
        let url = self.get_url(date);
        let text = self.load_xml(&url).await?;
        parse_val_curs(&text)
    }

    async fn load_xml(&self, url: &str) -> Result<String> {
        let resp = self.client.get(url).send().await?;
        if !resp.status().is_success() {
            anyhow::bail!("Can't download the file: {}", resp.status());
        }

        let text = resp.text().await?;

        Ok(text)
    }
}

pub fn parse_val_curs(text: &str) -> Result<ValCurs> {
    let val_curs: ValCurs = quick_xml::de::from_str(text)?;
    Ok(val_curs)
}

fn normalize_decimal_string(s: &str) -> String {
    s.trim().replace(',', ".")
}

/// The date the feed says its rates are for, and the rate of every currency.
pub fn get_curs_rates(val_curs: &ValCurs) -> Result<(NaiveDate, Vec<(String, Decimal)>)> {
    let date = NaiveDate::parse_from_str(&val_curs.date, "%d.%m.%Y")
        .map_err(|e| anyhow::anyhow!("Can't parse feed date {:?}: {}", val_curs.date, e))?;

    let mut rates = Vec::with_capacity(val_curs.valute.len());
    for valute in &val_curs.valute {
        let normalized_string = normalize_decimal_string(&valute.vunit_rate);
        let value = Decimal::from_str(&normalized_string)?;
        rates.push((valute.char_code.clone(), value));
    }

    Ok((date, rates))
}

/// Stores one feed day. Pairs already recorded for that date are left alone.
pub async fn store_val_curs(store: &dyn RateStore, val_curs: &ValCurs) -> Result<ImportSummary> {
    let (date, rates) = get_curs_rates(val_curs)?;
    let mut summary = ImportSummary::default();

    for (char_code, rate) in rates {
        if rate <= Decimal::ZERO
            || store
                .get_by_date_and_pair(date, &char_code, TARGET_CURRENCY)
                .await?
                .is_some()
        {
            summary.skipped += 1;
            continue;
        }

        let record = ExchangeRate {
            id: store.next_id().await?,
            base_currency: char_code,
            target_currency: TARGET_CURRENCY.to_string(),
            rate,
            effective_date: date,
        };
        if store.insert_if_absent(&record).await? {
            summary.inserted += 1;
        } else {
            log::warn!(
                "Lost id {} for {}/{} on {} to a concurrent writer",
                record.id,
                record.base_currency,
                record.target_currency,
                date
            );
            summary.skipped += 1;
        }
    }

    Ok(summary)
}

/// Imports every day from `end_date` back to `start_date`, inclusive.
pub async fn iterate(
    client: &CbrClient,
    store: &dyn RateStore,
    start_date: NaiveDate,
    end_date: NaiveDate,
) -> Result<ImportSummary> {
    if start_date > end_date {
        return Err(anyhow::anyhow!("Start date must be before end date"));
    }

    let mut total = ImportSummary::default();
    let mut current_date = end_date;

    while current_date >= start_date {
        let val_curs = client.get_val_curs(current_date).await?;
        let summary = store_val_curs(store, &val_curs).await?;
        log::info!(
            "Exchange rates for {}: {} stored, {} already known",
            current_date,
            summary.inserted,
            summary.skipped
        );
        total.inserted += summary.inserted;
        total.skipped += summary.skipped;

        current_date = current_date
            .pred_opt()
            .ok_or(anyhow::anyhow!("Can't get pred date for {}", current_date))?;
    }

    Ok(total)
}

/// The window ending tomorrow and spanning `days` days before it, matching
/// the feed's habit of publishing the next day's rates in advance.
pub fn import_window(today: NaiveDate, days: u64) -> Result<(NaiveDate, NaiveDate)> {
    let start_date = today
        .checked_sub_days(Days::new(days.saturating_sub(1)))
        .ok_or(anyhow::anyhow!("Can't get previous date for {}", today))?;
    let end_date = today
        .checked_add_days(Days::new(1))
        .ok_or(anyhow::anyhow!("Can't get next date for {}", today))?;
    Ok((start_date, end_date))
}
