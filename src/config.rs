use std::env;
use std::str::FromStr;

use anyhow::{Context, Result};

use crate::prediction::DEFAULT_MIN_WINDOW;

const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 8080;
const DEFAULT_MAX_CONNECTIONS: u32 = 5;
pub const DEFAULT_CBR_URL: &str = "https://cbr.ru/scripts/XML_daily.asp";

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Unset means the process keeps its records in memory.
    pub database_url: Option<String>,
    pub database_max_connections: u32,
    pub host: String,
    pub port: u16,
    pub min_history_window: usize,
    pub cbr_url: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: None,
            database_max_connections: DEFAULT_MAX_CONNECTIONS,
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            min_history_window: DEFAULT_MIN_WINDOW,
            cbr_url: DEFAULT_CBR_URL.to_string(),
        }
    }
}

impl Config {
    /// Reads `.env` if present, then the process environment.
    pub fn from_env() -> Result<Self> {
        if let Err(err) = dotenvy::dotenv() {
            if !err.not_found() {
                return Err(err).context("Can't read .env file");
            }
        }
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = Self::default();

        let config = Self {
            database_url: lookup("DATABASE_URL").filter(|url| !url.trim().is_empty()),
            database_max_connections: parse_or(
                &lookup,
                "DATABASE_MAX_CONNECTIONS",
                defaults.database_max_connections,
            )?,
            host: lookup("HOST").unwrap_or(defaults.host),
            port: parse_or(&lookup, "PORT", defaults.port)?,
            min_history_window: parse_or(
                &lookup,
                "MIN_HISTORY_WINDOW",
                defaults.min_history_window,
            )?,
            cbr_url: lookup("CBR_URL").unwrap_or(defaults.cbr_url),
        };

        if config.min_history_window < 2 {
            anyhow::bail!(
                "MIN_HISTORY_WINDOW must be at least 2, got {}",
                config.min_history_window
            );
        }

        Ok(config)
    }
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(value) => value
            .trim()
            .parse()
            .with_context(|| format!("Invalid {}: {:?}", key, value)),
        None => Ok(default),
    }
}
