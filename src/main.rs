use std::sync::Arc;

use actix_web::{App, HttpServer, middleware, web};
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use fxrate::cbr::{self, CbrClient};
use fxrate::config::Config;
use fxrate::service::{self, ExchangeRateService};
use fxrate::store::{MemoryRateStore, PgRateStore, RateStore};
use fxrate::{Predictor, api};

#[derive(Debug, Parser)]
#[command(version, about = "Exchange rate records and trend prediction")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Serve the HTTP API (default)
    Serve,
    /// Pull daily CBR rates into the database
    Import {
        /// Days of history to fetch, ending tomorrow
        #[arg(long, default_value_t = 7)]
        days: u64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let config = Config::from_env()?;

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(config).await,
        Command::Import { days } => import(config, days).await,
    }
}

async fn connect(config: &Config, url: &str) -> Result<PgRateStore> {
    let store = PgRateStore::connect(url, config.database_max_connections)
        .await
        .context("Can't connect to the database")?;
    store.migrate().await.context("Can't run migrations")?;
    Ok(store)
}

async fn serve(config: Config) -> Result<()> {
    let store: Arc<dyn RateStore> = match &config.database_url {
        Some(url) => Arc::new(connect(&config, url).await?),
        None => {
            log::warn!("DATABASE_URL is not set; records are kept in memory only");
            Arc::new(MemoryRateStore::new())
        }
    };

    let service = web::Data::new(ExchangeRateService::new(
        store,
        Predictor::new(config.min_history_window),
    ));

    log::info!("Listening on {}:{}", config.host, config.port);
    HttpServer::new(move || {
        App::new()
            .app_data(service.clone())
            .wrap(middleware::Logger::default())
            .configure(api::configure)
    })
    .bind((config.host.as_str(), config.port))?
    .run()
    .await?;

    Ok(())
}

async fn import(config: Config, days: u64) -> Result<()> {
    let url = config
        .database_url
        .as_deref()
        .ok_or(anyhow::anyhow!("DATABASE_URL is required for import"))?;
    let store = connect(&config, url).await?;
    let client = CbrClient::new(config.cbr_url.as_str());

    let (start_date, end_date) = cbr::import_window(service::today(), days)?;
    let summary = cbr::iterate(&client, &store, start_date, end_date).await?;
    log::info!(
        "Imported {} exchange rates ({} already known) for {}..={}",
        summary.inserted,
        summary.skipped,
        start_date,
        end_date
    );

    Ok(())
}
