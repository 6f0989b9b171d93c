use actix_web::{HttpResponse, web};
use serde::Deserialize;

use crate::error::RateError;
use crate::exchange_rate::{ExchangeRate, PredictionQuery, RatePairQuery, RateRef};
use crate::service::ExchangeRateService;

pub const DELETED_MESSAGE: &str = "Exchange rate deleted successfully.";

#[derive(Debug, Deserialize)]
pub struct IdQuery {
    pub id: i64,
}

/// Registers the exchange-rate routes on an app or scope.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/")
            .route(web::post().to(create_exchange_rate))
            .route(web::get().to(retrieve_exchange_rate_by_id))
            .route(web::put().to(update_exchange_rate))
            .route(web::delete().to(delete_exchange_rate)),
    )
    .route(
        "/by-date-and-currencies",
        web::get().to(retrieve_exchange_rate_for_date_and_pair),
    )
    .route("/predictive-rate", web::get().to(predictive_rate));
}

async fn create_exchange_rate(
    service: web::Data<ExchangeRateService>,
    rate: web::Json<ExchangeRate>,
) -> Result<HttpResponse, RateError> {
    let created = service.create(rate.into_inner()).await?;
    Ok(HttpResponse::Ok().json(created))
}

async fn retrieve_exchange_rate_by_id(
    service: web::Data<ExchangeRateService>,
    query: web::Query<IdQuery>,
) -> Result<HttpResponse, RateError> {
    let rate = service.retrieve_by_id(query.id).await?;
    Ok(HttpResponse::Ok().json(rate))
}

/// Answers `null` when nothing matches.
async fn retrieve_exchange_rate_for_date_and_pair(
    service: web::Data<ExchangeRateService>,
    query: web::Json<RatePairQuery>,
) -> Result<HttpResponse, RateError> {
    let rate = service.retrieve_by_date_and_pair(&query).await?;
    Ok(HttpResponse::Ok().json(rate))
}

async fn update_exchange_rate(
    service: web::Data<ExchangeRateService>,
    rate: web::Json<ExchangeRate>,
) -> Result<HttpResponse, RateError> {
    let updated = service.update(rate.into_inner()).await?;
    Ok(HttpResponse::Ok().json(updated))
}

async fn delete_exchange_rate(
    service: web::Data<ExchangeRateService>,
    rate: web::Json<RateRef>,
) -> Result<HttpResponse, RateError> {
    service.delete(rate.id).await?;
    Ok(HttpResponse::Ok().body(DELETED_MESSAGE))
}

async fn predictive_rate(
    service: web::Data<ExchangeRateService>,
    query: web::Query<PredictionQuery>,
) -> Result<HttpResponse, RateError> {
    let predicted = service
        .predict(&query.base_currency, &query.target_currency)
        .await?;
    Ok(HttpResponse::Ok().json(predicted))
}
