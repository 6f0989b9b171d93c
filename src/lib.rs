pub mod api;
pub mod cbr;
pub mod config;
pub mod error;
pub mod exchange_rate;
pub mod prediction;
pub mod service;
pub mod store;
pub mod val_curs;
pub mod validation;

pub use error::{RateError, Result};
pub use exchange_rate::ExchangeRate;
pub use prediction::Predictor;
pub use service::ExchangeRateService;
