//! A thin client for Moneta's payment status API.
//!
//! Moneta's webhooks are unreliable, so the reconciliation server polls this API for the
//! authoritative state of a payment. The client only reads; all crediting decisions happen in
//! the payment engine.
mod api;
mod config;
mod data_objects;
mod error;

pub use api::MonetaApi;
pub use config::MonetaConfig;
pub use data_objects::{MonetaPayer, MonetaPayment};
pub use error::MonetaApiError;
