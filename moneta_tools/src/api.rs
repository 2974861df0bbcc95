use std::sync::Arc;

use log::*;
use reqwest::{
    header::{HeaderMap, HeaderValue},
    Client,
    StatusCode,
};

use crate::{config::MonetaConfig, data_objects::MonetaPayment, MonetaApiError};

#[derive(Clone)]
pub struct MonetaApi {
    config: MonetaConfig,
    client: Arc<Client>,
}

impl MonetaApi {
    pub fn new(config: MonetaConfig) -> Result<Self, MonetaApiError> {
        let mut headers = HeaderMap::with_capacity(2);
        let val = HeaderValue::from_str(&format!("Bearer {}", config.api_key.reveal()))
            .map_err(|e| MonetaApiError::Initialization(e.to_string()))?;
        headers.insert("Authorization", val);
        headers.insert("Content-Type", HeaderValue::from_static("application/json"));
        let client = Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .build()
            .map_err(|e| MonetaApiError::Initialization(e.to_string()))?;
        Ok(Self { config, client: Arc::new(client) })
    }

    /// Fetches the current state of a payment by its order id.
    ///
    /// `Ok(None)` means Moneta has no record of the order yet, which during polling simply means
    /// "try again later". Timeouts, connection failures and 5xx responses surface as
    /// [`MonetaApiError::Unavailable`] so callers can treat them the same way. Neither case is
    /// ever a terminal answer about the payment.
    pub async fn get_payment(&self, order_id: &str) -> Result<Option<MonetaPayment>, MonetaApiError> {
        let url = self.url(&format!("/v1/payments/{order_id}"));
        trace!("Fetching payment status: {url}");
        let response = self.client.get(url).send().await.map_err(|e| {
            if e.is_timeout() || e.is_connect() {
                MonetaApiError::Unavailable(e.to_string())
            } else {
                MonetaApiError::QueryError { status: 0, message: e.to_string() }
            }
        })?;
        match response.status() {
            status if status.is_success() => {
                let payment =
                    response.json::<MonetaPayment>().await.map_err(|e| MonetaApiError::JsonError(e.to_string()))?;
                trace!("Moneta reports payment {order_id} as {}", payment.status);
                Ok(Some(payment))
            },
            StatusCode::NOT_FOUND => {
                debug!("Moneta has no record of order {order_id} yet");
                Ok(None)
            },
            status if status.is_server_error() => {
                let message = response.text().await.unwrap_or_default();
                Err(MonetaApiError::Unavailable(format!("{status}: {message}")))
            },
            status => {
                let message = response.text().await.unwrap_or_default();
                Err(MonetaApiError::QueryError { status: status.as_u16(), message })
            },
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.config.api_url)
    }
}
