use serde::{Deserialize, Serialize};

/// A payment as Moneta's status API reports it. Field names match the wire format of both the
/// status API and Moneta's webhooks, so a fetched payment can be fed through the same
/// normalization path as a pushed one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonetaPayment {
    pub order_id: String,
    pub status: String,
    #[serde(default)]
    pub amount: Option<i64>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub payer: Option<MonetaPayer>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonetaPayer {
    #[serde(default)]
    pub account_id: Option<String>,
}
