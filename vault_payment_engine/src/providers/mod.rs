//! Provider event normalizers.
//!
//! Each provider notifies us in its own payload shape and status vocabulary. The normalizers map
//! every shape into one canonical [`PaymentEvent`] so that the reconciliation engine only ever
//! deals with a single event type. Signature verification happens *before* normalization, at the
//! HTTP boundary, over the raw request bytes.
//!
//! Two rules apply to every adapter:
//! * A status that is not recognized as terminal is normalized to [`EventStatus::Pending`] and
//!   ignored downstream. Providers send many intermediate notifications; they are not errors.
//! * Failing to derive a payment identifier is a hard error, because the identifier is the
//!   idempotency key. Everything else degrades to an unresolved field on the event.

mod astrapay;
mod cardlink;
mod moneta;

use serde_json::Value;
use thiserror::Error;
use vault_common::Credits;

use crate::db_types::{PaymentId, Provider};

/// The canonical, provider-independent shape of a payment notification. It exists only for the
/// duration of one reconciliation attempt and is never persisted as its own entity.
#[derive(Debug, Clone)]
pub struct PaymentEvent {
    pub payment_id: PaymentId,
    pub provider: Provider,
    /// The target user, if the payload carried a usable platform user id (directly or decoded
    /// from a synthetic top-up order id).
    pub customer_id: Option<String>,
    /// A fallback user reference, matched against account storage by the engine.
    pub email: Option<String>,
    /// The amount the provider says was actually received.
    pub reported_amount: Option<Credits>,
    /// The amount the user originally asked for, when the order id encodes it.
    pub requested_amount: Option<Credits>,
    pub currency: Option<String>,
    pub status: EventStatus,
    /// Verbatim copy of the provider payload, persisted for audit.
    pub raw: Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventStatus {
    /// Intermediate notification. The payment may still change state; do nothing.
    Pending,
    /// Terminal success: the provider asserts the money arrived.
    Success,
    /// Terminal failure: the payment will never complete.
    Failed,
}

#[derive(Debug, Clone, Error)]
pub enum NormalizeError {
    #[error("Payload could not be parsed as a {0} notification: {1}")]
    MalformedPayload(Provider, String),
    #[error("No payment identifier could be derived from the {0} payload")]
    IdentifierUnresolvable(Provider),
}

/// Run the normalizer for the given provider over an already-parsed JSON payload.
pub fn normalize(provider: Provider, raw: &Value) -> Result<PaymentEvent, NormalizeError> {
    match provider {
        Provider::AstraPay => astrapay::normalize(raw),
        Provider::CardLink => cardlink::normalize(raw),
        Provider::Moneta => moneta::normalize(raw),
    }
}

fn str_field<'a>(raw: &'a Value, field: &str) -> Option<&'a str> {
    raw.get(field).and_then(Value::as_str).filter(|s| !s.is_empty())
}

/// Providers are inconsistent about whether amounts come as JSON numbers or quoted strings;
/// accept both. Fractional amounts are rejected rather than rounded.
fn amount_field(raw: &Value, field: &str) -> Option<Credits> {
    match raw.get(field)? {
        Value::Number(n) => n.as_i64().map(Credits::from),
        Value::String(s) => s.parse::<i64>().ok().map(Credits::from),
        _ => None,
    }
}
