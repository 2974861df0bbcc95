//! CardLink adapter.
//!
//! CardLink is a card acquirer with a conventional charge lifecycle. The charge `id` is theirs;
//! the `reference` echoes our checkout reference, which for top-ups is a synthetic top-up id.
//! CardLink reports a single `amount` (what was captured), nested customer details, and signs
//! webhooks with HMAC-SHA256 over the raw body, base64-encoded in `x-cardlink-signature`.

use log::trace;
use serde_json::Value;

use super::{amount_field, str_field, EventStatus, NormalizeError, PaymentEvent};
use crate::{
    db_types::{PaymentId, Provider},
    helpers::parse_topup_id,
};

pub(super) fn normalize(raw: &Value) -> Result<PaymentEvent, NormalizeError> {
    if !raw.is_object() {
        return Err(NormalizeError::MalformedPayload(Provider::CardLink, "payload is not a JSON object".into()));
    }
    let status = match str_field(raw, "state") {
        Some("captured") | Some("settled") => EventStatus::Success,
        Some("declined") | Some("voided") => EventStatus::Failed,
        other => {
            trace!("💳️ CardLink notification has non-terminal state {other:?}");
            EventStatus::Pending
        },
    };
    let payment_id = str_field(raw, "id")
        .or_else(|| str_field(raw, "reference"))
        .map(|s| PaymentId(s.to_string()))
        .ok_or(NormalizeError::IdentifierUnresolvable(Provider::CardLink))?;

    let topup = str_field(raw, "reference").and_then(parse_topup_id);
    let email = raw
        .get("customer")
        .and_then(|c| c.get("email"))
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string);
    let customer_id = topup.as_ref().map(|t| t.customer_id.clone());
    let reported_amount = amount_field(raw, "amount");
    let requested_amount = topup.map(|t| t.amount);
    let currency = str_field(raw, "currency").map(|s| s.to_uppercase());

    Ok(PaymentEvent {
        payment_id,
        provider: Provider::CardLink,
        customer_id,
        email,
        reported_amount,
        requested_amount,
        currency,
        status,
        raw: raw.clone(),
    })
}
