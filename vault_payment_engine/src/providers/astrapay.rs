//! AstraPay adapter.
//!
//! AstraPay is a hosted crypto-payment gateway. Its IPN payloads carry both the amount the user
//! was invoiced for (`price_amount`) and the amount that actually arrived on-chain
//! (`actually_paid`), which can differ on under- and over-payments. The `order_id` field echoes
//! whatever we minted at checkout, so for top-ups it decodes to the requesting user and the
//! requested amount.
//!
//! Notifications are signed with HMAC-SHA512 over the raw body, hex-encoded in the
//! `x-astrapay-sig` header.

use log::trace;
use serde_json::Value;

use super::{amount_field, str_field, EventStatus, NormalizeError, PaymentEvent};
use crate::{
    db_types::{PaymentId, Provider},
    helpers::parse_topup_id,
};

pub(super) fn normalize(raw: &Value) -> Result<PaymentEvent, NormalizeError> {
    if !raw.is_object() {
        return Err(NormalizeError::MalformedPayload(Provider::AstraPay, "payload is not a JSON object".into()));
    }
    let status = match str_field(raw, "payment_status") {
        Some("finished") | Some("confirmed") => EventStatus::Success,
        Some("failed") | Some("refunded") | Some("expired") => EventStatus::Failed,
        // waiting / confirming / sending / partially_paid and anything we don't recognize
        other => {
            trace!("🌠️ AstraPay notification has non-terminal status {other:?}");
            EventStatus::Pending
        },
    };
    // The gateway's own payment id is preferred; the order id we minted is the fallback.
    let payment_id = str_field(raw, "payment_id")
        .or_else(|| str_field(raw, "order_id"))
        .map(|s| PaymentId(s.to_string()))
        .ok_or(NormalizeError::IdentifierUnresolvable(Provider::AstraPay))?;

    let topup = str_field(raw, "order_id").and_then(parse_topup_id);
    let customer_id = str_field(raw, "user_id")
        .map(str::to_string)
        .or_else(|| topup.as_ref().map(|t| t.customer_id.clone()));
    let email = str_field(raw, "customer_email").map(str::to_string);
    let reported_amount = amount_field(raw, "actually_paid").or_else(|| amount_field(raw, "pay_amount"));
    let requested_amount = amount_field(raw, "price_amount").or(topup.map(|t| t.amount));
    let currency = str_field(raw, "price_currency").map(|s| s.to_uppercase());

    Ok(PaymentEvent {
        payment_id,
        provider: Provider::AstraPay,
        customer_id,
        email,
        reported_amount,
        requested_amount,
        currency,
        status,
        raw: raw.clone(),
    })
}
