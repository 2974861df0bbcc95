//! Moneta adapter.
//!
//! Moneta's webhook delivery is best-effort at most: notifications routinely arrive late or not
//! at all, so this provider is primarily driven by the active poller, which fetches the payment
//! by `order_id` from Moneta's status API and feeds the response body through this same
//! normalizer. Whatever path the payload took, the reconciliation semantics are identical.
//!
//! When Moneta does deliver a webhook it is signed with HMAC-SHA256 over the raw body,
//! hex-encoded in the `x-moneta-signature` header.

use log::trace;
use serde_json::Value;

use super::{amount_field, str_field, EventStatus, NormalizeError, PaymentEvent};
use crate::{
    db_types::{PaymentId, Provider},
    helpers::parse_topup_id,
};

pub(super) fn normalize(raw: &Value) -> Result<PaymentEvent, NormalizeError> {
    if !raw.is_object() {
        return Err(NormalizeError::MalformedPayload(Provider::Moneta, "payload is not a JSON object".into()));
    }
    let status = match str_field(raw, "status") {
        Some("success") => EventStatus::Success,
        Some("failed") | Some("expired") => EventStatus::Failed,
        other => {
            trace!("🪙️ Moneta notification has non-terminal status {other:?}");
            EventStatus::Pending
        },
    };
    // Moneta has no id of its own that survives retries; the order id is the only stable name.
    let payment_id = str_field(raw, "order_id")
        .map(|s| PaymentId(s.to_string()))
        .ok_or(NormalizeError::IdentifierUnresolvable(Provider::Moneta))?;

    let topup = parse_topup_id(payment_id.as_str());
    let customer_id = raw
        .get("payer")
        .and_then(|p| p.get("account_id"))
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .or_else(|| topup.as_ref().map(|t| t.customer_id.clone()));
    let reported_amount = amount_field(raw, "amount");
    let requested_amount = topup.map(|t| t.amount);
    let currency = str_field(raw, "currency").map(|s| s.to_uppercase());

    Ok(PaymentEvent {
        payment_id,
        provider: Provider::Moneta,
        customer_id,
        email: None,
        reported_amount,
        requested_amount,
        currency,
        status,
        raw: raw.clone(),
    })
}

#[cfg(test)]
mod test {
    use serde_json::json;
    use vault_common::Credits;

    use super::*;

    #[test]
    fn successful_payment_normalizes() {
        let raw = json!({
            "order_id": "topup_user42_1700000000000_50",
            "status": "success",
            "amount": 50,
            "currency": "USD",
            "payer": { "account_id": "user42" }
        });
        let event = normalize(&raw).unwrap();
        assert_eq!(event.payment_id.as_str(), "topup_user42_1700000000000_50");
        assert_eq!(event.status, EventStatus::Success);
        assert_eq!(event.customer_id.as_deref(), Some("user42"));
        assert_eq!(event.reported_amount, Some(Credits::from(50)));
        assert_eq!(event.requested_amount, Some(Credits::from(50)));
    }

    #[test]
    fn processing_is_non_terminal() {
        let raw = json!({ "order_id": "topup_u1_1700000000000_10", "status": "processing" });
        assert_eq!(normalize(&raw).unwrap().status, EventStatus::Pending);
    }

    #[test]
    fn user_recovered_from_order_id_when_payer_absent() {
        let raw = json!({ "order_id": "topup_user9_1700000000000_30", "status": "success", "amount": 30 });
        assert_eq!(normalize(&raw).unwrap().customer_id.as_deref(), Some("user9"));
    }

    #[test]
    fn missing_order_id_is_a_hard_error() {
        let raw = json!({ "status": "success", "amount": 30 });
        assert!(matches!(normalize(&raw), Err(NormalizeError::IdentifierUnresolvable(Provider::Moneta))));
    }
}
