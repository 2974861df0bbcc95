//! The synthetic top-up order id codec.
//!
//! When the storefront creates a top-up order it mints an id of the form
//! `topup_<customer_id>_<unix_millis>_<amount>`. Several providers echo this id back in their
//! notifications, which lets the engine recover both the originally-requested amount and the
//! target user even when the provider payload carries neither.

use chrono::Utc;
use log::trace;
use regex::Regex;
use vault_common::Credits;

const TOPUP_ID_PATTERN: &str = r"^topup_(?P<user>[A-Za-z0-9\-]+)_(?P<ts>\d{10,16})_(?P<amount>\d{1,12})$";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopUpId {
    pub customer_id: String,
    pub timestamp_ms: i64,
    pub amount: Credits,
}

/// Decode a synthetic top-up order id. Returns `None` for anything that does not match the
/// minted format exactly; callers fall back to the provider-reported fields in that case.
pub fn parse_topup_id(id: &str) -> Option<TopUpId> {
    let re = Regex::new(TOPUP_ID_PATTERN).expect("top-up id pattern is a valid regex");
    let caps = re.captures(id)?;
    let customer_id = caps.name("user")?.as_str().to_string();
    let timestamp_ms = caps.name("ts")?.as_str().parse::<i64>().ok()?;
    let amount = caps.name("amount")?.as_str().parse::<i64>().ok().map(Credits::from)?;
    trace!("🧾️ Decoded top-up id [{id}]: customer {customer_id}, requested {amount}");
    Some(TopUpId { customer_id, timestamp_ms, amount })
}

/// Mint a new top-up order id for the given customer and requested amount.
pub fn mint_topup_id(customer_id: &str, amount: Credits) -> String {
    format!("topup_{customer_id}_{}_{}", Utc::now().timestamp_millis(), amount.value())
}
