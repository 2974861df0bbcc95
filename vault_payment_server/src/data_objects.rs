use std::fmt::Display;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use vault_common::Credits;
use vault_payment_engine::{db_types::UserAccount, ReconciliationResult};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonResponse {
    pub success: bool,
    pub message: String,
}

impl JsonResponse {
    pub fn success<S: Display>(message: S) -> Self {
        Self { success: true, message: message.to_string() }
    }

    pub fn failure<S: Display>(message: S) -> Self {
        Self { success: false, message: message.to_string() }
    }
}

/// Body of the on-demand poll trigger. The customer id is a fallback for payloads where the
/// provider does not echo the payer back.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollRequest {
    pub order_id: String,
    pub customer_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconciliationResponse {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<Credits>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_balance: Option<Credits>,
}

impl From<ReconciliationResult> for ReconciliationResponse {
    fn from(result: ReconciliationResult) -> Self {
        match result {
            ReconciliationResult::Credited { amount, new_balance } => {
                Self { status: "completed".into(), amount: Some(amount), new_balance: Some(new_balance) }
            },
            ReconciliationResult::AlreadyProcessed => {
                Self { status: "completed".into(), amount: None, new_balance: None }
            },
            ReconciliationResult::Pending => Self { status: "pending".into(), amount: None, new_balance: None },
            ReconciliationResult::PendingManualReview => {
                Self { status: "pending_verification".into(), amount: None, new_balance: None }
            },
            ReconciliationResult::Rejected(reason) => {
                Self { status: format!("rejected: {reason}"), amount: None, new_balance: None }
            },
        }
    }
}

/// Operator-initiated credit. The amount is always explicit; the server never infers it for a
/// manual override.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManualCreditRequest {
    pub payment_id: String,
    pub user_email: String,
    pub amount: Credits,
    #[serde(default)]
    pub note: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BalanceResponse {
    pub customer_id: String,
    pub balance: Credits,
    pub total_invested: Credits,
    pub updated_at: DateTime<Utc>,
}

impl From<UserAccount> for BalanceResponse {
    fn from(account: UserAccount) -> Self {
        Self {
            customer_id: account.customer_id,
            balance: account.balance,
            total_invested: account.total_invested,
            updated_at: account.updated_at,
        }
    }
}
