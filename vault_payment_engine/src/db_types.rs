use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use thiserror::Error;
use vault_common::Credits;

//--------------------------------------     UserAccount     ---------------------------------------------------------
/// A platform user's ledger totals. `balance` is spendable credit; `total_invested` is the
/// lifetime sum of every credited payment and never decreases.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct UserAccount {
    pub id: i64,
    pub customer_id: String,
    pub email: Option<String>,
    pub balance: Credits,
    pub total_invested: Credits,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

//--------------------------------------      PaymentId      ---------------------------------------------------------
/// The single value the outside world uses to name a payment. It may originate as a provider
/// transaction id, an internally minted top-up order id, or an operator-supplied reference.
/// It is the sole idempotency key: the ledger store enforces a unique index on it.
#[derive(Debug, Clone, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
pub struct PaymentId(pub String);

impl FromStr for PaymentId {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.to_string()))
    }
}

impl From<String> for PaymentId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl Display for PaymentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl PaymentId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

//--------------------------------------  PaymentStatusType  ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
pub enum PaymentStatusType {
    /// A candidate payment has been seen but no terminal signal has arrived yet.
    Pending,
    /// A terminal signal arrived but the amount or user could not be resolved automatically.
    /// Requires operator follow-up.
    PendingVerification,
    /// The payment has been credited to an account. Terminal and immutable.
    Credited,
    /// The provider reported a terminal failure, or the amount failed validation. Terminal.
    Rejected,
    /// No terminal signal arrived within the expiry window. Only an operator override can
    /// credit the payment from here.
    Expired,
}

impl Display for PaymentStatusType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaymentStatusType::Pending => write!(f, "Pending"),
            PaymentStatusType::PendingVerification => write!(f, "PendingVerification"),
            PaymentStatusType::Credited => write!(f, "Credited"),
            PaymentStatusType::Rejected => write!(f, "Rejected"),
            PaymentStatusType::Expired => write!(f, "Expired"),
        }
    }
}

#[derive(Debug, Clone, Error)]
#[error("Invalid payment status: {0}")]
pub struct ConversionError(String);

impl FromStr for PaymentStatusType {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pending" => Ok(Self::Pending),
            "PendingVerification" => Ok(Self::PendingVerification),
            "Credited" => Ok(Self::Credited),
            "Rejected" => Ok(Self::Rejected),
            "Expired" => Ok(Self::Expired),
            s => Err(ConversionError(s.to_string())),
        }
    }
}

//--------------------------------------    PaymentSource    ---------------------------------------------------------
/// How a payment event reached the engine. Recorded on every row so operators can audit which
/// ingestion path produced a credit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
pub enum PaymentSource {
    Webhook,
    Poll,
    Manual,
}

impl Display for PaymentSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaymentSource::Webhook => write!(f, "Webhook"),
            PaymentSource::Poll => write!(f, "Poll"),
            PaymentSource::Manual => write!(f, "Manual"),
        }
    }
}

//--------------------------------------       Provider      ---------------------------------------------------------
/// The closed set of supported payment providers. New providers are added as a new variant with
/// its own normalizer, never by sniffing field presence in a shared code path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
pub enum Provider {
    AstraPay,
    CardLink,
    Moneta,
}

impl Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Provider::AstraPay => write!(f, "AstraPay"),
            Provider::CardLink => write!(f, "CardLink"),
            Provider::Moneta => write!(f, "Moneta"),
        }
    }
}

impl FromStr for Provider {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "astrapay" => Ok(Self::AstraPay),
            "cardlink" => Ok(Self::CardLink),
            "moneta" => Ok(Self::Moneta),
            s => Err(ConversionError(format!("Unknown provider: {s}"))),
        }
    }
}

//--------------------------------------    PaymentRecord    ---------------------------------------------------------
/// One row per externally-identified payment. The raw provider payload is retained indefinitely
/// for audit and dispute resolution.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct PaymentRecord {
    pub id: i64,
    pub payment_id: PaymentId,
    pub account_id: Option<i64>,
    pub amount: Option<Credits>,
    pub requested_amount: Option<Credits>,
    pub currency: Option<String>,
    pub status: PaymentStatusType,
    pub source: PaymentSource,
    /// `None` for payments minted by an operator override that no provider ever reported.
    pub provider: Option<Provider>,
    pub raw_payload: String,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
    pub processed_at: Option<DateTime<Utc>>,
}

//--------------------------------------  NewPaymentRecord   ---------------------------------------------------------
/// The fields the engine hands to the ledger store when it first materializes a candidate
/// payment. The store decides the final status based on what already exists for `payment_id`.
#[derive(Debug, Clone)]
pub struct NewPaymentRecord {
    pub payment_id: PaymentId,
    pub account_id: Option<i64>,
    pub amount: Option<Credits>,
    pub requested_amount: Option<Credits>,
    pub currency: Option<String>,
    pub source: PaymentSource,
    pub provider: Option<Provider>,
    pub raw_payload: String,
    pub note: Option<String>,
}

impl NewPaymentRecord {
    pub fn new(payment_id: PaymentId, provider: Option<Provider>, source: PaymentSource) -> Self {
        Self {
            payment_id,
            account_id: None,
            amount: None,
            requested_amount: None,
            currency: None,
            source,
            provider,
            raw_payload: String::new(),
            note: None,
        }
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }
}
