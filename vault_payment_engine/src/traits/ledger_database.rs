use chrono::Duration;
use thiserror::Error;
use vault_common::Credits;

use crate::{
    db_types::{NewPaymentRecord, PaymentId, PaymentRecord, PaymentStatusType},
    traits::{AccountApiError, AccountManagement},
};

/// The highest level of behaviour for backends supporting the reconciliation engine.
///
/// Correctness note: the idempotency gate is the uniqueness constraint on
/// `payments.payment_id`, enforced by the store, never an in-memory check. Every write method
/// here must treat an already-existing row as an answer, not an error, and report what it found
/// through its outcome enum.
#[allow(async_fn_in_trait)]
pub trait LedgerDatabase: Clone + AccountManagement {
    /// The URL of the database.
    fn url(&self) -> &str;

    /// Applies an at-most-once credit for `record.payment_id`.
    ///
    /// In a single atomic transaction the store must:
    /// * materialize the payment row if it has never been seen (the insert is the concurrency
    ///   gate),
    /// * flip it from `Pending`/`PendingVerification` to `Credited`, and
    /// * increase the account's `balance` and `total_invested` by `record.amount`.
    ///
    /// All three happen together or not at all. If the row is already `Credited` the store
    /// changes nothing and reports [`CreditOutcome::AlreadyCredited`]. A terminal row in any
    /// other state is refused. `override_expired` additionally allows the `Expired` state to be
    /// credited; only the operator override path sets it.
    ///
    /// `record.account_id` and `record.amount` must be populated by the caller.
    async fn credit_payment(
        &self,
        record: NewPaymentRecord,
        override_expired: bool,
    ) -> Result<CreditOutcome, PaymentGatewayError>;

    /// Materializes a `Pending` row for a payment id that has never been seen, so that the
    /// expiry sweep has something to track. If any row already exists, nothing changes. Returns
    /// `true` if a row was inserted.
    async fn record_first_seen(&self, record: NewPaymentRecord) -> Result<bool, PaymentGatewayError>;

    /// Materializes (or flips a `Pending` row into) a `PendingVerification` row, parking the
    /// payment for operator follow-up. Financial events are never silently dropped.
    async fn record_for_review(&self, record: NewPaymentRecord) -> Result<WriteOutcome, PaymentGatewayError>;

    /// Materializes (or flips a non-terminal row into) a `Rejected` row, persisting the raw
    /// payload and the reason so the rejection can be investigated later.
    async fn record_rejection(&self, record: NewPaymentRecord, reason: &str)
        -> Result<WriteOutcome, PaymentGatewayError>;

    /// Fetches the payment record for the given external payment id.
    async fn fetch_payment_record(&self, id: &PaymentId) -> Result<Option<PaymentRecord>, PaymentGatewayError>;

    /// Marks `Pending`/`PendingVerification` rows older than `window` as `Expired`, bounding how
    /// long ambiguous money sits unresolved. Returns the rows that were expired.
    async fn expire_old_payments(&self, window: Duration) -> Result<Vec<PaymentRecord>, PaymentGatewayError>;

    /// Closes the database connection.
    async fn close(&mut self) -> Result<(), PaymentGatewayError> {
        Ok(())
    }
}

/// What [`LedgerDatabase::credit_payment`] found and did.
#[derive(Debug, Clone)]
pub enum CreditOutcome {
    /// The credit was applied in this call. `new_balance` is the committed balance afterwards.
    Credited { amount: Credits, new_balance: Credits },
    /// Another request already credited this payment id. Nothing was changed.
    AlreadyCredited,
    /// The row exists in a terminal state that cannot be credited (e.g. `Expired`, `Rejected`).
    Refused(PaymentStatusType),
}

/// What a non-crediting write ([`LedgerDatabase::record_for_review`],
/// [`LedgerDatabase::record_rejection`]) found and did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    /// The row was inserted or flipped into the requested state (or was already in it).
    Applied,
    /// The payment was already credited; nothing was changed.
    AlreadyCredited,
    /// The row is in a terminal state that blocks the write; nothing was changed.
    Unchanged(PaymentStatusType),
}

#[derive(Debug, Clone, Error)]
pub enum PaymentGatewayError {
    #[error("Internal database error: {0}")]
    DatabaseError(String),
    #[error("{0}")]
    AccountError(#[from] AccountApiError),
    #[error("The requested account id {0} does not exist")]
    AccountNotFound(i64),
    #[error("No account exists for customer id {0}")]
    AccountNotFoundForCustomer(String),
    #[error("No account exists for email {0}")]
    AccountNotFoundForEmail(String),
    #[error("The requested payment {0} does not exist")]
    PaymentNotFound(PaymentId),
    #[error("A manual credit is only allowed for absent, unverified or expired payments, but this one is {0}")]
    ManualOverrideForbidden(PaymentStatusType),
    #[error("Credit amount is invalid: {0}")]
    AmountInvalid(String),
    #[error("The payment record is incomplete: {0}")]
    RecordIncomplete(String),
    #[error("{0} is not supported")]
    UnsupportedAction(String),
}

impl From<sqlx::Error> for PaymentGatewayError {
    fn from(e: sqlx::Error) -> Self {
        PaymentGatewayError::DatabaseError(e.to_string())
    }
}
