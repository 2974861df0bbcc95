use std::fmt::Debug;

use chrono::Duration;
use log::*;
use vault_common::{Credits, UNIT_OF_ACCOUNT};

use crate::{
    db_types::{NewPaymentRecord, PaymentId, PaymentRecord, PaymentSource, PaymentStatusType},
    providers::{EventStatus, PaymentEvent},
    traits::{CreditOutcome, LedgerDatabase, PaymentGatewayError, WriteOutcome},
};

/// Safety valve against fat-finger and unit-confusion bugs. A single payment above this is parked
/// for operator review instead of being credited.
pub const MAX_SINGLE_CREDIT: Credits = Credits::new(1_000_000);

/// `ReconciliationApi` is the single entry point through which any payment signal, regardless of
/// provider or delivery path, becomes (at most once) a balance credit.
///
/// Webhooks, poll results and operator overrides all funnel through here. The API decides *what*
/// should happen to an event; the [`LedgerDatabase`] backend is responsible for making the credit
/// itself atomic and idempotent.
pub struct ReconciliationApi<B> {
    db: B,
}

impl<B> Debug for ReconciliationApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ReconciliationApi")
    }
}

impl<B> ReconciliationApi<B> {
    pub fn new(db: B) -> Self {
        Self { db }
    }
}

impl<B> ReconciliationApi<B>
where B: LedgerDatabase
{
    /// Reconcile one normalized payment event against the ledger.
    ///
    /// The first sighting of a payment id materializes a `Pending` row so the expiry sweep can
    /// track it; every later non-terminal notification for the same id is a complete no-op, since
    /// providers emit many intermediate notifications per payment. Terminal failures are recorded
    /// as `Rejected` rows so the audit trail survives. Terminal successes go through amount
    /// selection and user resolution before the backend applies the credit.
    pub async fn reconcile(
        &self,
        event: PaymentEvent,
        source: PaymentSource,
    ) -> Result<ReconciliationResult, PaymentGatewayError> {
        match event.status {
            EventStatus::Pending => {
                trace!("🔁️ Non-terminal {} notification for {}", event.provider, event.payment_id);
                // First sighting materializes a Pending row so the expiry sweep can see it.
                // Redeliveries and later intermediate notifications change nothing.
                let record = self.record_from_event(&event, source).await?;
                self.db.record_first_seen(record).await?;
                Ok(ReconciliationResult::Pending)
            },
            EventStatus::Failed => self.reconcile_failure(event, source).await,
            EventStatus::Success => self.reconcile_success(event, source).await,
        }
    }

    async fn reconcile_failure(
        &self,
        event: PaymentEvent,
        source: PaymentSource,
    ) -> Result<ReconciliationResult, PaymentGatewayError> {
        let reason = RejectionReason::ProviderFailure;
        let record = self.record_from_event(&event, source).await?;
        match self.db.record_rejection(record, &reason.to_string()).await? {
            WriteOutcome::AlreadyCredited => {
                // A failure signal after a credit is a provider-side inconsistency worth shouting
                // about, but the credit stands. Money is never clawed back automatically.
                warn!(
                    "🔁️❗️ {} reports payment {} as failed, but it has already been credited. Leaving the credit \
                     intact; investigate with the provider.",
                    event.provider, event.payment_id
                );
                Ok(ReconciliationResult::AlreadyProcessed)
            },
            _ => {
                debug!("🔁️❌️ Payment {} marked as rejected ({reason})", event.payment_id);
                Ok(ReconciliationResult::Rejected(reason))
            },
        }
    }

    async fn reconcile_success(
        &self,
        event: PaymentEvent,
        source: PaymentSource,
    ) -> Result<ReconciliationResult, PaymentGatewayError> {
        let mut record = self.record_from_event(&event, source).await?;

        let amount = match select_amount(&event) {
            Ok(Some(amount)) => amount,
            Ok(None) => {
                // Money really arrived here; rejecting it would strand it forever. A human gets
                // to decide the amount instead.
                info!(
                    "🔁️❓️ Payment {} is a confirmed payment with no derivable amount. Parking it for manual review.",
                    event.payment_id
                );
                return self.park_for_review(record).await;
            },
            Err(reason) => {
                record.amount = event.reported_amount;
                warn!("🔁️❌️ Payment {} rejected: {reason}", event.payment_id);
                return match self.db.record_rejection(record, &reason.to_string()).await? {
                    WriteOutcome::AlreadyCredited => Ok(ReconciliationResult::AlreadyProcessed),
                    _ => Ok(ReconciliationResult::Rejected(reason)),
                };
            },
        };
        record.amount = Some(amount);

        if let Some(currency) = event.currency.as_deref() {
            if !currency.eq_ignore_ascii_case(UNIT_OF_ACCOUNT) {
                // Credited 1:1 anyway. Conversion is a settlement concern; flagging it here keeps
                // the discrepancy visible in the logs without blocking the user's funds.
                warn!(
                    "🔁️⚠️ Payment {} was reported in {currency}, not {UNIT_OF_ACCOUNT}. Crediting {amount} at face \
                     value.",
                    event.payment_id
                );
            }
        }

        if record.account_id.is_none() {
            info!(
                "🔁️❓️ Payment {} is a confirmed payment with no resolvable user. Parking it for manual review.",
                event.payment_id
            );
            return self.park_for_review(record).await;
        }

        match self.db.credit_payment(record, false).await? {
            CreditOutcome::Credited { amount, new_balance } => {
                info!(
                    "🔁️💰️ Payment {} credited. {amount} applied via {source}, new balance is {new_balance}.",
                    event.payment_id
                );
                Ok(ReconciliationResult::Credited { amount, new_balance })
            },
            CreditOutcome::AlreadyCredited => {
                debug!("🔁️🔂️ Payment {} has already been credited. No-op.", event.payment_id);
                Ok(ReconciliationResult::AlreadyProcessed)
            },
            CreditOutcome::Refused(status) => {
                warn!("🔁️🚫️ Payment {} is in state {status} and cannot be credited automatically.", event.payment_id);
                match status {
                    PaymentStatusType::Expired => Ok(ReconciliationResult::Rejected(RejectionReason::Expired)),
                    _ => Ok(ReconciliationResult::AlreadyProcessed),
                }
            },
        }
    }

    /// Parks a confirmed payment in `PendingVerification` for operator follow-up. When the row
    /// is already terminal nothing is parked, and the caller is told what actually stands: an
    /// expired row reports the expiry, any other terminal row reports the payment as settled.
    async fn park_for_review(&self, record: NewPaymentRecord) -> Result<ReconciliationResult, PaymentGatewayError> {
        match self.db.record_for_review(record).await? {
            WriteOutcome::Applied => Ok(ReconciliationResult::PendingManualReview),
            WriteOutcome::AlreadyCredited => Ok(ReconciliationResult::AlreadyProcessed),
            WriteOutcome::Unchanged(PaymentStatusType::Expired) => {
                Ok(ReconciliationResult::Rejected(RejectionReason::Expired))
            },
            WriteOutcome::Unchanged(_) => Ok(ReconciliationResult::AlreadyProcessed),
        }
    }

    /// Credit a payment on an operator's say-so.
    ///
    /// Allowed only when the ledger has no record of the payment id, or holds it in
    /// `PendingVerification` or `Expired`. Every other state conflicts with an automatic decision
    /// that has already been made and returns [`PaymentGatewayError::ManualOverrideForbidden`].
    /// The override is recorded with `source = Manual` and the operator's note for audit.
    pub async fn manual_credit(
        &self,
        payment_id: PaymentId,
        user_email: &str,
        amount: Credits,
        note: Option<String>,
    ) -> Result<ReconciliationResult, PaymentGatewayError> {
        if !amount.is_positive() || amount > MAX_SINGLE_CREDIT {
            return Err(PaymentGatewayError::AmountInvalid(format!(
                "manual credit of {amount} is outside the permitted range"
            )));
        }
        if let Some(existing) = self.db.fetch_payment_record(&payment_id).await? {
            match existing.status {
                PaymentStatusType::PendingVerification | PaymentStatusType::Expired => {
                    info!(
                        "🔧️ Operator override for payment {payment_id} in state {}. Proceeding with credit.",
                        existing.status
                    );
                },
                status => return Err(PaymentGatewayError::ManualOverrideForbidden(status)),
            }
        }
        let account = self
            .db
            .fetch_account_by_email(user_email)
            .await?
            .ok_or_else(|| PaymentGatewayError::AccountNotFoundForEmail(user_email.to_string()))?;
        let mut record = NewPaymentRecord::new(payment_id.clone(), None, PaymentSource::Manual);
        record.account_id = Some(account.id);
        record.amount = Some(amount);
        if let Some(note) = note {
            record = record.with_note(note);
        }
        match self.db.credit_payment(record, true).await? {
            CreditOutcome::Credited { amount, new_balance } => {
                info!("🔧️💰️ Operator credited {amount} for payment {payment_id}. New balance is {new_balance}.");
                Ok(ReconciliationResult::Credited { amount, new_balance })
            },
            CreditOutcome::AlreadyCredited => Ok(ReconciliationResult::AlreadyProcessed),
            // A concurrent writer moved the row into a terminal state between our pre-check and
            // the credit transaction. Surface it as the same conflict the pre-check would have.
            CreditOutcome::Refused(status) => Err(PaymentGatewayError::ManualOverrideForbidden(status)),
        }
    }

    /// Sweep `Pending`/`PendingVerification` rows older than `window` into `Expired`.
    pub async fn expire_old_payments(&self, window: Duration) -> Result<Vec<PaymentRecord>, PaymentGatewayError> {
        let expired = self.db.expire_old_payments(window).await?;
        if !expired.is_empty() {
            info!("🔁️⏰️ {} payment(s) expired after exceeding the {window} pending window", expired.len());
        }
        Ok(expired)
    }

    /// Fetch the full audit record for a payment id.
    pub async fn payment_record(&self, id: &PaymentId) -> Result<Option<PaymentRecord>, PaymentGatewayError> {
        self.db.fetch_payment_record(id).await
    }

    /// Resolve the target account for an event. The customer id is authoritative; email is the
    /// fallback. `None` means the caller must park the payment for manual review rather than
    /// guess.
    async fn record_from_event(
        &self,
        event: &PaymentEvent,
        source: PaymentSource,
    ) -> Result<NewPaymentRecord, PaymentGatewayError> {
        let mut account_id = None;
        if let Some(customer_id) = event.customer_id.as_deref() {
            account_id = self.db.fetch_account_by_customer_id(customer_id).await?.map(|a| a.id);
            if account_id.is_none() {
                debug!("🔁️ Customer id {customer_id} from payment {} has no account", event.payment_id);
            }
        }
        if account_id.is_none() {
            if let Some(email) = event.email.as_deref() {
                account_id = self.db.fetch_account_by_email(email).await?.map(|a| a.id);
            }
        }
        let mut record = NewPaymentRecord::new(event.payment_id.clone(), Some(event.provider), source);
        record.account_id = account_id;
        record.requested_amount = event.requested_amount;
        record.currency = event.currency.clone();
        record.raw_payload = event.raw.to_string();
        Ok(record)
    }
}

/// Choose the amount to credit for a confirmed payment.
///
/// When the provider reports a received amount that differs from what the user requested, the
/// *smaller* of the two wins. Underpayments credit what actually arrived; overpayments credit
/// what was asked for, with the surplus left to the (out-of-scope) refund process.
///
/// `Ok(None)` means no amount could be derived at all. The caller must escalate that to manual
/// review, not reject it: the provider confirmed real money. `Err` is reserved for amounts that
/// are present but unacceptable (non-positive or above the single-payment cap).
fn select_amount(event: &PaymentEvent) -> Result<Option<Credits>, RejectionReason> {
    let amount = match (event.reported_amount, event.requested_amount) {
        (Some(reported), Some(requested)) => {
            if reported != requested {
                warn!(
                    "🔁️⚠️ Payment {} reports {reported} received against {requested} requested. Crediting the \
                     smaller amount.",
                    event.payment_id
                );
            }
            reported.min(requested)
        },
        (Some(reported), None) => reported,
        (None, Some(requested)) => requested,
        (None, None) => return Ok(None),
    };
    if !amount.is_positive() {
        return Err(RejectionReason::AmountInvalid(format!("{amount} is not a positive amount")));
    }
    if amount > MAX_SINGLE_CREDIT {
        return Err(RejectionReason::AmountInvalid(format!("{amount} exceeds the single-payment cap")));
    }
    Ok(Some(amount))
}

/// The outcome of a reconciliation attempt, as reported to the caller. Exactly one of these is
/// produced per event; redeliveries of an already-settled payment always land on
/// [`ReconciliationResult::AlreadyProcessed`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconciliationResult {
    /// The balance was updated in this call.
    Credited { amount: Credits, new_balance: Credits },
    /// This payment id has already been settled. Nothing changed.
    AlreadyProcessed,
    /// The event was non-terminal. Nothing changed.
    Pending,
    /// A confirmed payment that could not be credited automatically was parked for an operator.
    PendingManualReview,
    /// The payment was recorded as rejected and will never credit automatically.
    Rejected(RejectionReason),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RejectionReason {
    /// The amount failed validation (missing, non-positive, or above the cap).
    AmountInvalid(String),
    /// The payment sat pending beyond the expiry window.
    Expired,
    /// The provider reported a terminal failure.
    ProviderFailure,
}

impl std::fmt::Display for RejectionReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RejectionReason::AmountInvalid(msg) => write!(f, "Invalid amount: {msg}"),
            RejectionReason::Expired => write!(f, "Payment expired before a terminal signal arrived"),
            RejectionReason::ProviderFailure => write!(f, "The provider reported the payment as failed"),
        }
    }
}
