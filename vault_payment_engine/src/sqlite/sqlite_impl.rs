//! `SqliteDatabase` is the concrete ledger store behind the reconciliation engine.
//!
//! Crediting correctness lives here: the unique index on `payments.payment_id` is the only
//! idempotency gate, and the balance update always commits in the same transaction as the status
//! flip. Every transaction issues its write statement first, so concurrent reconciliation
//! attempts serialize on the database's write lock instead of failing on a late lock upgrade.
use std::fmt::Debug;

use chrono::{Duration, Utc};
use log::*;
use sqlx::SqlitePool;
use vault_common::Credits;

use super::db::{db_url, new_pool, payments, user_accounts};
use crate::{
    db_types::{NewPaymentRecord, PaymentId, PaymentRecord, PaymentStatusType, UserAccount},
    traits::{
        AccountApiError,
        AccountManagement,
        CreditOutcome,
        LedgerDatabase,
        PaymentGatewayError,
        WriteOutcome,
    },
};

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({:?})", self.pool)
    }
}

impl AccountManagement for SqliteDatabase {
    async fn fetch_account_by_id(&self, account_id: i64) -> Result<Option<UserAccount>, AccountApiError> {
        let mut conn = self.pool.acquire().await?;
        user_accounts::account_by_id(account_id, &mut conn).await
    }

    async fn fetch_account_by_customer_id(&self, customer_id: &str) -> Result<Option<UserAccount>, AccountApiError> {
        let mut conn = self.pool.acquire().await?;
        user_accounts::account_by_customer_id(customer_id, &mut conn).await
    }

    async fn fetch_account_by_email(&self, email: &str) -> Result<Option<UserAccount>, AccountApiError> {
        let mut conn = self.pool.acquire().await?;
        user_accounts::account_by_email(email, &mut conn).await
    }

    async fn upsert_account(&self, customer_id: &str, email: Option<String>) -> Result<i64, AccountApiError> {
        let mut conn = self.pool.acquire().await?;
        user_accounts::upsert_account(customer_id, email.as_deref(), &mut conn).await
    }

    async fn fetch_payments_for_account(&self, account_id: i64) -> Result<Vec<PaymentRecord>, AccountApiError> {
        let mut conn = self.pool.acquire().await?;
        user_accounts::payments_for_account(account_id, &mut conn).await
    }
}

impl LedgerDatabase for SqliteDatabase {
    fn url(&self) -> &str {
        self.url.as_str()
    }

    /// In a single transaction:
    /// * try to flip an existing creditable row to `Credited` (the UPDATE runs first, taking the
    ///   write lock immediately),
    /// * if nothing flipped and no row exists, insert the row directly as `Credited` (the unique
    ///   index arbitrates any remaining race),
    /// * whenever a row became `Credited` in this call, apply the balance adjustment.
    async fn credit_payment(
        &self,
        record: NewPaymentRecord,
        override_expired: bool,
    ) -> Result<CreditOutcome, PaymentGatewayError> {
        let account_id = record
            .account_id
            .ok_or_else(|| PaymentGatewayError::RecordIncomplete("no account id on a crediting record".into()))?;
        let amount = record
            .amount
            .filter(Credits::is_positive)
            .ok_or_else(|| PaymentGatewayError::RecordIncomplete("no positive amount on a crediting record".into()))?;
        let mut tx = self.pool.begin().await?;
        let flipped = payments::mark_credited(
            &record.payment_id,
            account_id,
            amount,
            record.note.as_deref(),
            override_expired,
            &mut tx,
        )
        .await?;
        let outcome = if flipped.is_some() {
            let account = user_accounts::adjust_balance(account_id, amount, &mut tx).await?;
            CreditOutcome::Credited { amount, new_balance: account.balance }
        } else {
            match payments::fetch_by_payment_id(&record.payment_id, &mut tx).await? {
                Some(existing) if existing.status == PaymentStatusType::Credited => CreditOutcome::AlreadyCredited,
                Some(existing) => CreditOutcome::Refused(existing.status),
                None => match payments::insert_if_absent(&record, PaymentStatusType::Credited, Some(Utc::now()), &mut tx)
                    .await?
                {
                    Some(_) => {
                        let account = user_accounts::adjust_balance(account_id, amount, &mut tx).await?;
                        CreditOutcome::Credited { amount, new_balance: account.balance }
                    },
                    // Unreachable once the write lock is held, but the unique index has the
                    // final say either way.
                    None => CreditOutcome::AlreadyCredited,
                },
            }
        };
        tx.commit().await?;
        if let CreditOutcome::Credited { amount, new_balance } = &outcome {
            debug!("🗃️💰️ Payment {} committed: {amount} credited, balance now {new_balance}", record.payment_id);
        }
        Ok(outcome)
    }

    async fn record_first_seen(&self, record: NewPaymentRecord) -> Result<bool, PaymentGatewayError> {
        let mut conn = self.pool.acquire().await?;
        let inserted = payments::insert_if_absent(&record, PaymentStatusType::Pending, None, &mut conn).await?;
        if inserted.is_some() {
            debug!("🗃️ Payment {} first seen, recorded as Pending", record.payment_id);
        }
        Ok(inserted.is_some())
    }

    async fn record_for_review(&self, record: NewPaymentRecord) -> Result<WriteOutcome, PaymentGatewayError> {
        let mut tx = self.pool.begin().await?;
        let outcome = if payments::mark_for_review(&record.payment_id, &mut tx).await?.is_some() {
            WriteOutcome::Applied
        } else {
            match payments::fetch_by_payment_id(&record.payment_id, &mut tx).await? {
                None => {
                    payments::insert_if_absent(&record, PaymentStatusType::PendingVerification, None, &mut tx).await?;
                    WriteOutcome::Applied
                },
                Some(existing) => match existing.status {
                    PaymentStatusType::PendingVerification => WriteOutcome::Applied,
                    PaymentStatusType::Credited => WriteOutcome::AlreadyCredited,
                    status => WriteOutcome::Unchanged(status),
                },
            }
        };
        tx.commit().await?;
        Ok(outcome)
    }

    async fn record_rejection(
        &self,
        record: NewPaymentRecord,
        reason: &str,
    ) -> Result<WriteOutcome, PaymentGatewayError> {
        let mut record = record;
        record.note = Some(reason.to_string());
        let mut tx = self.pool.begin().await?;
        let outcome = if payments::mark_rejected(&record.payment_id, reason, &mut tx).await?.is_some() {
            WriteOutcome::Applied
        } else {
            match payments::fetch_by_payment_id(&record.payment_id, &mut tx).await? {
                None => {
                    payments::insert_if_absent(&record, PaymentStatusType::Rejected, Some(Utc::now()), &mut tx).await?;
                    WriteOutcome::Applied
                },
                Some(existing) => match existing.status {
                    PaymentStatusType::Rejected => WriteOutcome::Applied,
                    PaymentStatusType::Credited => WriteOutcome::AlreadyCredited,
                    status => WriteOutcome::Unchanged(status),
                },
            }
        };
        tx.commit().await?;
        Ok(outcome)
    }

    async fn fetch_payment_record(&self, id: &PaymentId) -> Result<Option<PaymentRecord>, PaymentGatewayError> {
        let mut conn = self.pool.acquire().await?;
        payments::fetch_by_payment_id(id, &mut conn).await
    }

    async fn expire_old_payments(&self, window: Duration) -> Result<Vec<PaymentRecord>, PaymentGatewayError> {
        let cutoff = Utc::now() - window;
        let mut conn = self.pool.acquire().await?;
        let expired = payments::expire_older_than(cutoff, &mut conn).await?;
        for payment in &expired {
            debug!("🗃️⏰️ Payment {} expired (first seen {})", payment.payment_id, payment.created_at);
        }
        Ok(expired)
    }

    async fn close(&mut self) -> Result<(), PaymentGatewayError> {
        self.pool.close().await;
        Ok(())
    }
}

impl SqliteDatabase {
    /// Creates a new database API object
    pub async fn new(max_connections: u32) -> Result<Self, sqlx::Error> {
        let url = db_url();
        SqliteDatabase::new_with_url(url.as_str(), max_connections).await
    }

    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        trace!("Creating new database connection pool with url {url}");
        let pool = new_pool(url, max_connections).await?;
        let url = url.to_string();
        Ok(Self { url, pool })
    }

    /// Returns a reference to the database connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}
