//! Unified read API for accounts and their payment history.

use std::fmt::Debug;

use log::trace;

use crate::{
    db_types::{PaymentRecord, UserAccount},
    traits::{AccountApiError, AccountManagement},
};

/// The `AccountApi` provides a unified read API over user accounts.
///
/// Balances always come straight from the committed ledger state. There is no cache in front of
/// this API and there must never be one; the crediting path and this read path see the same rows.
pub struct AccountApi<B> {
    db: B,
}

impl<B: Debug> Debug for AccountApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "AccountApi ({:?})", self.db)
    }
}

impl<B> AccountApi<B>
where B: AccountManagement
{
    pub fn new(db: B) -> Self {
        Self { db }
    }

    /// Fetches the user account for the given account id. If no account exists, `None` is returned.
    pub async fn account_by_id(&self, account_id: i64) -> Result<Option<UserAccount>, AccountApiError> {
        self.db.fetch_account_by_id(account_id).await
    }

    /// Fetches the user account for the given platform customer id.
    pub async fn account_by_customer_id(&self, customer_id: &str) -> Result<Option<UserAccount>, AccountApiError> {
        self.db.fetch_account_by_customer_id(customer_id).await
    }

    /// Fetches the user account for the given email address.
    pub async fn account_by_email(&self, email: &str) -> Result<Option<UserAccount>, AccountApiError> {
        self.db.fetch_account_by_email(email).await
    }

    /// Fetches the payment history for the given customer id, newest first. Returns
    /// `AccountNotFound` if the customer has no account.
    pub async fn payment_history(&self, customer_id: &str) -> Result<Vec<PaymentRecord>, AccountApiError> {
        let account = self
            .db
            .fetch_account_by_customer_id(customer_id)
            .await?
            .ok_or_else(|| AccountApiError::AccountNotFoundForCustomer(customer_id.to_string()))?;
        let payments = self.db.fetch_payments_for_account(account.id).await?;
        trace!("💼️ {} payment records fetched for customer {customer_id}", payments.len());
        Ok(payments)
    }
}
