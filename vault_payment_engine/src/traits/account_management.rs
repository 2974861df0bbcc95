use thiserror::Error;

use crate::db_types::{PaymentRecord, UserAccount};

/// Read (and minimal write) access to user accounts. The balance returned here must always
/// reflect the store's committed state, never a cached or optimistic value.
#[allow(async_fn_in_trait)]
pub trait AccountManagement {
    async fn fetch_account_by_id(&self, account_id: i64) -> Result<Option<UserAccount>, AccountApiError>;

    async fn fetch_account_by_customer_id(&self, customer_id: &str) -> Result<Option<UserAccount>, AccountApiError>;

    async fn fetch_account_by_email(&self, email: &str) -> Result<Option<UserAccount>, AccountApiError>;

    /// Creates the account for a platform user if it does not exist yet, returning its internal
    /// id. Used by the (out-of-scope) signup flow and by tests to seed fixtures.
    async fn upsert_account(&self, customer_id: &str, email: Option<String>) -> Result<i64, AccountApiError>;

    /// All payment records for an account, newest first. Operator/audit surface.
    async fn fetch_payments_for_account(&self, account_id: i64) -> Result<Vec<PaymentRecord>, AccountApiError>;
}

#[derive(Debug, Clone, Error)]
pub enum AccountApiError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("The requested account id {0} does not exist")]
    AccountNotFound(i64),
    #[error("No account exists for customer id {0}")]
    AccountNotFoundForCustomer(String),
}

impl From<sqlx::Error> for AccountApiError {
    fn from(e: sqlx::Error) -> Self {
        AccountApiError::DatabaseError(e.to_string())
    }
}
