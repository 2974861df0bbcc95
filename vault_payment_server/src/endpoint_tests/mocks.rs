use chrono::{Duration, Utc};
use mockall::mock;
use vault_common::Credits;
use vault_payment_engine::{
    db_types::{NewPaymentRecord, PaymentId, PaymentRecord, PaymentSource, PaymentStatusType, UserAccount},
    traits::{AccountApiError, AccountManagement, CreditOutcome, LedgerDatabase, PaymentGatewayError, WriteOutcome},
};

mock! {
    pub LedgerBackend {}
    impl Clone for LedgerBackend {
        fn clone(&self) -> Self;
    }
    impl AccountManagement for LedgerBackend {
        async fn fetch_account_by_id(&self, account_id: i64) -> Result<Option<UserAccount>, AccountApiError>;
        async fn fetch_account_by_customer_id(&self, customer_id: &str) -> Result<Option<UserAccount>, AccountApiError>;
        async fn fetch_account_by_email(&self, email: &str) -> Result<Option<UserAccount>, AccountApiError>;
        async fn upsert_account(&self, customer_id: &str, email: Option<String>) -> Result<i64, AccountApiError>;
        async fn fetch_payments_for_account(&self, account_id: i64) -> Result<Vec<PaymentRecord>, AccountApiError>;
    }
    impl LedgerDatabase for LedgerBackend {
        fn url(&self) -> &str;
        async fn credit_payment(&self, record: NewPaymentRecord, override_expired: bool) -> Result<CreditOutcome, PaymentGatewayError>;
        async fn record_first_seen(&self, record: NewPaymentRecord) -> Result<bool, PaymentGatewayError>;
        async fn record_for_review(&self, record: NewPaymentRecord) -> Result<WriteOutcome, PaymentGatewayError>;
        async fn record_rejection(&self, record: NewPaymentRecord, reason: &str) -> Result<WriteOutcome, PaymentGatewayError>;
        async fn fetch_payment_record(&self, id: &PaymentId) -> Result<Option<PaymentRecord>, PaymentGatewayError>;
        async fn expire_old_payments(&self, window: Duration) -> Result<Vec<PaymentRecord>, PaymentGatewayError>;
        async fn close(&mut self) -> Result<(), PaymentGatewayError>;
    }
}

pub fn test_account(customer_id: &str, balance: i64) -> UserAccount {
    UserAccount {
        id: 1,
        customer_id: customer_id.to_string(),
        email: Some(format!("{customer_id}@example.com")),
        balance: Credits::from(balance),
        total_invested: Credits::from(balance),
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

pub fn test_payment_record(payment_id: &str, status: PaymentStatusType) -> PaymentRecord {
    PaymentRecord {
        id: 1,
        payment_id: PaymentId(payment_id.to_string()),
        account_id: Some(1),
        amount: Some(Credits::from(50)),
        requested_amount: Some(Credits::from(50)),
        currency: Some("USD".to_string()),
        status,
        source: PaymentSource::Webhook,
        provider: None,
        raw_payload: "{}".to_string(),
        note: None,
        created_at: Utc::now(),
        processed_at: None,
    }
}
