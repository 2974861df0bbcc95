use actix_web::{http::StatusCode, test::TestRequest, web, web::ServiceConfig};
use vault_payment_engine::{db_types::PaymentStatusType, AccountApi};

use super::{
    helpers::send_request,
    mocks::{test_account, test_payment_record, MockLedgerBackend},
};
use crate::routes::{BalanceRoute, HistoryForCustomerRoute};

fn configure(mock: MockLedgerBackend) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg| {
        let api = AccountApi::new(mock);
        cfg.app_data(web::Data::new(api))
            .service(BalanceRoute::<MockLedgerBackend>::new())
            .service(HistoryForCustomerRoute::<MockLedgerBackend>::new());
    }
}

#[actix_web::test]
async fn balance_reflects_the_committed_ledger_state() {
    let _ = env_logger::try_init().ok();
    let mut mock = MockLedgerBackend::new();
    mock.expect_fetch_account_by_customer_id()
        .withf(|customer_id| customer_id == "user42")
        .returning(|_| Ok(Some(test_account("user42", 60))));
    let req = TestRequest::get().uri("/balance/user42");
    let (status, body) = send_request(req, configure(mock)).await.expect("Expected a response");
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains(r#""customer_id":"user42""#), "Unexpected body: {body}");
    assert!(body.contains(r#""balance":60"#), "Unexpected body: {body}");
}

#[actix_web::test]
async fn balance_for_an_unknown_customer_is_not_found() {
    let mut mock = MockLedgerBackend::new();
    mock.expect_fetch_account_by_customer_id().returning(|_| Ok(None));
    let req = TestRequest::get().uri("/balance/ghost");
    let (status, body) = send_request(req, configure(mock)).await.expect("Expected a response");
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body.contains("No account for customer ghost"), "Unexpected body: {body}");
}

#[actix_web::test]
async fn history_lists_the_customers_payments() {
    let mut mock = MockLedgerBackend::new();
    mock.expect_fetch_account_by_customer_id()
        .withf(|customer_id| customer_id == "user42")
        .returning(|_| Ok(Some(test_account("user42", 60))));
    mock.expect_fetch_payments_for_account().withf(|account_id| *account_id == 1).returning(|_| {
        Ok(vec![
            test_payment_record("ap-900812", PaymentStatusType::Credited),
            test_payment_record("ap-900790", PaymentStatusType::Expired),
        ])
    });
    let req = TestRequest::get().uri("/history/user42");
    let (status, body) = send_request(req, configure(mock)).await.expect("Expected a response");
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("ap-900812"), "Unexpected body: {body}");
    assert!(body.contains("ap-900790"), "Unexpected body: {body}");
}

#[actix_web::test]
async fn history_for_an_unknown_customer_is_not_found() {
    let mut mock = MockLedgerBackend::new();
    mock.expect_fetch_account_by_customer_id().returning(|_| Ok(None));
    let req = TestRequest::get().uri("/history/ghost");
    let (status, body) = send_request(req, configure(mock)).await.expect("Expected a response");
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body.contains("No account exists for customer id ghost"), "Unexpected body: {body}");
}
