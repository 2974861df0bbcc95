use actix_web::{http::StatusCode, test::TestRequest, web, web::ServiceConfig};
use serde_json::json;
use vault_common::{Credits, Secret};
use vault_payment_engine::{
    db_types::{PaymentSource, PaymentStatusType},
    traits::CreditOutcome,
    ReconciliationApi,
};

use super::{
    helpers::{send_request, OPERATOR_API_KEY},
    mocks::{test_account, test_payment_record, MockLedgerBackend},
};
use crate::{
    middleware::ApiKeyMiddlewareFactory,
    routes::{ManualCreditRoute, PaymentByIdRoute},
};

fn configure(mock: MockLedgerBackend) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg| {
        let api = ReconciliationApi::new(mock);
        let operator_scope = web::scope("/operator")
            .wrap(ApiKeyMiddlewareFactory::new(Secret::new(OPERATOR_API_KEY.into())))
            .service(ManualCreditRoute::<MockLedgerBackend>::new())
            .service(PaymentByIdRoute::<MockLedgerBackend>::new());
        cfg.app_data(web::Data::new(api)).service(operator_scope);
    }
}

fn manual_credit_request() -> TestRequest {
    TestRequest::post()
        .uri("/operator/manual_credit")
        .insert_header(("x-vpg-api-key", OPERATOR_API_KEY))
        .set_json(json!({
            "payment_id": "bank-ref-20260815-77",
            "user_email": "user42@example.com",
            "amount": 50,
            "note": "Verified against the provider dashboard"
        }))
}

#[actix_web::test]
async fn operator_can_credit_an_unknown_payment() {
    let _ = env_logger::try_init().ok();
    let mut mock = MockLedgerBackend::new();
    mock.expect_fetch_payment_record()
        .withf(|id| id.as_str() == "bank-ref-20260815-77")
        .returning(|_| Ok(None));
    mock.expect_fetch_account_by_email()
        .withf(|email| email == "user42@example.com")
        .returning(|_| Ok(Some(test_account("user42", 10))));
    mock.expect_credit_payment()
        .withf(|record, override_expired| {
            record.source == PaymentSource::Manual &&
                record.account_id == Some(1) &&
                record.amount == Some(Credits::from(50)) &&
                record.note.as_deref() == Some("Verified against the provider dashboard") &&
                *override_expired
        })
        .returning(|_, _| Ok(CreditOutcome::Credited { amount: Credits::from(50), new_balance: Credits::from(60) }));
    let (status, body) = send_request(manual_credit_request(), configure(mock)).await.expect("Expected a response");
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains(r#""status":"completed""#), "Unexpected body: {body}");
    assert!(body.contains(r#""new_balance":60"#), "Unexpected body: {body}");
}

#[actix_web::test]
async fn override_of_a_credited_payment_conflicts() {
    let mut mock = MockLedgerBackend::new();
    mock.expect_fetch_payment_record()
        .returning(|_| Ok(Some(test_payment_record("bank-ref-20260815-77", PaymentStatusType::Credited))));
    let (status, body) = send_request(manual_credit_request(), configure(mock)).await.expect("Expected a response");
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body.contains("The payment cannot be overridden."), "Unexpected body: {body}");
}

#[actix_web::test]
async fn missing_api_key_is_unauthorized() {
    let req = TestRequest::post().uri("/operator/manual_credit").set_json(json!({
        "payment_id": "p1", "user_email": "a@b.c", "amount": 1
    }));
    let err = send_request(req, configure(MockLedgerBackend::new())).await.expect_err("Expected error");
    assert_eq!(err, "No API key found.");
}

#[actix_web::test]
async fn wrong_api_key_is_forbidden() {
    let req = TestRequest::post()
        .uri("/operator/manual_credit")
        .insert_header(("x-vpg-api-key", "nope"))
        .set_json(json!({ "payment_id": "p1", "user_email": "a@b.c", "amount": 1 }));
    let err = send_request(req, configure(MockLedgerBackend::new())).await.expect_err("Expected error");
    assert_eq!(err, "Invalid API key.");
}

#[actix_web::test]
async fn payment_audit_record_can_be_fetched() {
    let mut mock = MockLedgerBackend::new();
    mock.expect_fetch_payment_record()
        .withf(|id| id.as_str() == "ap-900812")
        .returning(|_| Ok(Some(test_payment_record("ap-900812", PaymentStatusType::Credited))));
    let req = TestRequest::get().uri("/operator/payment/ap-900812").insert_header(("x-vpg-api-key", OPERATOR_API_KEY));
    let (status, body) = send_request(req, configure(mock)).await.expect("Expected a response");
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("ap-900812"), "Unexpected body: {body}");
    assert!(body.contains("Credited"), "Unexpected body: {body}");
}

#[actix_web::test]
async fn unknown_payment_is_not_found() {
    let mut mock = MockLedgerBackend::new();
    mock.expect_fetch_payment_record().returning(|_| Ok(None));
    let req = TestRequest::get().uri("/operator/payment/ghost-1").insert_header(("x-vpg-api-key", OPERATOR_API_KEY));
    let (status, body) = send_request(req, configure(mock)).await.expect("Expected a response");
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body.contains("No payment record for"), "Unexpected body: {body}");
}
