use actix_web::{guard, http::StatusCode, test::TestRequest, web, web::ServiceConfig};
use vault_common::Credits;
use vault_payment_engine::{
    traits::{CreditOutcome, WriteOutcome},
    ReconciliationApi,
};

use super::{
    helpers::{astrapay_auth, send_request, WEBHOOK_SECRET},
    mocks::{test_account, MockLedgerBackend},
};
use crate::{config::ProviderAuthConfig, middleware::HmacMiddlewareFactory, routes};

const FINISHED_BODY: &str = r#"{
    "payment_id": "ap-900812",
    "order_id": "topup_user42_1700000000000_50",
    "payment_status": "finished",
    "price_amount": 50,
    "price_currency": "usd",
    "actually_paid": 48,
    "customer_email": "u42@example.com"
}"#;

fn signed_request(body: &'static str, auth: &ProviderAuthConfig) -> TestRequest {
    let signature = auth.algorithm.sign(WEBHOOK_SECRET, body.as_bytes());
    TestRequest::post()
        .uri("/webhook/astrapay")
        .insert_header((auth.hmac_header.as_str(), signature))
        .set_payload(body)
}

fn configure(mock: MockLedgerBackend, auth: ProviderAuthConfig) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg| {
        let api = ReconciliationApi::new(mock);
        cfg.app_data(web::Data::new(api)).service(
            web::resource("/webhook/astrapay")
                .guard(guard::Post())
                .wrap(HmacMiddlewareFactory::new(auth))
                .to(routes::astrapay_webhook::<MockLedgerBackend>),
        );
    }
}

#[actix_web::test]
async fn valid_signature_credits_the_payment() {
    let _ = env_logger::try_init().ok();
    let auth = astrapay_auth();
    let mut mock = MockLedgerBackend::new();
    mock.expect_fetch_account_by_customer_id()
        .withf(|customer_id| customer_id == "user42")
        .returning(|_| Ok(Some(test_account("user42", 10))));
    mock.expect_credit_payment()
        .withf(|record, override_expired| {
            record.payment_id.as_str() == "ap-900812" &&
                record.account_id == Some(1) &&
                record.amount == Some(Credits::from(48)) &&
                !*override_expired
        })
        .returning(|_, _| Ok(CreditOutcome::Credited { amount: Credits::from(48), new_balance: Credits::from(58) }));
    let req = signed_request(FINISHED_BODY, &auth);
    let (status, body) = send_request(req, configure(mock, auth)).await.expect("Expected a response");
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Payment credited."), "Unexpected body: {body}");
}

#[actix_web::test]
async fn tampered_body_is_rejected() {
    let auth = astrapay_auth();
    // Signature computed over the real body, sent with a different one.
    let signature = auth.algorithm.sign(WEBHOOK_SECRET, FINISHED_BODY.as_bytes());
    let req = TestRequest::post()
        .uri("/webhook/astrapay")
        .insert_header((auth.hmac_header.as_str(), signature))
        .set_payload(r#"{"payment_id": "ap-900812", "payment_status": "finished", "actually_paid": 9999999}"#);
    let mock = MockLedgerBackend::new();
    let err = send_request(req, configure(mock, auth)).await.expect_err("Expected error");
    assert_eq!(err, "Invalid signature.");
}

#[actix_web::test]
async fn missing_signature_header_is_rejected() {
    let auth = astrapay_auth();
    let req = TestRequest::post().uri("/webhook/astrapay").set_payload(FINISHED_BODY);
    let mock = MockLedgerBackend::new();
    let err = send_request(req, configure(mock, auth)).await.expect_err("Expected error");
    assert_eq!(err, "No signature found.");
}

#[actix_web::test]
async fn disabled_checks_let_unsigned_webhooks_through() {
    let mut auth = astrapay_auth();
    auth.enabled = false;
    let body = r#"{"payment_id": "ap-31", "payment_status": "waiting"}"#;
    let mut mock = MockLedgerBackend::new();
    mock.expect_record_first_seen()
        .withf(|record| record.payment_id.as_str() == "ap-31" && record.account_id.is_none())
        .returning(|_| Ok(true));
    let req = TestRequest::post().uri("/webhook/astrapay").set_payload(body);
    let (status, resp) = send_request(req, configure(mock, auth)).await.expect("Expected a response");
    assert_eq!(status, StatusCode::OK);
    assert!(resp.contains("Notification acknowledged."), "Unexpected body: {resp}");
}

#[actix_web::test]
async fn malformed_json_with_a_valid_signature_is_a_bad_request() {
    let auth = astrapay_auth();
    let req = signed_request("this is not json {", &auth);
    let mock = MockLedgerBackend::new();
    let (status, body) = send_request(req, configure(mock, auth)).await.expect("Expected a response");
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("Payload deserialization error"), "Unexpected body: {body}");
}

#[actix_web::test]
async fn terminal_failure_is_acknowledged_and_recorded() {
    let auth = astrapay_auth();
    let body = r#"{"payment_id": "ap-55", "order_id": "topup_user42_1700000000000_50", "payment_status": "failed"}"#;
    let mut mock = MockLedgerBackend::new();
    mock.expect_fetch_account_by_customer_id()
        .withf(|customer_id| customer_id == "user42")
        .returning(|_| Ok(Some(test_account("user42", 10))));
    mock.expect_record_rejection()
        .withf(|record, reason| {
            record.payment_id.as_str() == "ap-55" && reason.contains("reported the payment as failed")
        })
        .returning(|_, _| Ok(WriteOutcome::Applied));
    let req = signed_request(body, &auth);
    let (status, resp) = send_request(req, configure(mock, auth)).await.expect("Expected a response");
    assert_eq!(status, StatusCode::OK);
    assert!(resp.contains("Payment rejected."), "Unexpected body: {resp}");
}
