use actix_web::{http::StatusCode, test::TestRequest, web, web::ServiceConfig};
use moneta_tools::{MonetaApi, MonetaConfig};
use serde_json::json;
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::TcpListener,
};
use vault_common::{Credits, Secret};
use vault_payment_engine::{db_types::PaymentSource, traits::CreditOutcome, ReconciliationApi};

use super::{
    helpers::send_request,
    mocks::{test_account, MockLedgerBackend},
};
use crate::routes::PollMonetaRoute;

/// Serves `response` verbatim to every connection on a random local port and returns the base
/// URL. Enough of an HTTP server for a client that sends one request per connection.
async fn moneta_stub(response: String) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        loop {
            let Ok((mut socket, _)) = listener.accept().await else { break };
            let response = response.clone();
            tokio::spawn(async move {
                let mut buf = [0u8; 4096];
                let _ = socket.read(&mut buf).await;
                let _ = socket.write_all(response.as_bytes()).await;
            });
        }
    });
    format!("http://{addr}")
}

fn http_response(status_line: &str, body: &str) -> String {
    format!(
        "HTTP/1.1 {status_line}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
        body.len()
    )
}

fn moneta_client(api_url: &str) -> MonetaApi {
    let config = MonetaConfig {
        api_url: api_url.to_string(),
        api_key: Secret::new("mnt_test".to_string()),
        timeout: std::time::Duration::from_secs(2),
    };
    MonetaApi::new(config).unwrap()
}

fn configure(mock: MockLedgerBackend, moneta: MonetaApi) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg| {
        let api = ReconciliationApi::new(mock);
        cfg.app_data(web::Data::new(api))
            .app_data(web::Data::new(moneta))
            .service(PollMonetaRoute::<MockLedgerBackend>::new());
    }
}

fn poll_request(order_id: &str, customer_id: &str) -> TestRequest {
    TestRequest::post().uri("/poll").set_json(json!({ "order_id": order_id, "customer_id": customer_id }))
}

#[actix_web::test]
async fn successful_poll_credits_through_the_normal_path() {
    let _ = env_logger::try_init().ok();
    let body = json!({
        "order_id": "topup_user9_1700000000000_30",
        "status": "success",
        "amount": 30,
        "currency": "USD",
        "payer": { "account_id": "user9" }
    })
    .to_string();
    let moneta = moneta_client(&moneta_stub(http_response("200 OK", &body)).await);

    let mut mock = MockLedgerBackend::new();
    mock.expect_fetch_account_by_customer_id()
        .withf(|customer_id| customer_id == "user9")
        .returning(|_| Ok(Some(test_account("user9", 0))));
    mock.expect_credit_payment()
        .withf(|record, override_expired| {
            record.payment_id.as_str() == "topup_user9_1700000000000_30" &&
                record.source == PaymentSource::Poll &&
                record.amount == Some(Credits::from(30)) &&
                !*override_expired
        })
        .returning(|_, _| Ok(CreditOutcome::Credited { amount: Credits::from(30), new_balance: Credits::from(30) }));

    let req = poll_request("topup_user9_1700000000000_30", "user9");
    let (status, body) = send_request(req, configure(mock, moneta)).await.expect("Expected a response");
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains(r#""status":"completed""#), "Unexpected body: {body}");
    assert!(body.contains(r#""new_balance":30"#), "Unexpected body: {body}");
}

#[actix_web::test]
async fn unknown_order_polls_as_pending() {
    let moneta = moneta_client(&moneta_stub(http_response("404 Not Found", "{}")).await);
    let req = poll_request("topup_user9_1700000000000_30", "user9");
    let (status, body) = send_request(req, configure(MockLedgerBackend::new(), moneta)).await.expect("Expected a response");
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains(r#""status":"pending""#), "Unexpected body: {body}");
}

#[actix_web::test]
async fn unreachable_moneta_polls_as_pending_never_an_error() {
    // Port 9 (discard) is not listening; the connection is refused outright.
    let moneta = moneta_client("http://127.0.0.1:9");
    let req = poll_request("topup_user9_1700000000000_30", "user9");
    let (status, body) = send_request(req, configure(MockLedgerBackend::new(), moneta)).await.expect("Expected a response");
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains(r#""status":"pending""#), "Unexpected body: {body}");
}
