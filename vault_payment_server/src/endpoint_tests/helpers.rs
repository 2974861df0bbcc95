use actix_web::{body::MessageBody, http::StatusCode, test, test::TestRequest, web::ServiceConfig, App};
use log::debug;
use vault_common::Secret;
use vault_payment_engine::db_types::Provider;

use crate::{config::ProviderAuthConfig, helpers::HmacAlgorithm};

// Test-only credentials. DO NOT re-use these anywhere.
pub const WEBHOOK_SECRET: &str = "test-webhook-secret-5510";
pub const OPERATOR_API_KEY: &str = "test-operator-key-9021";

pub fn astrapay_auth() -> ProviderAuthConfig {
    ProviderAuthConfig {
        provider: Provider::AstraPay,
        hmac_header: "x-astrapay-sig".into(),
        algorithm: HmacAlgorithm::Sha512Hex,
        secret: Secret::new(WEBHOOK_SECRET.into()),
        enabled: true,
    }
}

/// Builds an app from `configure`, sends the request through it and collects the response.
/// Requests rejected by middleware come back as `Err` with the rejection message.
pub async fn send_request<F>(req: TestRequest, configure: F) -> Result<(StatusCode, String), String>
where F: FnOnce(&mut ServiceConfig) {
    let app = App::new().configure(configure);
    let service = test::init_service(app).await;
    debug!("Making request");
    let (_, res) = test::try_call_service(&service, req.to_request()).await.map_err(|e| e.to_string())?.into_parts();
    let status = res.status();
    let body = String::from_utf8_lossy(&res.into_body().try_into_bytes().unwrap()).into_owned();
    Ok((status, body))
}
