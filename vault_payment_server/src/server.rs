use std::time::Duration;

use actix_web::{dev::Server, guard, http::KeepAlive, middleware::Logger, web, App, HttpServer};
use log::info;
use moneta_tools::MonetaApi;
use vault_payment_engine::{AccountApi, ReconciliationApi, SqliteDatabase};

use crate::{
    config::ServerConfig,
    errors::ServerError,
    expiry_worker::start_expiry_worker,
    middleware::{ApiKeyMiddlewareFactory, HmacMiddlewareFactory},
    routes::{
        self,
        health,
        BalanceRoute,
        HistoryForCustomerRoute,
        ManualCreditRoute,
        PaymentByIdRoute,
        PollMonetaRoute,
    },
};

pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    config.assert_production_ready()?;
    let db = SqliteDatabase::new_with_url(&config.database_url, 25)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let _expiry_handle = start_expiry_worker(db.clone(), config.expiry_window);
    let srv = create_server_instance(config, db)?;
    srv.await.map_err(|e| ServerError::Unspecified(e.to_string()))
}

pub fn create_server_instance(config: ServerConfig, db: SqliteDatabase) -> Result<Server, ServerError> {
    let moneta_api =
        MonetaApi::new(config.moneta_api.clone()).map_err(|e| ServerError::InitializeError(e.to_string()))?;
    info!(
        "🚦️ Signature checks: AstraPay {}, CardLink {}, Moneta {}",
        config.astrapay.enabled, config.cardlink.enabled, config.moneta.enabled
    );
    let (host, port) = (config.host.clone(), config.port);
    let srv = HttpServer::new(move || {
        let reconciliation_api = ReconciliationApi::new(db.clone());
        let accounts_api = AccountApi::new(db.clone());
        let app = App::new()
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("vps::access_log"))
            .app_data(web::Data::new(reconciliation_api))
            .app_data(web::Data::new(accounts_api))
            .app_data(web::Data::new(moneta_api.clone()));
        // Each provider's webhook resource carries its own signature middleware, verifying the
        // raw body before any parsing happens.
        let webhook_scope = web::scope("/webhook")
            .service(
                web::resource("/astrapay")
                    .guard(guard::Post())
                    .wrap(HmacMiddlewareFactory::new(config.astrapay.clone()))
                    .to(routes::astrapay_webhook::<SqliteDatabase>),
            )
            .service(
                web::resource("/cardlink")
                    .guard(guard::Post())
                    .wrap(HmacMiddlewareFactory::new(config.cardlink.clone()))
                    .to(routes::cardlink_webhook::<SqliteDatabase>),
            )
            .service(
                web::resource("/moneta")
                    .guard(guard::Post())
                    .wrap(HmacMiddlewareFactory::new(config.moneta.clone()))
                    .to(routes::moneta_webhook::<SqliteDatabase>),
            );
        let api_scope = web::scope("/api")
            .service(PollMonetaRoute::<SqliteDatabase>::new())
            .service(BalanceRoute::<SqliteDatabase>::new())
            .service(HistoryForCustomerRoute::<SqliteDatabase>::new());
        let operator_scope = web::scope("/operator")
            .wrap(ApiKeyMiddlewareFactory::new(config.operator_api_key.clone()))
            .service(ManualCreditRoute::<SqliteDatabase>::new())
            .service(PaymentByIdRoute::<SqliteDatabase>::new());
        app.service(health).service(webhook_scope).service(api_scope).service(operator_scope)
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind((host.as_str(), port))?
    .run();
    Ok(srv)
}
