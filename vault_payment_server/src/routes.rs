//! Request handler definitions
//!
//! Define each route and its handler here.
//! Handlers that are more than a line or two MUST go into a separate module. Keep this module neat and tidy 🙏
//!
//! Webhook handlers are registered manually in [`crate::server`], because each one carries its
//! own HMAC middleware instance; everything else uses the `route!` macro.
use actix_web::{get, web, HttpResponse, Responder};
use log::*;
use serde_json::Value;
use vault_payment_engine::{
    db_types::{PaymentId, PaymentSource, Provider},
    providers::normalize,
    traits::{AccountManagement, LedgerDatabase},
    AccountApi,
    ReconciliationApi,
    ReconciliationResult,
};

use crate::{
    data_objects::{BalanceResponse, JsonResponse, ManualCreditRequest, PollRequest, ReconciliationResponse},
    errors::ServerError,
    integrations,
};

// Web-actix cannot handle generics in handlers, so it's implemented manually using the `route!` macro
#[macro_export]
macro_rules! route {
    ($name:ident => $method:ident $path:literal impl $($bounds:ty),+) => {
        paste::paste! { pub struct [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ >( $( core::marker::PhantomData<fn() -> [< T $bounds:camel> ] >,)+ );}
        paste::paste! { impl< $( [< T $bounds:camel> ],)+ > [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ > {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self($( core::marker::PhantomData::<fn() -> [< T $bounds:camel> ] >,)+)
            }
        }}
        paste::paste! { impl<$( [< T $bounds:camel >] , )+> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<$([<T $bounds:camel>],)+>
        where
            $([<T $bounds:camel>]: $bounds + 'static,)+
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::< $( [< T $bounds:camel >], )+>);
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };
}

#[get("/health")]
pub async fn health() -> impl Responder {
    trace!("💻️ Received health check request");
    HttpResponse::Ok().body("👍️\n")
}

//----------------------------------------------  Webhooks  ----------------------------------------------------
// The HMAC middleware has already verified the signature over these raw bytes by the time any of
// these handlers run.

pub async fn astrapay_webhook<B: LedgerDatabase>(
    body: web::Bytes,
    api: web::Data<ReconciliationApi<B>>,
) -> Result<HttpResponse, ServerError> {
    handle_webhook(Provider::AstraPay, &body, api.as_ref()).await
}

pub async fn cardlink_webhook<B: LedgerDatabase>(
    body: web::Bytes,
    api: web::Data<ReconciliationApi<B>>,
) -> Result<HttpResponse, ServerError> {
    handle_webhook(Provider::CardLink, &body, api.as_ref()).await
}

pub async fn moneta_webhook<B: LedgerDatabase>(
    body: web::Bytes,
    api: web::Data<ReconciliationApi<B>>,
) -> Result<HttpResponse, ServerError> {
    handle_webhook(Provider::Moneta, &body, api.as_ref()).await
}

/// Providers retry aggressively on non-2xx responses, so every recognized notification answers
/// 200, whether it credited, was a redelivery, or was non-actionable. Only malformed payloads
/// and backend failures escape as error statuses; a retry is exactly what we want for those.
async fn handle_webhook<B: LedgerDatabase>(
    provider: Provider,
    body: &web::Bytes,
    api: &ReconciliationApi<B>,
) -> Result<HttpResponse, ServerError> {
    trace!("📬️ Received {provider} webhook");
    let raw = serde_json::from_slice::<Value>(body).map_err(|e| {
        warn!("📬️ Could not parse {provider} webhook body as JSON. {e}");
        ServerError::CouldNotDeserializePayload
    })?;
    let event = normalize(provider, &raw).map_err(|e| {
        warn!("📬️ Could not normalize {provider} webhook. {e}");
        ServerError::InvalidRequestBody(e.to_string())
    })?;
    let payment_id = event.payment_id.clone();
    let result = api.reconcile(event, PaymentSource::Webhook).await?;
    let response = match result {
        ReconciliationResult::Credited { amount, new_balance } => {
            info!("📬️ {provider} payment {payment_id} credited {amount}. New balance {new_balance}.");
            JsonResponse::success("Payment credited.")
        },
        ReconciliationResult::AlreadyProcessed => JsonResponse::success("Payment already processed."),
        ReconciliationResult::Pending => JsonResponse::success("Notification acknowledged."),
        ReconciliationResult::PendingManualReview => JsonResponse::success("Payment queued for verification."),
        ReconciliationResult::Rejected(reason) => {
            info!("📬️ {provider} payment {payment_id} rejected. {reason}");
            JsonResponse::success("Payment rejected.")
        },
    };
    Ok(HttpResponse::Ok().json(response))
}

//----------------------------------------------  Polling  ----------------------------------------------------
route!(poll_moneta => Post "/poll" impl LedgerDatabase);
pub async fn poll_moneta<B: LedgerDatabase>(
    body: web::Json<PollRequest>,
    api: web::Data<ReconciliationApi<B>>,
    moneta: web::Data<moneta_tools::MonetaApi>,
) -> Result<HttpResponse, ServerError> {
    let PollRequest { order_id, customer_id } = body.into_inner();
    debug!("💻️ POST poll for order {order_id} (customer {customer_id})");
    let result = integrations::moneta::poll_once(&order_id, &customer_id, moneta.as_ref(), api.as_ref()).await?;
    Ok(HttpResponse::Ok().json(ReconciliationResponse::from(result)))
}

//----------------------------------------------  Accounts  ----------------------------------------------------
route!(balance => Get "/balance/{customer_id}" impl AccountManagement);
pub async fn balance<B: AccountManagement>(
    path: web::Path<String>,
    api: web::Data<AccountApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let customer_id = path.into_inner();
    debug!("💻️ GET balance for customer {customer_id}");
    let account = api
        .account_by_customer_id(&customer_id)
        .await?
        .ok_or_else(|| ServerError::NoRecordFound(format!("No account for customer {customer_id}")))?;
    Ok(HttpResponse::Ok().json(BalanceResponse::from(account)))
}

route!(history_for_customer => Get "/history/{customer_id}" impl AccountManagement);
pub async fn history_for_customer<B: AccountManagement>(
    path: web::Path<String>,
    api: web::Data<AccountApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let customer_id = path.into_inner();
    debug!("💻️ GET history for customer {customer_id}");
    let history = api.payment_history(&customer_id).await?;
    Ok(HttpResponse::Ok().json(history))
}

//----------------------------------------------  Operator  ----------------------------------------------------
route!(manual_credit => Post "/manual_credit" impl LedgerDatabase);
pub async fn manual_credit<B: LedgerDatabase>(
    body: web::Json<ManualCreditRequest>,
    api: web::Data<ReconciliationApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let request = body.into_inner();
    info!("💻️ POST manual credit of {} for payment {} to {}", request.amount, request.payment_id, request.user_email);
    let result = api
        .manual_credit(PaymentId(request.payment_id), &request.user_email, request.amount, request.note)
        .await?;
    Ok(HttpResponse::Ok().json(ReconciliationResponse::from(result)))
}

route!(payment_by_id => Get "/payment/{payment_id}" impl LedgerDatabase);
pub async fn payment_by_id<B: LedgerDatabase>(
    path: web::Path<String>,
    api: web::Data<ReconciliationApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let payment_id = PaymentId(path.into_inner());
    debug!("💻️ GET payment record for {payment_id}");
    let record = api
        .payment_record(&payment_id)
        .await?
        .ok_or_else(|| ServerError::NoRecordFound(format!("No payment record for {payment_id}")))?;
    Ok(HttpResponse::Ok().json(record))
}
