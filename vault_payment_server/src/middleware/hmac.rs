//! HMAC middleware for Actix Web.
//!
//! Providers sign the raw bytes of every webhook body with a shared secret and put the encoded
//! signature in a provider-specific header. This middleware verifies that signature *before* the
//! body is parsed, so forged or corrupted notifications never reach the reconciliation engine.
//!
//! The body is consumed for verification and then restored onto the request, so handlers can
//! extract it as usual.

use std::{
    future::{ready, Ready},
    rc::Rc,
};

use actix_http::h1;
use actix_web::{
    dev::{forward_ready, Payload, Service, ServiceRequest, ServiceResponse, Transform},
    error::{ErrorBadRequest, ErrorUnauthorized},
    web,
    Error,
};
use futures::future::LocalBoxFuture;
use log::{trace, warn};

use crate::config::ProviderAuthConfig;

pub struct HmacMiddlewareFactory {
    config: ProviderAuthConfig,
}

impl HmacMiddlewareFactory {
    pub fn new(config: ProviderAuthConfig) -> Self {
        HmacMiddlewareFactory { config }
    }
}

impl<S, B> Transform<S, ServiceRequest> for HmacMiddlewareFactory
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Error = Error;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;
    type InitError = ();
    type Response = ServiceResponse<B>;
    type Transform = HmacMiddlewareService<S>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(HmacMiddlewareService { config: self.config.clone(), service: Rc::new(service) }))
    }
}

pub struct HmacMiddlewareService<S> {
    config: ProviderAuthConfig,
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for HmacMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;
    type Response = ServiceResponse<B>;

    forward_ready!(service);

    fn call(&self, mut req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);
        let config = self.config.clone();
        Box::pin(async move {
            trace!("🔐️ Checking {} signature for request", config.provider);
            if !config.enabled {
                trace!("🔐️ {} signature checks are disabled. Allowing request.", config.provider);
                return service.call(req).await;
            }
            let data = req.extract::<web::Bytes>().await.map_err(|e| {
                warn!("🔐️ Failed to extract request data: {:?}", e);
                ErrorBadRequest("Failed to extract request data.")
            })?;
            let signature = req
                .headers()
                .get(&config.hmac_header)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
                .ok_or_else(|| {
                    warn!("🔐️ No {} signature found in request. Denying access.", config.provider);
                    ErrorUnauthorized("No signature found.")
                })?;
            let validated = config.algorithm.verify(config.secret.reveal(), data.as_ref(), &signature);
            if validated {
                trace!("🔐️ {} signature check for request ✅️", config.provider);
                req.set_payload(bytes_to_payload(data));
                service.call(req).await
            } else {
                warn!("🔐️ Invalid {} signature found in request. Denying access.", config.provider);
                Err(ErrorUnauthorized("Invalid signature."))
            }
        })
    }
}

fn bytes_to_payload(buf: web::Bytes) -> Payload {
    let (_, mut pl) = h1::Payload::create(true);
    pl.unread_data(buf);
    Payload::from(pl)
}
