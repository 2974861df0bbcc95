//! API-key middleware for the operator surface.
//!
//! Manual credits and payment audit lookups are operator-only. Callers present the shared key in
//! the `x-vpg-api-key` header. An unset key on the server side refuses everything rather than
//! allowing everything.

use std::{
    future::{ready, Ready},
    rc::Rc,
};

use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    error::{ErrorForbidden, ErrorUnauthorized},
    Error,
};
use futures::future::LocalBoxFuture;
use log::{trace, warn};
use vault_common::Secret;

pub const API_KEY_HEADER: &str = "x-vpg-api-key";

pub struct ApiKeyMiddlewareFactory {
    key: Secret<String>,
}

impl ApiKeyMiddlewareFactory {
    pub fn new(key: Secret<String>) -> Self {
        ApiKeyMiddlewareFactory { key }
    }
}

impl<S, B> Transform<S, ServiceRequest> for ApiKeyMiddlewareFactory
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Error = Error;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;
    type InitError = ();
    type Response = ServiceResponse<B>;
    type Transform = ApiKeyMiddlewareService<S>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(ApiKeyMiddlewareService { key: self.key.clone(), service: Rc::new(service) }))
    }
}

pub struct ApiKeyMiddlewareService<S> {
    key: Secret<String>,
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for ApiKeyMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;
    type Response = ServiceResponse<B>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);
        let key = self.key.clone();
        Box::pin(async move {
            trace!("🔑️ Checking operator API key for request");
            let provided = req.headers().get(API_KEY_HEADER).and_then(|v| v.to_str().ok()).ok_or_else(|| {
                warn!("🔑️ No operator API key found in request. Denying access.");
                ErrorUnauthorized("No API key found.")
            })?;
            if key.reveal().is_empty() || provided != key.reveal() {
                warn!("🔑️ Invalid operator API key in request. Denying access.");
                return Err(ErrorForbidden("Invalid API key."));
            }
            trace!("🔑️ Operator API key check ✅️");
            service.call(req).await
        })
    }
}
