mod api_key;
mod hmac;

pub use api_key::{ApiKeyMiddlewareFactory, ApiKeyMiddlewareService};
pub use hmac::{HmacMiddlewareFactory, HmacMiddlewareService};
