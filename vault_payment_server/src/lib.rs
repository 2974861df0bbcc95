//! # Vault payment server
//!
//! The HTTP surface of the payment reconciliation engine. It is responsible for:
//! * receiving signed provider webhooks, verifying their HMAC signatures over the raw body, and
//!   feeding them through the reconciliation engine,
//! * exposing an on-demand poll trigger for providers with unreliable webhooks,
//! * the operator surface: manual credit overrides and payment audit lookups,
//! * read endpoints for balances and payment history,
//! * the background worker that expires stale pending payments.
//!
//! ## Configuration
//! The server is configured via environment variables. See [config](config/index.html) for more
//! information.
pub mod config;
pub mod data_objects;
pub mod errors;
pub mod expiry_worker;
pub mod helpers;
pub mod integrations;
pub mod middleware;
pub mod routes;
pub mod server;

#[cfg(test)]
mod endpoint_tests;
