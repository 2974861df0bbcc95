//! Vault Payment Engine
//!
//! The engine receives payment-completion signals from external payment providers (via webhook,
//! active polling, or an operator override), normalizes them into a canonical event shape, and
//! applies an at-most-once credit to a user's balance and investment ledger.
//!
//! The library is divided into three main sections:
//! 1. Database management and control ([`mod@sqlite`]). The ledger store is SQLite. You should
//!    never need to access the database directly; use the public API instead. The exception is the
//!    data types used in the database, defined in the [`db_types`] module.
//! 2. Provider event normalizers ([`providers`]). Each supported provider has its own adapter that
//!    maps the provider's payload shape into one canonical [`providers::PaymentEvent`].
//! 3. The engine public API ([`mod@api`]). [`ReconciliationApi`] is the single entry point for all
//!    crediting decisions, regardless of where an event came from. Backends implement the traits
//!    in the [`traits`] module.
pub mod db_types;
pub mod helpers;
pub mod providers;
pub mod traits;

pub mod api;
pub mod sqlite;

pub use api::{
    accounts_api::AccountApi,
    reconciliation_api::{ReconciliationApi, ReconciliationResult, RejectionReason, MAX_SINGLE_CREDIT},
};
pub use sqlite::SqliteDatabase;
