//! The high-level engine APIs that the server crate drives.
//!
//! [`reconciliation_api::ReconciliationApi`] owns the crediting state machine;
//! [`accounts_api::AccountApi`] is the read surface over accounts and their payment history.
pub mod accounts_api;
pub mod reconciliation_api;
