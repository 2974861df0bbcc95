//! The behaviour contracts for ledger store backends.
//!
//! The reconciliation engine never talks to a database directly; it is handed a backend that
//! implements [`LedgerDatabase`] (and therefore [`AccountManagement`]). This keeps the crediting
//! state machine testable against any conforming store.
mod account_management;
mod ledger_database;

pub use account_management::{AccountApiError, AccountManagement};
pub use ledger_database::{CreditOutcome, LedgerDatabase, PaymentGatewayError, WriteOutcome};
