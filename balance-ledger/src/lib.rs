//! Group Balance Ledger
//!
//! Pairwise debt ledger for expense-sharing groups. Records who owes whom,
//! nets opposing debts on write, and answers balance queries.
//!
//! # Architecture
//!
//! - **Offset on Write**: A new debt first cancels any debt in the opposite direction
//! - **Single Writer**: One actor task owns each group's ledger
//! - **Snapshots**: Readers get deep copies, never live references
//! - **Guarded Transforms**: Whole-sheet rewrites are accepted only if nets are preserved
//!
//! # Invariants
//!
//! - Single direction: at most one of `(a, b)` and `(b, a)` holds an amount above epsilon
//! - No stale zeros: entries at or below epsilon are removed
//! - Conservation: Σ(net balances) == 0 (within epsilon)
//! - Closure: only `record_debt`, `apply_transform` and clear-gated removal change the sheet

#![forbid(unsafe_code)]
#![warn(
    missing_docs,
    rust_2018_idioms,
    missing_debug_implementations,
    clippy::all
)]

pub mod types;
pub mod ledger;
pub mod error;
pub mod actor;
pub mod config;
pub mod metrics;

// Re-exports
pub use error::{Error, Result};
pub use types::{BalanceSheet, DebtUpdate, DirectedDebt, ParticipantBalance, ParticipantId};
pub use ledger::{BalanceLedger, SheetChange};
pub use actor::{spawn_ledger_actor, LedgerHandle, SheetTransform};
pub use config::{Config, LedgerSettings};
pub use metrics::Metrics;
