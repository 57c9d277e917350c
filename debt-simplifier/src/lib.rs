//! Debt Simplifier
//!
//! Reduces a group's debt graph to an equivalent set of direct payments from
//! net debtors to net creditors.
//!
//! # Netting Algorithm
//!
//! Uses a **greedy two-pointer** match over net positions:
//! - Net balances of every participant are preserved
//! - At most `creditors + debtors - 1` payments remain
//! - Output depends only on net positions, so a second pass changes nothing
//!
//! # Example
//!
//! ```
//! use balance_ledger::{BalanceSheet, DirectedDebt, ParticipantId};
//! use rust_decimal::Decimal;
//!
//! let (a, b, c) = (ParticipantId::new("A"), ParticipantId::new("B"), ParticipantId::new("C"));
//! let sheet = BalanceSheet::from_debts(vec![
//!     DirectedDebt::new(a.clone(), b.clone(), Decimal::from(50)),
//!     DirectedDebt::new(b.clone(), c.clone(), Decimal::from(50)),
//! ]);
//!
//! let simplified = debt_simplifier::simplify(&sheet);
//! assert_eq!(simplified.edge_count(), 1);
//! assert_eq!(simplified.amount(&a, &c), Decimal::from(50));
//! ```

#![forbid(unsafe_code)]
#![warn(
    missing_docs,
    rust_2018_idioms,
    missing_debug_implementations,
    clippy::all
)]

pub mod types;
pub mod netting;
pub mod error;
pub mod config;

// Re-exports
pub use error::{Error, Result};
pub use types::*;
pub use config::Config;
pub use netting::{simplify, DebtSimplifier};
