//! Expense Engine
//!
//! Expense-sharing groups on top of the balance ledger.
//!
//! # Architecture
//!
//! 1. **Split**: A [`SplitStrategy`] turns a total into per-participant shares
//! 2. **Allocate**: The [`ExpenseAllocationAdapter`] books each share as a debt to the payer
//! 3. **Ledger**: Each group's debts live in its own single-writer ledger actor
//! 4. **Simplify**: On request, the group's debts are replaced by the fewest direct payments
//! 5. **Notify**: Every successful change is broadcast as a [`LedgerNotification`]
//!
//! # Example
//!
//! ```no_run
//! use expense_engine::{Config, NewExpense, SplitService};
//! use rust_decimal::Decimal;
//!
//! #[tokio::main]
//! async fn main() -> expense_engine::Result<()> {
//!     let service = SplitService::new(Config::default())?;
//!     let alice = service.create_user("Alice", "alice@example.com").await?;
//!     let bob = service.create_user("Bob", "bob@example.com").await?;
//!
//!     let group = service.create_group("Trip").await;
//!     service.add_group_member(group.id(), &alice.id).await?;
//!     service.add_group_member(group.id(), &bob.id).await?;
//!
//!     let lunch = NewExpense::equal(
//!         "Lunch",
//!         Decimal::from(50),
//!         alice.id.clone(),
//!         vec![alice.id.clone(), bob.id.clone()],
//!     );
//!     service.add_group_expense(group.id(), lunch).await?;
//!
//!     for line in group.describe_balances().await? {
//!         println!("{}", line);
//!     }
//!     Ok(())
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(
    missing_docs,
    rust_2018_idioms,
    missing_debug_implementations,
    clippy::all
)]

pub mod allocation;
pub mod config;
pub mod error;
pub mod group;
pub mod models;
pub mod notification;
pub mod service;
pub mod split;

// Re-exports
pub use allocation::ExpenseAllocationAdapter;
pub use config::{Config, NotificationConfig};
pub use error::{Error, Result};
pub use group::GroupHandle;
pub use models::{Expense, GroupId, NewExpense, TransactionKind, User};
pub use notification::{LedgerNotification, NotificationBus, NotificationKind};
pub use service::SplitService;
pub use split::{EqualSplit, ExactSplit, PercentageSplit, Share, SplitKind, SplitStrategy};
