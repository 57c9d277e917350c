//! Error types for the expense engine

use thiserror::Error;

/// Result type for expense operations
pub type Result<T> = std::result::Result<T, Error>;

/// Expense engine errors
#[derive(Error, Debug)]
pub enum Error {
    /// Ledger error
    #[error("Ledger error: {0}")]
    Ledger(#[from] balance_ledger::Error),

    /// Simplifier error
    #[error("Simplifier error: {0}")]
    Simplifier(#[from] debt_simplifier::Error),

    /// Shares do not line up with participants or total
    #[error("Allocation mismatch: {0}")]
    AllocationMismatch(String),

    /// Negative share, duplicate or unknown participant, bad amount
    #[error("Invalid operand: {0}")]
    InvalidOperand(String),

    /// Group not found
    #[error("Group not found: {0}")]
    GroupNotFound(String),

    /// User not found
    #[error("User not found: {0}")]
    UserNotFound(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Declined membership change (participant not clear)
    pub fn is_membership_conflict(&self) -> bool {
        matches!(self, Error::Ledger(balance_ledger::Error::MembershipConflict(_)))
    }
}

impl From<String> for Error {
    fn from(msg: String) -> Self {
        Error::Other(msg)
    }
}

impl From<&str> for Error {
    fn from(msg: &str) -> Self {
        Error::Other(msg.to_string())
    }
}
