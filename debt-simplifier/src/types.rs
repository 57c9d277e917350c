//! Core types for debt simplification

use balance_ledger::{BalanceSheet, DirectedDebt, ParticipantId};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Net position of one participant
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetPosition {
    /// Participant
    pub participant: ParticipantId,

    /// Net position (positive = owed money, negative = owes money)
    pub net: Decimal,
}

impl NetPosition {
    /// Create new position
    pub fn new(participant: ParticipantId, net: Decimal) -> Self {
        Self { participant, net }
    }

    /// Is net payer (owes money)?
    pub fn is_net_payer(&self, epsilon: Decimal) -> bool {
        self.net < -epsilon
    }

    /// Is net receiver (is owed money)?
    pub fn is_net_receiver(&self, epsilon: Decimal) -> bool {
        self.net > epsilon
    }

    /// Absolute net position
    pub fn abs_net_position(&self) -> Decimal {
        self.net.abs()
    }
}

/// One payment in the simplified plan
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transfer {
    /// Pays
    pub from: ParticipantId,

    /// Receives
    pub to: ParticipantId,

    /// Amount
    pub amount: Decimal,
}

impl From<Transfer> for DirectedDebt {
    fn from(transfer: Transfer) -> Self {
        DirectedDebt::new(transfer.from, transfer.to, transfer.amount)
    }
}

impl fmt::Display for Transfer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} pays {} {}", self.from, self.to, self.amount)
    }
}

/// Tie-break used when pairing creditors with debtors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchOrder {
    /// Ascending participant id on both sides
    #[default]
    ById,

    /// Descending magnitude, ties by ascending id
    LargestFirst,
}

impl std::str::FromStr for MatchOrder {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "by_id" | "id" => Ok(MatchOrder::ById),
            "largest_first" | "largest" => Ok(MatchOrder::LargestFirst),
            other => Err(crate::Error::Config(format!("unknown match order: {}", other))),
        }
    }
}

/// Outcome of one simplification pass
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimplificationReport {
    /// Edges on the input sheet
    pub edges_before: usize,

    /// Edges on the simplified sheet
    pub edges_after: usize,

    /// Total amount on the input sheet
    pub gross_before: Decimal,

    /// Total amount on the simplified sheet
    pub gross_after: Decimal,

    /// Payments that settle the group
    pub transfers: Vec<Transfer>,
}

impl SimplificationReport {
    /// Fraction of the gross amount netted away (0.0 - 1.0)
    pub fn efficiency(&self) -> f64 {
        if self.gross_before.is_zero() {
            return 0.0;
        }
        ((self.gross_before - self.gross_after) / self.gross_before)
            .to_f64()
            .unwrap_or(0.0)
    }

    /// Edges removed by the pass
    pub fn edges_removed(&self) -> usize {
        self.edges_before.saturating_sub(self.edges_after)
    }

    /// The transfers as a sheet, ready to install
    pub fn simplified_sheet(&self) -> BalanceSheet {
        BalanceSheet::from_debts(self.transfers.iter().cloned().map(DirectedDebt::from))
    }
}
