//! Core types for the balance ledger
//!
//! All types are designed for:
//! - Deterministic iteration (ordered maps keyed by participant)
//! - Exact arithmetic (Decimal for money)
//! - Cheap deep copies for snapshots

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Participant identifier (user id, UUID string, etc.)
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParticipantId(String);

impl ParticipantId {
    /// Create new participant ID
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get as string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ParticipantId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// "debtor owes creditor `amount`"
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectedDebt {
    /// Participant who owes
    pub debtor: ParticipantId,

    /// Participant who is owed
    pub creditor: ParticipantId,

    /// Magnitude (positive)
    pub amount: Decimal,
}

impl DirectedDebt {
    /// Create new directed debt
    pub fn new(debtor: ParticipantId, creditor: ParticipantId, amount: Decimal) -> Self {
        Self {
            debtor,
            creditor,
            amount,
        }
    }
}

impl fmt::Display for DirectedDebt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} owes {} {}", self.debtor, self.creditor, self.amount)
    }
}

/// Outcome of a single `record_debt` call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DebtUpdate {
    /// Debtor as requested
    pub debtor: ParticipantId,

    /// Creditor as requested
    pub creditor: ParticipantId,

    /// Amount requested
    pub requested: Decimal,

    /// Portion absorbed by the existing reverse debt
    pub offset: Decimal,

    /// Portion added to the forward debt
    pub added: Decimal,
}

impl DebtUpdate {
    /// True when the whole amount was netted against the reverse debt
    pub fn is_fully_offset(&self) -> bool {
        self.added == Decimal::ZERO
    }
}

/// Per-participant balance summary for reporting
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParticipantBalance {
    /// Participant
    pub participant: ParticipantId,

    /// Sum of what this participant owes others
    pub owed_by: Decimal,

    /// Sum of what others owe this participant
    pub owed_to: Decimal,

    /// `owed_to - owed_by`
    pub net: Decimal,
}

impl ParticipantBalance {
    /// Owes nothing and is owed nothing
    pub fn is_settled(&self) -> bool {
        self.owed_by == Decimal::ZERO && self.owed_to == Decimal::ZERO
    }
}

/// Directed debt graph: debtor -> (creditor -> amount)
///
/// Rows are kept in participant order so every traversal is deterministic.
/// The sheet itself does not enforce normalization; [`crate::BalanceLedger`]
/// does. Raw sheets (e.g. built with [`BalanceSheet::from_debts`]) may hold
/// opposing edges, which is what the simplifier accepts as input.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BalanceSheet {
    rows: BTreeMap<ParticipantId, BTreeMap<ParticipantId, Decimal>>,
}

impl BalanceSheet {
    /// Empty sheet
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a sheet by accumulating raw edges
    pub fn from_debts(debts: impl IntoIterator<Item = DirectedDebt>) -> Self {
        let mut sheet = Self::new();
        for debt in debts {
            sheet.add_edge(&debt.debtor, &debt.creditor, debt.amount);
        }
        sheet
    }

    /// No edges at all
    pub fn is_empty(&self) -> bool {
        self.rows.values().all(|row| row.is_empty())
    }

    /// Number of materialized edges
    pub fn edge_count(&self) -> usize {
        self.rows.values().map(|row| row.len()).sum()
    }

    /// Amount `debtor` owes `creditor` (zero if absent)
    pub fn amount(&self, debtor: &ParticipantId, creditor: &ParticipantId) -> Decimal {
        self.rows
            .get(debtor)
            .and_then(|row| row.get(creditor))
            .copied()
            .unwrap_or(Decimal::ZERO)
    }

    /// All edges rooted at `debtor`
    pub fn row(&self, debtor: &ParticipantId) -> Option<&BTreeMap<ParticipantId, Decimal>> {
        self.rows.get(debtor)
    }

    /// Increment `sheet[debtor][creditor]` without any netting
    pub fn add_edge(&mut self, debtor: &ParticipantId, creditor: &ParticipantId, amount: Decimal) {
        let entry = self
            .rows
            .entry(debtor.clone())
            .or_default()
            .entry(creditor.clone())
            .or_insert(Decimal::ZERO);
        *entry += amount;
    }

    /// Overwrite `sheet[debtor][creditor]`
    pub(crate) fn set_edge(
        &mut self,
        debtor: &ParticipantId,
        creditor: &ParticipantId,
        amount: Decimal,
    ) {
        self.rows
            .entry(debtor.clone())
            .or_default()
            .insert(creditor.clone(), amount);
    }

    /// Drop both directions of a pair if at or below epsilon, then empty rows
    pub(crate) fn prune_pair(&mut self, a: &ParticipantId, b: &ParticipantId, epsilon: Decimal) {
        for (debtor, creditor) in [(a, b), (b, a)] {
            if let Some(row) = self.rows.get_mut(debtor) {
                if row.get(creditor).map_or(false, |amount| amount.abs() <= epsilon) {
                    row.remove(creditor);
                }
                if row.is_empty() {
                    self.rows.remove(debtor);
                }
            }
        }
    }

    /// Drop every entry at or below epsilon and every empty row
    pub fn prune(&mut self, epsilon: Decimal) {
        for row in self.rows.values_mut() {
            row.retain(|_, amount| amount.abs() > epsilon);
        }
        self.rows.retain(|_, row| !row.is_empty());
    }

    /// Remove a participant's row and column
    pub(crate) fn remove_participant(&mut self, participant: &ParticipantId) {
        self.rows.remove(participant);
        for row in self.rows.values_mut() {
            row.remove(participant);
        }
        self.rows.retain(|_, row| !row.is_empty());
    }

    /// Iterate edges in (debtor, creditor) order
    pub fn edges(&self) -> impl Iterator<Item = DirectedDebt> + '_ {
        self.rows.iter().flat_map(|(debtor, row)| {
            row.iter()
                .map(move |(creditor, amount)| DirectedDebt::new(debtor.clone(), creditor.clone(), *amount))
        })
    }

    /// Every participant appearing as debtor or creditor
    pub fn participants(&self) -> BTreeSet<ParticipantId> {
        let mut participants = BTreeSet::new();
        for (debtor, row) in &self.rows {
            participants.insert(debtor.clone());
            participants.extend(row.keys().cloned());
        }
        participants
    }

    /// Sum of `sheet[participant][*]`
    pub fn total_owed_by(&self, participant: &ParticipantId) -> Decimal {
        self.rows
            .get(participant)
            .map(|row| row.values().copied().sum())
            .unwrap_or(Decimal::ZERO)
    }

    /// Sum of `sheet[*][participant]`
    pub fn total_owed_to(&self, participant: &ParticipantId) -> Decimal {
        self.rows
            .values()
            .filter_map(|row| row.get(participant))
            .copied()
            .sum()
    }

    /// Owed-to minus owed-by
    pub fn net_balance_of(&self, participant: &ParticipantId) -> Decimal {
        self.total_owed_to(participant) - self.total_owed_by(participant)
    }

    /// Full balance summary for one participant
    pub fn balance_of(&self, participant: &ParticipantId) -> ParticipantBalance {
        let owed_by = self.total_owed_by(participant);
        let owed_to = self.total_owed_to(participant);
        ParticipantBalance {
            participant: participant.clone(),
            owed_by,
            owed_to,
            net: owed_to - owed_by,
        }
    }

    /// Net position of every participant in a single pass over the edges
    pub fn net_positions(&self) -> BTreeMap<ParticipantId, Decimal> {
        let mut net: BTreeMap<ParticipantId, Decimal> = BTreeMap::new();
        for (debtor, row) in &self.rows {
            for (creditor, amount) in row {
                *net.entry(creditor.clone()).or_insert(Decimal::ZERO) += *amount;
                *net.entry(debtor.clone()).or_insert(Decimal::ZERO) -= *amount;
            }
        }
        net
    }

    /// Sum of all edge magnitudes
    pub fn gross_amount(&self) -> Decimal {
        self.rows.values().flat_map(|row| row.values()).copied().sum()
    }

    /// At most one positive direction per pair and no sub-epsilon entries
    pub fn is_normalized(&self, epsilon: Decimal) -> bool {
        self.edges().all(|debt| {
            debt.amount > epsilon && self.amount(&debt.creditor, &debt.debtor) <= epsilon
        })
    }
}
