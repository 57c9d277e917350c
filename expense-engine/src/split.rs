//! Split strategies
//!
//! A strategy turns an expense total into per-participant shares that sum
//! exactly to the total at the currency's minor unit.
//!
//! - [`EqualSplit`]: same share for everyone; leftover minor units go to the
//!   first participants in input order
//! - [`ExactSplit`]: caller-supplied amounts, which must add up to the total
//! - [`PercentageSplit`]: caller-supplied percentages summing to 100; rounding
//!   leftovers are handed out like the equal split

use crate::{Error, Result};
use balance_ledger::{LedgerSettings, ParticipantId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// One participant's portion of an expense
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Share {
    /// Participant
    pub participant: ParticipantId,

    /// Amount they are responsible for
    pub amount: Decimal,
}

impl Share {
    /// Create new share
    pub fn new(participant: ParticipantId, amount: Decimal) -> Self {
        Self {
            participant,
            amount,
        }
    }
}

/// Allocates a total across participants
pub trait SplitStrategy: Send + Sync + std::fmt::Debug {
    /// Shares in participant order, summing exactly to `total`
    fn allocate(
        &self,
        total: Decimal,
        participants: &[ParticipantId],
        explicit: &[Decimal],
    ) -> Result<Vec<Share>>;
}

/// Split kind selected by callers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SplitKind {
    /// Same share for everyone
    Equal,

    /// Explicit amounts
    Exact,

    /// Explicit percentages
    Percentage,
}

impl SplitKind {
    /// Strategy implementing this kind
    pub fn strategy(self, settings: LedgerSettings) -> Box<dyn SplitStrategy> {
        match self {
            SplitKind::Equal => Box::new(EqualSplit::new(settings)),
            SplitKind::Exact => Box::new(ExactSplit::new(settings)),
            SplitKind::Percentage => Box::new(PercentageSplit::new(settings)),
        }
    }
}

/// Equal split
#[derive(Debug, Clone, Copy, Default)]
pub struct EqualSplit {
    settings: LedgerSettings,
}

impl EqualSplit {
    /// Create new equal split
    pub fn new(settings: LedgerSettings) -> Self {
        Self { settings }
    }
}

impl SplitStrategy for EqualSplit {
    fn allocate(
        &self,
        total: Decimal,
        participants: &[ParticipantId],
        _explicit: &[Decimal],
    ) -> Result<Vec<Share>> {
        validate_total(&self.settings, total)?;
        validate_participants(participants)?;

        let count = Decimal::from(participants.len());
        let base = self.settings.floor(total / count);
        let weights = vec![Decimal::ONE; participants.len()];

        Ok(with_leftover(
            &self.settings,
            total,
            participants,
            vec![base; participants.len()],
            &weights,
        ))
    }
}

/// Exact split
#[derive(Debug, Clone, Copy, Default)]
pub struct ExactSplit {
    settings: LedgerSettings,
}

impl ExactSplit {
    /// Create new exact split
    pub fn new(settings: LedgerSettings) -> Self {
        Self { settings }
    }
}

impl SplitStrategy for ExactSplit {
    fn allocate(
        &self,
        total: Decimal,
        participants: &[ParticipantId],
        explicit: &[Decimal],
    ) -> Result<Vec<Share>> {
        validate_total(&self.settings, total)?;
        validate_participants(participants)?;
        validate_count(participants, explicit)?;

        for amount in explicit {
            if *amount < Decimal::ZERO {
                return Err(Error::InvalidOperand(format!("Negative share {}", amount)));
            }
            if self.settings.round(*amount) != *amount {
                return Err(Error::InvalidOperand(format!(
                    "Share {} is finer than the minor unit {}",
                    amount,
                    self.settings.minor_unit()
                )));
            }
        }

        let sum: Decimal = explicit.iter().copied().sum();
        if sum != total {
            return Err(Error::AllocationMismatch(format!(
                "Exact shares sum to {} but the total is {}",
                sum, total
            )));
        }

        Ok(participants
            .iter()
            .zip(explicit)
            .map(|(participant, amount)| Share::new(participant.clone(), *amount))
            .collect())
    }
}

/// Percentage split
#[derive(Debug, Clone, Copy, Default)]
pub struct PercentageSplit {
    settings: LedgerSettings,
}

impl PercentageSplit {
    /// Create new percentage split
    pub fn new(settings: LedgerSettings) -> Self {
        Self { settings }
    }
}

impl SplitStrategy for PercentageSplit {
    fn allocate(
        &self,
        total: Decimal,
        participants: &[ParticipantId],
        explicit: &[Decimal],
    ) -> Result<Vec<Share>> {
        validate_total(&self.settings, total)?;
        validate_participants(participants)?;
        validate_count(participants, explicit)?;

        if let Some(negative) = explicit.iter().find(|pct| **pct < Decimal::ZERO) {
            return Err(Error::InvalidOperand(format!("Negative percentage {}", negative)));
        }

        let hundred = Decimal::ONE_HUNDRED;
        let sum: Decimal = explicit.iter().copied().sum();
        if sum != hundred {
            return Err(Error::AllocationMismatch(format!(
                "Percentages sum to {} instead of 100",
                sum
            )));
        }

        let base = explicit
            .iter()
            .map(|pct| self.settings.floor(total * *pct / hundred))
            .collect();

        Ok(with_leftover(&self.settings, total, participants, base, explicit))
    }
}

/// Hand out `total - Σ base` one minor unit at a time to participants with a
/// non-zero weight, in input order
fn with_leftover(
    settings: &LedgerSettings,
    total: Decimal,
    participants: &[ParticipantId],
    mut amounts: Vec<Decimal>,
    weights: &[Decimal],
) -> Vec<Share> {
    let minor = settings.minor_unit();
    let mut leftover = total - amounts.iter().copied().sum::<Decimal>();

    for (amount, weight) in amounts.iter_mut().zip(weights) {
        if leftover < minor {
            break;
        }
        if weight.is_zero() {
            continue;
        }
        *amount += minor;
        leftover -= minor;
    }

    participants
        .iter()
        .zip(amounts)
        .map(|(participant, amount)| Share::new(participant.clone(), amount))
        .collect()
}

fn validate_total(settings: &LedgerSettings, total: Decimal) -> Result<()> {
    validate_amount(settings, total, "Expense total")
}

/// Positive and a whole number of minor units
pub(crate) fn validate_amount(settings: &LedgerSettings, amount: Decimal, label: &str) -> Result<()> {
    if amount <= Decimal::ZERO {
        return Err(Error::InvalidOperand(format!(
            "{} must be positive, got {}",
            label, amount
        )));
    }
    if settings.round(amount) != amount {
        return Err(Error::InvalidOperand(format!(
            "{} {} is finer than the minor unit {}",
            label,
            amount,
            settings.minor_unit()
        )));
    }
    Ok(())
}

fn validate_participants(participants: &[ParticipantId]) -> Result<()> {
    if participants.is_empty() {
        return Err(Error::InvalidOperand("No participants".to_string()));
    }

    let mut seen = BTreeSet::new();
    for participant in participants {
        if !seen.insert(participant) {
            return Err(Error::InvalidOperand(format!(
                "Duplicate participant {}",
                participant
            )));
        }
    }
    Ok(())
}

fn validate_count(participants: &[ParticipantId], explicit: &[Decimal]) -> Result<()> {
    if participants.len() != explicit.len() {
        return Err(Error::AllocationMismatch(format!(
            "{} participants but {} shares",
            participants.len(),
            explicit.len()
        )));
    }
    Ok(())
}
