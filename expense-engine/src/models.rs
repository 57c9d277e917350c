//! Domain models: users, groups ids, expense records

use crate::split::{Share, SplitKind};
use balance_ledger::ParticipantId;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Group identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GroupId(Uuid);

impl GroupId {
    /// Fresh time-ordered id
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Underlying UUID
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for GroupId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Registered user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Ledger identity
    pub id: ParticipantId,

    /// Display name
    pub name: String,

    /// Contact email
    pub email: String,
}

impl User {
    /// Create user with a fresh id
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id: ParticipantId::new(Uuid::now_v7().to_string()),
            name: name.into(),
            email: email.into(),
        }
    }
}

/// What a logged transaction was
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TransactionKind {
    /// Shared expense
    Expense {
        /// How the total was split
        split: SplitKind,
    },

    /// Cash settlement
    Settlement,
}

/// Logged expense or settlement
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Expense {
    /// Expense ID (UUIDv7 for ordering)
    pub id: Uuid,

    /// Expense or settlement
    pub kind: TransactionKind,

    /// Free text
    pub description: String,

    /// Total amount
    pub total: Decimal,

    /// Who paid
    pub paid_by: ParticipantId,

    /// Allocated shares; a settlement has the payee as its single share
    pub shares: Vec<Share>,

    /// Owning group, `None` for person-to-person entries
    pub group_id: Option<GroupId>,

    /// Timestamp
    pub created_at: DateTime<Utc>,
}

impl Expense {
    /// Record an allocated expense
    pub fn expense(request: &NewExpense, shares: Vec<Share>, group_id: Option<GroupId>) -> Self {
        Self {
            id: Uuid::now_v7(),
            kind: TransactionKind::Expense {
                split: request.split,
            },
            description: request.description.clone(),
            total: request.total,
            paid_by: request.paid_by.clone(),
            shares,
            group_id,
            created_at: Utc::now(),
        }
    }

    /// Record a settlement from `payer` to `payee`
    pub fn settlement(
        payer: ParticipantId,
        payee: ParticipantId,
        amount: Decimal,
        group_id: Option<GroupId>,
    ) -> Self {
        Self {
            id: Uuid::now_v7(),
            kind: TransactionKind::Settlement,
            description: format!("Settlement {} -> {}", payer, payee),
            total: amount,
            paid_by: payer,
            shares: vec![Share::new(payee, amount)],
            group_id,
            created_at: Utc::now(),
        }
    }

    /// Is settlement?
    pub fn is_settlement(&self) -> bool {
        self.kind == TransactionKind::Settlement
    }
}

/// Request to record an expense
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewExpense {
    /// Free text
    pub description: String,

    /// Total amount
    pub total: Decimal,

    /// Who paid
    pub paid_by: ParticipantId,

    /// Who shares the cost, in allocation order
    pub participants: Vec<ParticipantId>,

    /// Split kind
    pub split: SplitKind,

    /// Amounts (exact) or percentages (percentage); empty for equal
    #[serde(default)]
    pub explicit_shares: Vec<Decimal>,
}

impl NewExpense {
    /// Equal split among `participants`
    pub fn equal(
        description: impl Into<String>,
        total: Decimal,
        paid_by: ParticipantId,
        participants: Vec<ParticipantId>,
    ) -> Self {
        Self {
            description: description.into(),
            total,
            paid_by,
            participants,
            split: SplitKind::Equal,
            explicit_shares: Vec::new(),
        }
    }

    /// Exact amounts per participant
    pub fn exact(
        description: impl Into<String>,
        total: Decimal,
        paid_by: ParticipantId,
        participants: Vec<ParticipantId>,
        amounts: Vec<Decimal>,
    ) -> Self {
        Self {
            split: SplitKind::Exact,
            explicit_shares: amounts,
            ..Self::equal(description, total, paid_by, participants)
        }
    }

    /// Percentages per participant
    pub fn percentage(
        description: impl Into<String>,
        total: Decimal,
        paid_by: ParticipantId,
        participants: Vec<ParticipantId>,
        percentages: Vec<Decimal>,
    ) -> Self {
        Self {
            split: SplitKind::Percentage,
            explicit_shares: percentages,
            ..Self::equal(description, total, paid_by, participants)
        }
    }
}
