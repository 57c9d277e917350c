//! Ledger notifications
//!
//! Events emitted after a successful mutation, fanned out to subscribers over
//! a `tokio::sync::broadcast` channel. Publishing never blocks and never
//! fails the operation that produced the event: with no subscribers the
//! event is dropped, and slow subscribers see `RecvError::Lagged`.

use crate::models::GroupId;
use balance_ledger::ParticipantId;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

/// Notification payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NotificationKind {
    /// Expense recorded
    ExpenseRecorded {
        /// Logged expense
        expense_id: Uuid,
        /// Free text
        description: String,
        /// Total amount
        total: Decimal,
        /// Who paid
        paid_by: ParticipantId,
    },

    /// Settlement recorded
    SettlementRecorded {
        /// Payer
        from: ParticipantId,
        /// Payee
        to: ParticipantId,
        /// Amount
        amount: Decimal,
    },

    /// Group debts simplified
    BalancesSimplified {
        /// Edges before
        edges_before: usize,
        /// Edges after
        edges_after: usize,
    },

    /// Member joined a group
    MemberJoined {
        /// New member
        member: ParticipantId,
    },

    /// Member left a group
    MemberLeft {
        /// Departed member
        member: ParticipantId,
    },
}

/// Notification envelope
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerNotification {
    /// Notification ID (UUIDv7 for ordering)
    pub id: Uuid,

    /// Group, `None` for person-to-person activity
    pub group_id: Option<GroupId>,

    /// Payload
    pub kind: NotificationKind,

    /// Users to notify
    pub recipients: Vec<ParticipantId>,

    /// Timestamp
    pub timestamp: DateTime<Utc>,
}

impl LedgerNotification {
    /// Create new notification
    pub fn new(
        group_id: Option<GroupId>,
        kind: NotificationKind,
        recipients: Vec<ParticipantId>,
    ) -> Self {
        Self {
            id: Uuid::now_v7(),
            group_id,
            kind,
            recipients,
            timestamp: Utc::now(),
        }
    }

    /// Is `participant` a recipient?
    pub fn is_for(&self, participant: &ParticipantId) -> bool {
        self.recipients.contains(participant)
    }

    /// Serialize for external consumers
    pub fn to_json(&self) -> crate::Result<String> {
        serde_json::to_string(self)
            .map_err(|e| crate::Error::Other(format!("Failed to serialize notification: {}", e)))
    }
}

/// Broadcast bus for notifications
#[derive(Debug, Clone)]
pub struct NotificationBus {
    sender: broadcast::Sender<LedgerNotification>,
}

impl NotificationBus {
    /// Create bus buffering `capacity` notifications per subscriber
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// New subscriber, seeing notifications published from now on
    pub fn subscribe(&self) -> broadcast::Receiver<LedgerNotification> {
        self.sender.subscribe()
    }

    /// Publish; returns how many subscribers received it
    pub fn publish(&self, notification: LedgerNotification) -> usize {
        tracing::debug!(
            recipients = notification.recipients.len(),
            kind = ?notification.kind,
            "Publishing notification"
        );
        self.sender.send(notification).unwrap_or(0)
    }

    /// Current subscriber count
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}
