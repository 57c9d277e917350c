//! Actor-based concurrency for the ledger
//!
//! This module implements the single-writer pattern using Tokio actors:
//! - One task owns each group's [`BalanceLedger`]; nothing else can touch it
//! - The read-offset-write sequence of `record_debt` never interleaves
//! - Async message passing with backpressure
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │        Group service / split flows (many tasks)       │
//! └─────────────────────┬────────────────────────────────┘
//!                       │
//!                       ▼
//! ┌──────────────────────────────────────────────────────┐
//! │               LedgerHandle (Clone)                    │
//! │         Sends messages to actor mailbox              │
//! └─────────────────────┬────────────────────────────────┘
//!                       │
//!                       │ mpsc::channel (bounded)
//!                       ▼
//! ┌──────────────────────────────────────────────────────┐
//! │              LedgerActor (Single Task)                │
//! │   BalanceLedger: record / query / snapshot / swap     │
//! └──────────────────────────────────────────────────────┘
//! ```

use crate::{
    ledger::{BalanceLedger, SheetChange},
    metrics::Metrics,
    types::{BalanceSheet, DebtUpdate, DirectedDebt, ParticipantBalance, ParticipantId},
    Error, Result,
};
use rust_decimal::Decimal;
use tokio::sync::{mpsc, oneshot};

/// Pure sheet rewrite executed inside the actor
pub type SheetTransform = Box<dyn FnOnce(&BalanceSheet) -> BalanceSheet + Send + 'static>;

/// Message sent to the ledger actor
pub enum LedgerMessage {
    /// Record a single debt
    RecordDebt {
        debt: DirectedDebt,
        response: oneshot::Sender<Result<DebtUpdate>>,
    },

    /// Record a cash settlement
    RecordSettlement {
        payer: ParticipantId,
        payee: ParticipantId,
        amount: Decimal,
        response: oneshot::Sender<Result<DebtUpdate>>,
    },

    /// Record several debts atomically
    RecordBatch {
        debts: Vec<DirectedDebt>,
        response: oneshot::Sender<Result<Vec<DebtUpdate>>>,
    },

    /// Get a participant's balance
    GetBalance {
        participant: ParticipantId,
        response: oneshot::Sender<ParticipantBalance>,
    },

    /// Check whether a participant is clear
    IsClear {
        participant: ParticipantId,
        response: oneshot::Sender<bool>,
    },

    /// Remove a participant if clear
    RemoveParticipant {
        participant: ParticipantId,
        response: oneshot::Sender<Result<()>>,
    },

    /// Deep copy of the sheet
    Snapshot {
        response: oneshot::Sender<BalanceSheet>,
    },

    /// Replace the sheet with a net-preserving rewrite
    Transform {
        transform: SheetTransform,
        response: oneshot::Sender<Result<SheetChange>>,
    },

    /// Shutdown actor
    Shutdown,
}

/// Actor that owns one ledger
pub struct LedgerActor {
    /// The ledger
    ledger: BalanceLedger,

    /// Mailbox for incoming messages
    mailbox: mpsc::Receiver<LedgerMessage>,

    /// Shared metrics
    metrics: Metrics,
}

impl LedgerActor {
    /// Create new actor
    pub fn new(ledger: BalanceLedger, mailbox: mpsc::Receiver<LedgerMessage>, metrics: Metrics) -> Self {
        Self {
            ledger,
            mailbox,
            metrics,
        }
    }

    /// Run the actor event loop
    pub async fn run(mut self) {
        while let Some(msg) = self.mailbox.recv().await {
            if let LedgerMessage::Shutdown = msg {
                tracing::debug!("Ledger actor shutting down");
                break;
            }
            self.handle_message(msg);
        }
    }

    /// Handle a single message
    fn handle_message(&mut self, msg: LedgerMessage) {
        match msg {
            LedgerMessage::RecordDebt { debt, response } => {
                let result = self
                    .ledger
                    .record_debt(&debt.debtor, &debt.creditor, debt.amount);
                match &result {
                    Ok(update) => self.metrics.record_debt(update),
                    Err(_) => self.metrics.record_rejection(),
                }
                self.refresh_edges();
                let _ = response.send(result);
            }

            LedgerMessage::RecordSettlement {
                payer,
                payee,
                amount,
                response,
            } => {
                let result = self.ledger.record_settlement(&payer, &payee, amount);
                match &result {
                    Ok(update) => self.metrics.record_settlement(update),
                    Err(_) => self.metrics.record_rejection(),
                }
                self.refresh_edges();
                let _ = response.send(result);
            }

            LedgerMessage::RecordBatch { debts, response } => {
                let result = self.ledger.record_batch(&debts);
                match &result {
                    Ok(updates) => updates.iter().for_each(|u| self.metrics.record_debt(u)),
                    Err(_) => self.metrics.record_rejection(),
                }
                self.refresh_edges();
                let _ = response.send(result);
            }

            LedgerMessage::GetBalance {
                participant,
                response,
            } => {
                let _ = response.send(self.ledger.balance_of(&participant));
            }

            LedgerMessage::IsClear {
                participant,
                response,
            } => {
                let _ = response.send(self.ledger.is_clear(&participant));
            }

            LedgerMessage::RemoveParticipant {
                participant,
                response,
            } => {
                let result = self.ledger.remove_participant(&participant);
                if result.is_err() {
                    self.metrics.record_rejection();
                }
                self.refresh_edges();
                let _ = response.send(result);
            }

            LedgerMessage::Snapshot { response } => {
                let _ = response.send(self.ledger.snapshot());
            }

            LedgerMessage::Transform {
                transform,
                response,
            } => {
                let result = self.ledger.apply_transform(transform);
                match &result {
                    Ok(_) => self.metrics.record_transform(),
                    Err(e) => {
                        tracing::error!("Sheet transform rejected: {}", e);
                        self.metrics.record_rejection();
                    }
                }
                self.refresh_edges();
                let _ = response.send(result);
            }

            LedgerMessage::Shutdown => {
                // Handled in main loop
            }
        }
    }

    fn refresh_edges(&self) {
        self.metrics.update_open_edges(self.ledger.edge_count());
    }
}

/// Handle for sending messages to the actor
#[derive(Clone, Debug)]
pub struct LedgerHandle {
    sender: mpsc::Sender<LedgerMessage>,
}

impl LedgerHandle {
    /// Create new handle
    pub fn new(sender: mpsc::Sender<LedgerMessage>) -> Self {
        Self { sender }
    }

    /// Send a request and wait for the reply
    async fn request<T>(
        &self,
        build: impl FnOnce(oneshot::Sender<T>) -> LedgerMessage,
    ) -> Result<T> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(build(tx))
            .await
            .map_err(|_| Error::Concurrency("Actor mailbox closed".to_string()))?;

        rx.await
            .map_err(|_| Error::Concurrency("Response channel closed".to_string()))
    }

    /// Record "debtor owes creditor `amount`"
    pub async fn record_debt(
        &self,
        debtor: ParticipantId,
        creditor: ParticipantId,
        amount: Decimal,
    ) -> Result<DebtUpdate> {
        let debt = DirectedDebt::new(debtor, creditor, amount);
        self.request(|response| LedgerMessage::RecordDebt { debt, response })
            .await?
    }

    /// Record a cash payment from `payer` to `payee`
    pub async fn record_settlement(
        &self,
        payer: ParticipantId,
        payee: ParticipantId,
        amount: Decimal,
    ) -> Result<DebtUpdate> {
        self.request(|response| LedgerMessage::RecordSettlement {
            payer,
            payee,
            amount,
            response,
        })
        .await?
    }

    /// Record several debts atomically
    pub async fn record_batch(&self, debts: Vec<DirectedDebt>) -> Result<Vec<DebtUpdate>> {
        self.request(|response| LedgerMessage::RecordBatch { debts, response })
            .await?
    }

    /// Balance summary for one participant
    pub async fn balance_of(&self, participant: ParticipantId) -> Result<ParticipantBalance> {
        self.request(|response| LedgerMessage::GetBalance {
            participant,
            response,
        })
        .await
    }

    /// Owed-to minus owed-by
    pub async fn net_balance_of(&self, participant: ParticipantId) -> Result<Decimal> {
        Ok(self.balance_of(participant).await?.net)
    }

    /// Owes nothing and is owed nothing
    pub async fn is_clear(&self, participant: ParticipantId) -> Result<bool> {
        self.request(|response| LedgerMessage::IsClear {
            participant,
            response,
        })
        .await
    }

    /// Remove a participant if clear
    pub async fn remove_participant(&self, participant: ParticipantId) -> Result<()> {
        self.request(|response| LedgerMessage::RemoveParticipant {
            participant,
            response,
        })
        .await?
    }

    /// Deep copy of the sheet
    pub async fn snapshot(&self) -> Result<BalanceSheet> {
        self.request(|response| LedgerMessage::Snapshot { response })
            .await
    }

    /// Replace the sheet with `transform(sheet)` if nets are preserved
    pub async fn transform(&self, transform: SheetTransform) -> Result<SheetChange> {
        self.request(|response| LedgerMessage::Transform {
            transform,
            response,
        })
        .await?
    }

    /// Shutdown actor
    pub async fn shutdown(&self) -> Result<()> {
        self.sender
            .send(LedgerMessage::Shutdown)
            .await
            .map_err(|_| Error::Concurrency("Actor mailbox closed".to_string()))?;
        Ok(())
    }
}

/// Spawn the ledger actor
pub fn spawn_ledger_actor(
    ledger: BalanceLedger,
    mailbox_capacity: usize,
    metrics: Metrics,
) -> LedgerHandle {
    let (tx, rx) = mpsc::channel(mailbox_capacity.max(1)); // Bounded channel for backpressure
    let actor = LedgerActor::new(ledger, rx, metrics);

    tokio::spawn(async move {
        actor.run().await;
    });

    LedgerHandle::new(tx)
}
