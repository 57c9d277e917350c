//! Expense-sharing group
//!
//! A group pairs a member list with its own ledger actor. Membership is
//! guarded by a `RwLock`:
//!
//! - Expenses and settlements hold a read guard across the ledger call, so a
//!   member cannot leave between the membership check and the debt landing
//! - Member removal and simplification hold the write guard; removal asks the
//!   actor to check-and-remove in one message

use crate::{
    allocation::ExpenseAllocationAdapter,
    config::Config,
    models::{Expense, GroupId, NewExpense, User},
    notification::{LedgerNotification, NotificationBus, NotificationKind},
    split::validate_amount,
    Error, Result,
};
use balance_ledger::{
    spawn_ledger_actor, BalanceLedger, BalanceSheet, LedgerHandle, LedgerSettings, Metrics,
    ParticipantBalance, ParticipantId,
};
use debt_simplifier::{DebtSimplifier, SimplificationReport};
use rust_decimal::Decimal;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Handle to one group; clones share the same state
#[derive(Debug, Clone)]
pub struct GroupHandle {
    id: GroupId,
    name: Arc<str>,
    members: Arc<RwLock<Vec<User>>>,
    expenses: Arc<RwLock<Vec<Expense>>>,
    ledger: LedgerHandle,
    bus: NotificationBus,
    simplifier: DebtSimplifier,
    adapter: ExpenseAllocationAdapter,
    settings: LedgerSettings,
    auto_simplify: bool,
}

impl GroupHandle {
    /// Create a group and spawn its ledger actor
    pub fn spawn(name: impl Into<String>, config: &Config, metrics: Metrics, bus: NotificationBus) -> Self {
        let settings = config.settings();
        let ledger = spawn_ledger_actor(
            BalanceLedger::with_settings(settings),
            config.ledger.actor.mailbox_capacity,
            metrics,
        );

        let group = Self {
            id: GroupId::new(),
            name: Arc::from(name.into()),
            members: Arc::new(RwLock::new(Vec::new())),
            expenses: Arc::new(RwLock::new(Vec::new())),
            ledger,
            bus,
            simplifier: DebtSimplifier::new(config.simplifier),
            adapter: ExpenseAllocationAdapter::new(settings),
            settings,
            auto_simplify: config.auto_simplify,
        };

        tracing::info!(group_id = %group.id, name = %group.name, "Group created");
        group
    }

    /// Group ID
    pub fn id(&self) -> GroupId {
        self.id
    }

    /// Group name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Members in join order
    pub async fn members(&self) -> Vec<User> {
        self.members.read().await.clone()
    }

    /// Is `participant` a member?
    pub async fn is_member(&self, participant: &ParticipantId) -> bool {
        contains(&self.members.read().await, participant)
    }

    /// Add a member; `false` if already present
    pub async fn add_member(&self, user: User) -> bool {
        let mut members = self.members.write().await;
        if contains(&members, &user.id) {
            return false;
        }

        tracing::info!(group_id = %self.id, member = %user.name, "Member joined");
        let member = user.id.clone();
        members.push(user);

        self.notify(
            NotificationKind::MemberJoined { member },
            recipients(&members),
        );
        true
    }

    /// Remove a member who owes nothing and is owed nothing
    ///
    /// A member with open debts is declined with a membership conflict and
    /// stays in the group.
    pub async fn remove_member(&self, participant: &ParticipantId) -> Result<User> {
        let mut members = self.members.write().await;
        let position = members
            .iter()
            .position(|m| &m.id == participant)
            .ok_or_else(|| not_a_member(participant))?;

        if let Err(e) = self.ledger.remove_participant(participant.clone()).await {
            tracing::warn!(
                group_id = %self.id,
                member = %members[position].name,
                "Member cannot leave: {}",
                e
            );
            return Err(e.into());
        }

        let user = members.remove(position);
        tracing::info!(group_id = %self.id, member = %user.name, "Member left");

        let mut notify = recipients(&members);
        notify.push(user.id.clone());
        self.notify(
            NotificationKind::MemberLeft {
                member: user.id.clone(),
            },
            notify,
        );
        Ok(user)
    }

    /// Split an expense among members and book the shares
    pub async fn add_expense(&self, request: NewExpense) -> Result<Expense> {
        let expense = {
            let members = self.members.read().await;
            check_member(&members, &request.paid_by)?;
            for participant in &request.participants {
                check_member(&members, participant)?;
            }

            let shares = request.split.strategy(self.settings).allocate(
                request.total,
                &request.participants,
                &request.explicit_shares,
            )?;
            self.adapter
                .apply(&self.ledger, &request.paid_by, &shares)
                .await?;

            let expense = Expense::expense(&request, shares, Some(self.id));
            self.expenses.write().await.push(expense.clone());

            tracing::info!(
                group_id = %self.id,
                description = %expense.description,
                total = %expense.total,
                paid_by = %display_name(&members, &expense.paid_by),
                "Expense added"
            );

            self.notify(
                NotificationKind::ExpenseRecorded {
                    expense_id: expense.id,
                    description: expense.description.clone(),
                    total: expense.total,
                    paid_by: expense.paid_by.clone(),
                },
                recipients(&members),
            );
            expense
        };

        if self.auto_simplify {
            self.simplify().await?;
        }
        Ok(expense)
    }

    /// Book a cash payment from `from` to `to`
    pub async fn settle(
        &self,
        from: &ParticipantId,
        to: &ParticipantId,
        amount: Decimal,
    ) -> Result<Expense> {
        validate_amount(&self.settings, amount, "Settlement amount")?;

        let members = self.members.read().await;
        check_member(&members, from)?;
        check_member(&members, to)?;

        self.ledger
            .record_settlement(from.clone(), to.clone(), amount)
            .await?;

        let record = Expense::settlement(from.clone(), to.clone(), amount, Some(self.id));
        self.expenses.write().await.push(record.clone());

        tracing::info!(
            group_id = %self.id,
            from = %display_name(&members, from),
            to = %display_name(&members, to),
            amount = %amount,
            "Settlement recorded"
        );

        self.notify(
            NotificationKind::SettlementRecorded {
                from: from.clone(),
                to: to.clone(),
                amount,
            },
            recipients(&members),
        );
        Ok(record)
    }

    /// Replace the group's debts with the simplified equivalent
    pub async fn simplify(&self) -> Result<SimplificationReport> {
        // Exclusive: no expense can land between report and install
        let members = self.members.write().await;

        let report = self
            .simplifier
            .simplify_with_report(&self.ledger.snapshot().await?)?;

        let simplified = report.simplified_sheet();
        self.ledger
            .transform(Box::new(move |_: &BalanceSheet| simplified))
            .await?;

        tracing::info!(
            group_id = %self.id,
            edges_before = report.edges_before,
            edges_after = report.edges_after,
            gross_before = %report.gross_before,
            gross_after = %report.gross_after,
            "Group debts simplified"
        );

        self.notify(
            NotificationKind::BalancesSimplified {
                edges_before: report.edges_before,
                edges_after: report.edges_after,
            },
            recipients(&members),
        );
        Ok(report)
    }

    /// Balance of every member, in join order
    pub async fn balances(&self) -> Result<Vec<ParticipantBalance>> {
        let ids: Vec<ParticipantId> = self.members.read().await.iter().map(|m| m.id.clone()).collect();

        let mut balances = Vec::with_capacity(ids.len());
        for id in ids {
            balances.push(self.ledger.balance_of(id).await?);
        }
        Ok(balances)
    }

    /// Balance of one participant
    pub async fn balance_of(&self, participant: &ParticipantId) -> Result<ParticipantBalance> {
        Ok(self.ledger.balance_of(participant.clone()).await?)
    }

    /// Copy of the group's debts
    pub async fn snapshot(&self) -> Result<BalanceSheet> {
        Ok(self.ledger.snapshot().await?)
    }

    /// "X owes Y amount" lines with member names
    pub async fn describe_balances(&self) -> Result<Vec<String>> {
        let sheet = self.ledger.snapshot().await?;
        let members = self.members.read().await;

        Ok(sheet
            .edges()
            .map(|debt| {
                format!(
                    "{} owes {} {}",
                    display_name(&members, &debt.debtor),
                    display_name(&members, &debt.creditor),
                    debt.amount
                )
            })
            .collect())
    }

    /// Logged expenses and settlements, oldest first
    pub async fn expenses(&self) -> Vec<Expense> {
        self.expenses.read().await.clone()
    }

    /// Stop the group's ledger actor
    pub async fn shutdown(&self) -> Result<()> {
        Ok(self.ledger.shutdown().await?)
    }

    fn notify(&self, kind: NotificationKind, recipients: Vec<ParticipantId>) {
        self.bus
            .publish(LedgerNotification::new(Some(self.id), kind, recipients));
    }
}

fn contains(members: &[User], participant: &ParticipantId) -> bool {
    members.iter().any(|m| &m.id == participant)
}

fn check_member(members: &[User], participant: &ParticipantId) -> Result<()> {
    if contains(members, participant) {
        Ok(())
    } else {
        Err(not_a_member(participant))
    }
}

fn not_a_member(participant: &ParticipantId) -> Error {
    Error::InvalidOperand(format!("{} is not a member of the group", participant))
}

fn recipients(members: &[User]) -> Vec<ParticipantId> {
    members.iter().map(|m| m.id.clone()).collect()
}

fn display_name(members: &[User], participant: &ParticipantId) -> String {
    members
        .iter()
        .find(|m| &m.id == participant)
        .map_or_else(|| participant.to_string(), |m| m.name.clone())
}
