//! Split service
//!
//! Top-level entry point: user registry, group registry, and a personal
//! ledger for person-to-person expenses that live outside any group.

use crate::{
    allocation::ExpenseAllocationAdapter,
    config::Config,
    group::GroupHandle,
    models::{Expense, GroupId, NewExpense, User},
    notification::{LedgerNotification, NotificationBus, NotificationKind},
    split::validate_amount,
    Error, Result,
};
use balance_ledger::{
    spawn_ledger_actor, BalanceLedger, LedgerHandle, Metrics, ParticipantBalance, ParticipantId,
};
use debt_simplifier::SimplificationReport;
use rust_decimal::Decimal;
use std::collections::{BTreeMap, HashMap};
use tokio::sync::{broadcast, RwLock};

/// Expense-sharing service
#[derive(Debug)]
pub struct SplitService {
    config: Config,
    users: RwLock<BTreeMap<ParticipantId, User>>,
    groups: RwLock<HashMap<GroupId, GroupHandle>>,
    personal: LedgerHandle,
    personal_expenses: RwLock<Vec<Expense>>,
    adapter: ExpenseAllocationAdapter,
    bus: NotificationBus,
    metrics: Metrics,
}

impl SplitService {
    /// Create the service; must run inside a Tokio runtime
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;

        let metrics = Metrics::new().map_err(balance_ledger::Error::from)?;
        let bus = NotificationBus::new(config.notifications.channel_capacity);
        let settings = config.settings();
        let personal = spawn_ledger_actor(
            BalanceLedger::with_settings(settings),
            config.ledger.actor.mailbox_capacity,
            metrics.clone(),
        );

        tracing::info!(service = %config.service_name, "Split service started");

        Ok(Self {
            adapter: ExpenseAllocationAdapter::new(settings),
            config,
            users: RwLock::new(BTreeMap::new()),
            groups: RwLock::new(HashMap::new()),
            personal,
            personal_expenses: RwLock::new(Vec::new()),
            bus,
            metrics,
        })
    }

    /// Active configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Metrics shared by every ledger of this service
    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    /// Subscribe to notifications
    pub fn subscribe(&self) -> broadcast::Receiver<LedgerNotification> {
        self.bus.subscribe()
    }

    /// Register a user
    pub async fn create_user(&self, name: &str, email: &str) -> Result<User> {
        if name.trim().is_empty() {
            return Err(Error::InvalidOperand("User name must not be empty".to_string()));
        }

        let user = User::new(name, email);
        self.users.write().await.insert(user.id.clone(), user.clone());

        tracing::info!(user_id = %user.id, name = %user.name, email = %user.email, "User created");
        Ok(user)
    }

    /// Look up a user
    pub async fn user(&self, id: &ParticipantId) -> Result<User> {
        self.users
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| Error::UserNotFound(id.to_string()))
    }

    /// Create a group with its own ledger
    pub async fn create_group(&self, name: &str) -> GroupHandle {
        let group = GroupHandle::spawn(name, &self.config, self.metrics.clone(), self.bus.clone());
        self.groups.write().await.insert(group.id(), group.clone());
        group
    }

    /// Look up a group
    pub async fn group(&self, id: GroupId) -> Result<GroupHandle> {
        self.groups
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or_else(|| Error::GroupNotFound(id.to_string()))
    }

    /// Add a registered user to a group; `false` if already a member
    pub async fn add_group_member(&self, group_id: GroupId, user_id: &ParticipantId) -> Result<bool> {
        let user = self.user(user_id).await?;
        let group = self.group(group_id).await?;
        Ok(group.add_member(user).await)
    }

    /// Is the user a member of the group?
    pub async fn is_member(&self, group_id: GroupId, user_id: &ParticipantId) -> Result<bool> {
        Ok(self.group(group_id).await?.is_member(user_id).await)
    }

    /// Remove a user from a group if they are clear
    pub async fn remove_group_member(&self, group_id: GroupId, user_id: &ParticipantId) -> Result<User> {
        self.user(user_id).await?;
        self.group(group_id).await?.remove_member(user_id).await
    }

    /// Record a group expense
    pub async fn add_group_expense(&self, group_id: GroupId, request: NewExpense) -> Result<Expense> {
        self.group(group_id).await?.add_expense(request).await
    }

    /// Record a settlement inside a group
    pub async fn settle_in_group(
        &self,
        group_id: GroupId,
        from: &ParticipantId,
        to: &ParticipantId,
        amount: Decimal,
    ) -> Result<Expense> {
        self.group(group_id).await?.settle(from, to, amount).await
    }

    /// Simplify a group's debts
    pub async fn simplify_group(&self, group_id: GroupId) -> Result<SimplificationReport> {
        self.group(group_id).await?.simplify().await
    }

    /// Balances of a group's members
    pub async fn group_balances(&self, group_id: GroupId) -> Result<Vec<ParticipantBalance>> {
        self.group(group_id).await?.balances().await
    }

    /// Record a person-to-person expense outside any group
    pub async fn add_individual_expense(&self, request: NewExpense) -> Result<Expense> {
        self.user(&request.paid_by).await?;
        for participant in &request.participants {
            self.user(participant).await?;
        }

        let shares = request.split.strategy(self.config.settings()).allocate(
            request.total,
            &request.participants,
            &request.explicit_shares,
        )?;
        self.adapter
            .apply(&self.personal, &request.paid_by, &shares)
            .await?;

        let expense = Expense::expense(&request, shares, None);
        self.personal_expenses.write().await.push(expense.clone());

        tracing::info!(
            description = %expense.description,
            total = %expense.total,
            paid_by = %expense.paid_by,
            "Individual expense added"
        );

        self.bus.publish(LedgerNotification::new(
            None,
            NotificationKind::ExpenseRecorded {
                expense_id: expense.id,
                description: expense.description.clone(),
                total: expense.total,
                paid_by: expense.paid_by.clone(),
            },
            request.participants.clone(),
        ));
        Ok(expense)
    }

    /// Record a person-to-person cash payment
    pub async fn settle_individual(
        &self,
        from: &ParticipantId,
        to: &ParticipantId,
        amount: Decimal,
    ) -> Result<Expense> {
        validate_amount(&self.config.settings(), amount, "Settlement amount")?;
        self.user(from).await?;
        self.user(to).await?;

        self.personal
            .record_settlement(from.clone(), to.clone(), amount)
            .await?;

        let record = Expense::settlement(from.clone(), to.clone(), amount, None);
        self.personal_expenses.write().await.push(record.clone());

        tracing::info!(from = %from, to = %to, amount = %amount, "Individual settlement recorded");

        self.bus.publish(LedgerNotification::new(
            None,
            NotificationKind::SettlementRecorded {
                from: from.clone(),
                to: to.clone(),
                amount,
            },
            vec![from.clone(), to.clone()],
        ));
        Ok(record)
    }

    /// A user's person-to-person balance
    pub async fn user_balance(&self, user_id: &ParticipantId) -> Result<ParticipantBalance> {
        self.user(user_id).await?;
        Ok(self.personal.balance_of(user_id.clone()).await?)
    }

    /// Person-to-person expenses and settlements, oldest first
    pub async fn individual_expenses(&self) -> Vec<Expense> {
        self.personal_expenses.read().await.clone()
    }

    /// Stop every ledger actor
    pub async fn shutdown(&self) -> Result<()> {
        for group in self.groups.read().await.values() {
            group.shutdown().await?;
        }
        self.personal.shutdown().await?;

        tracing::info!(service = %self.config.service_name, "Split service stopped");
        Ok(())
    }
}
