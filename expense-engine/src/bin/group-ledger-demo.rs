//! Group ledger demo binary
//!
//! Runs a hostel-expenses walkthrough: equal and exact splits, debt
//! simplification, a person-to-person expense, and a member who can only
//! leave once settled up.

use expense_engine::{Config, GroupHandle, NewExpense, SplitService};
use rust_decimal::Decimal;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    tracing::info!("Starting group ledger demo");

    let config = match std::env::args().nth(1) {
        Some(path) => Config::from_file(path)?,
        None => Config::from_env()?,
    };
    let service = SplitService::new(config)?;

    // Log every notification as it goes out
    let mut notifications = service.subscribe();
    let listener = tokio::spawn(async move {
        while let Ok(notification) = notifications.recv().await {
            tracing::debug!(
                recipients = notification.recipients.len(),
                "Notification: {:?}",
                notification.kind
            );
        }
    });

    let aditya = service.create_user("Aditya", "aditya@example.com").await?;
    let rohit = service.create_user("Rohit", "rohit@example.com").await?;
    let manish = service.create_user("Manish", "manish@example.com").await?;
    let saurav = service.create_user("Saurav", "saurav@example.com").await?;

    let hostel = service.create_group("Hostel Expenses").await;
    for user in [&aditya, &rohit, &manish, &saurav] {
        service.add_group_member(hostel.id(), &user.id).await?;
    }

    service
        .add_group_expense(
            hostel.id(),
            NewExpense::equal(
                "Lunch",
                Decimal::from(800),
                aditya.id.clone(),
                vec![
                    aditya.id.clone(),
                    rohit.id.clone(),
                    manish.id.clone(),
                    saurav.id.clone(),
                ],
            ),
        )
        .await?;

    service
        .add_group_expense(
            hostel.id(),
            NewExpense::exact(
                "Dinner",
                Decimal::from(700),
                manish.id.clone(),
                vec![aditya.id.clone(), manish.id.clone(), saurav.id.clone()],
                vec![Decimal::from(200), Decimal::from(300), Decimal::from(200)],
            ),
        )
        .await?;

    log_balances(&hostel, "Group balances").await?;

    let report = service.simplify_group(hostel.id()).await?;
    tracing::info!(
        edges_before = report.edges_before,
        edges_after = report.edges_after,
        efficiency = report.efficiency(),
        "Simplification done"
    );
    log_balances(&hostel, "Group balances after simplification").await?;

    service
        .add_individual_expense(NewExpense::equal(
            "Coffee",
            Decimal::from(40),
            rohit.id.clone(),
            vec![rohit.id.clone(), saurav.id.clone()],
        ))
        .await?;

    for user in [&aditya, &rohit, &manish, &saurav] {
        let balance = service.user_balance(&user.id).await?;
        tracing::info!(
            user = %user.name,
            owes = %balance.owed_by,
            is_owed = %balance.owed_to,
            "Individual balance"
        );
    }

    match service.remove_group_member(hostel.id(), &rohit.id).await {
        Ok(_) => tracing::info!("Rohit left the group"),
        Err(e) if e.is_membership_conflict() => {
            tracing::info!("Rohit cannot leave yet: {}", e)
        }
        Err(e) => return Err(e.into()),
    }

    let sheet = hostel.snapshot().await?;
    let creditors: Vec<_> = sheet
        .row(&rohit.id)
        .map(|row| row.iter().map(|(to, amount)| (to.clone(), *amount)).collect())
        .unwrap_or_default();
    for (creditor, amount) in creditors {
        service
            .settle_in_group(hostel.id(), &rohit.id, &creditor, amount)
            .await?;
    }

    service.remove_group_member(hostel.id(), &rohit.id).await?;
    tracing::info!("Rohit left the group");

    log_balances(&hostel, "Updated group balances").await?;

    tracing::info!(
        debts = service.metrics().debts_recorded.get(),
        settlements = service.metrics().settlements_recorded.get(),
        offsets = service.metrics().offsets.get(),
        "Ledger activity"
    );

    service.shutdown().await?;
    listener.abort();

    tracing::info!("Demo finished");
    Ok(())
}

async fn log_balances(group: &GroupHandle, title: &str) -> anyhow::Result<()> {
    tracing::info!("{} ({})", title, group.name());

    let lines = group.describe_balances().await?;
    if lines.is_empty() {
        tracing::info!("  everyone is settled up");
    }
    for line in lines {
        tracing::info!("  {}", line);
    }
    Ok(())
}
