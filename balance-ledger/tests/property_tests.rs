//! Property-based tests for ledger invariants
//!
//! These tests use proptest to verify critical invariants:
//! - Conservation: Σ(net balances) == 0 after any sequence of updates
//! - Single direction: no pair ever holds debts both ways
//! - Order independence of nets: replaying the same debts in any order gives the same nets
//! - Clear gate: only clear participants can be removed

use balance_ledger::{BalanceLedger, BalanceSheet, Config, DirectedDebt, Error, Metrics, ParticipantId};
use proptest::prelude::*;
use rust_decimal::Decimal;

const PARTICIPANTS: [&str; 5] = ["alice", "bob", "carol", "dave", "erin"];

/// Strategy for generating valid amounts (positive decimals)
fn amount_strategy() -> impl Strategy<Value = Decimal> {
    (1u64..1_000_000u64).prop_map(|cents| Decimal::new(cents as i64, 2))
}

/// Strategy for amounts around epsilon, in steps of 0.0005
fn dust_debt_strategy() -> impl Strategy<Value = DirectedDebt> {
    (participant_strategy(), participant_strategy(), 1i64..8)
        .prop_filter("debtor and creditor must differ", |(d, c, _)| d != c)
        .prop_map(|(debtor, creditor, steps)| {
            DirectedDebt::new(debtor, creditor, Decimal::new(steps * 5, 4))
        })
}

/// Strategy for generating participant IDs from a small pool
fn participant_strategy() -> impl Strategy<Value = ParticipantId> {
    (0..PARTICIPANTS.len()).prop_map(|i| ParticipantId::new(PARTICIPANTS[i]))
}

/// Strategy for generating debts between two distinct participants
fn debt_strategy() -> impl Strategy<Value = DirectedDebt> {
    (participant_strategy(), participant_strategy(), amount_strategy())
        .prop_filter("debtor and creditor must differ", |(d, c, _)| d != c)
        .prop_map(|(debtor, creditor, amount)| DirectedDebt::new(debtor, creditor, amount))
}

fn replay(debts: &[DirectedDebt]) -> BalanceLedger {
    let mut ledger = BalanceLedger::new();
    for debt in debts {
        ledger
            .record_debt(&debt.debtor, &debt.creditor, debt.amount)
            .unwrap();
    }
    ledger
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Property: Net balances always sum to zero
    #[test]
    fn prop_conservation(debts in prop::collection::vec(debt_strategy(), 0..40)) {
        let ledger = replay(&debts);
        prop_assert!(ledger.check_conservation());

        let total: Decimal = ledger.snapshot().net_positions().values().copied().sum();
        prop_assert_eq!(total, Decimal::ZERO);
    }

    /// Property: Every pair holds at most one direction, and no stale zeros
    #[test]
    fn prop_single_direction(debts in prop::collection::vec(debt_strategy(), 0..40)) {
        let ledger = replay(&debts);
        let sheet = ledger.snapshot();
        let epsilon = ledger.settings().epsilon;

        prop_assert!(sheet.is_normalized(epsilon));
        for edge in sheet.edges() {
            prop_assert!(edge.amount > epsilon);
            prop_assert_eq!(sheet.amount(&edge.creditor, &edge.debtor), Decimal::ZERO);
        }
    }

    /// Property: Single direction holds for amounts at and around epsilon
    #[test]
    fn prop_single_direction_near_epsilon(
        debts in prop::collection::vec(prop_oneof![dust_debt_strategy(), debt_strategy()], 0..40)
    ) {
        let ledger = replay(&debts);
        let sheet = ledger.snapshot();
        let epsilon = ledger.settings().epsilon;

        prop_assert!(sheet.is_normalized(epsilon));
        for edge in sheet.edges() {
            prop_assert!(edge.amount > epsilon);
            prop_assert_eq!(sheet.amount(&edge.creditor, &edge.debtor), Decimal::ZERO);
        }
    }

    /// Property: Nets depend only on the multiset of debts, not their order
    #[test]
    fn prop_nets_order_independent(debts in prop::collection::vec(debt_strategy(), 0..30)) {
        let forward = replay(&debts);

        let mut reversed_debts = debts.clone();
        reversed_debts.reverse();
        let backward = replay(&reversed_debts);

        let raw = BalanceSheet::from_debts(debts);
        for id in PARTICIPANTS {
            let participant = ParticipantId::new(id);
            let expected = raw.net_balance_of(&participant);
            prop_assert_eq!(forward.net_balance_of(&participant), expected);
            prop_assert_eq!(backward.net_balance_of(&participant), expected);
        }
    }

    /// Property: A settlement of the exact amount owed removes the edge
    #[test]
    fn prop_exact_settlement_clears(amount in amount_strategy()) {
        let (a, b) = (ParticipantId::new("alice"), ParticipantId::new("bob"));
        let mut ledger = BalanceLedger::new();

        ledger.record_debt(&b, &a, amount).unwrap();
        ledger.record_settlement(&b, &a, amount).unwrap();

        prop_assert!(ledger.snapshot().is_empty());
        prop_assert!(ledger.is_clear(&a));
        prop_assert!(ledger.is_clear(&b));
    }

    /// Property: Removal succeeds exactly when the participant is clear
    #[test]
    fn prop_removal_gated_by_clear(
        debts in prop::collection::vec(debt_strategy(), 0..20),
        target in participant_strategy(),
    ) {
        let mut ledger = replay(&debts);
        let was_clear = ledger.is_clear(&target);
        let before = ledger.snapshot();

        match ledger.remove_participant(&target) {
            Ok(()) => {
                prop_assert!(was_clear);
                prop_assert_eq!(ledger.snapshot(), before);
            }
            Err(Error::MembershipConflict(_)) => {
                prop_assert!(!was_clear);
                prop_assert_eq!(ledger.snapshot(), before);
            }
            Err(e) => prop_assert!(false, "unexpected error: {}", e),
        }
    }
}

#[cfg(test)]
mod integration_tests {
    use super::*;
    use balance_ledger::spawn_ledger_actor;

    fn p(id: &str) -> ParticipantId {
        ParticipantId::new(id)
    }

    #[tokio::test]
    async fn test_full_group_lifecycle() {
        let config = Config::default();
        let metrics = Metrics::new().unwrap();
        let handle = spawn_ledger_actor(
            BalanceLedger::with_settings(config.ledger),
            config.actor.mailbox_capacity,
            metrics.clone(),
        );

        // 1. alice pays 300 for three people
        handle
            .record_batch(vec![
                DirectedDebt::new(p("bob"), p("alice"), Decimal::from(100)),
                DirectedDebt::new(p("carol"), p("alice"), Decimal::from(100)),
            ])
            .await
            .unwrap();

        // 2. bob pays 100: alice owes 40, carol owes 60
        handle
            .record_batch(vec![
                DirectedDebt::new(p("alice"), p("bob"), Decimal::from(40)),
                DirectedDebt::new(p("carol"), p("bob"), Decimal::from(60)),
            ])
            .await
            .unwrap();

        assert_eq!(handle.net_balance_of(p("alice")).await.unwrap(), Decimal::from(160));
        assert_eq!(handle.net_balance_of(p("bob")).await.unwrap(), Decimal::ZERO);
        assert_eq!(handle.net_balance_of(p("carol")).await.unwrap(), Decimal::from(-160));

        // 3. bob cannot leave while holding debts both ways
        assert!(handle.remove_participant(p("bob")).await.is_err());

        // 4. Everyone settles up
        handle
            .record_settlement(p("carol"), p("alice"), Decimal::from(100))
            .await
            .unwrap();
        handle
            .record_settlement(p("carol"), p("bob"), Decimal::from(60))
            .await
            .unwrap();
        handle
            .record_settlement(p("bob"), p("alice"), Decimal::from(60))
            .await
            .unwrap();

        assert!(handle.snapshot().await.unwrap().is_empty());
        handle.remove_participant(p("bob")).await.unwrap();

        assert_eq!(metrics.debts_recorded.get(), 4);
        assert_eq!(metrics.settlements_recorded.get(), 3);
        assert_eq!(metrics.open_edges.get(), 0);

        handle.shutdown().await.unwrap();
    }
}
