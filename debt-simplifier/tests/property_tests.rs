//! Property-based tests for simplification invariants
//!
//! - Net preservation: every participant keeps the same net balance
//! - Idempotence: simplifying a simplified sheet changes nothing
//! - Edge bound: at most creditors + debtors - 1 edges remain
//! - Equivalence with the ledger: installing the result through `apply_transform` succeeds

use balance_ledger::{BalanceLedger, BalanceSheet, DirectedDebt, ParticipantId};
use debt_simplifier::{Config, DebtSimplifier, MatchOrder};
use proptest::prelude::*;
use rust_decimal::Decimal;

const PARTICIPANTS: [&str; 6] = ["ann", "ben", "cat", "dan", "eve", "fay"];

/// Strategy for generating valid amounts (positive decimals)
fn amount_strategy() -> impl Strategy<Value = Decimal> {
    (1u64..100_000u64).prop_map(|cents| Decimal::new(cents as i64, 2))
}

/// Strategy for generating debts between two distinct participants
fn debt_strategy() -> impl Strategy<Value = DirectedDebt> {
    (0..PARTICIPANTS.len(), 0..PARTICIPANTS.len(), amount_strategy())
        .prop_filter("debtor and creditor must differ", |(d, c, _)| d != c)
        .prop_map(|(d, c, amount)| {
            DirectedDebt::new(
                ParticipantId::new(PARTICIPANTS[d]),
                ParticipantId::new(PARTICIPANTS[c]),
                amount,
            )
        })
}

/// Strategy for generating simplifiers with either tie-break
fn simplifier_strategy() -> impl Strategy<Value = DebtSimplifier> {
    prop_oneof![Just(MatchOrder::ById), Just(MatchOrder::LargestFirst)].prop_map(|match_order| {
        DebtSimplifier::new(Config {
            match_order,
            ..Config::default()
        })
    })
}

fn normalized_sheet(debts: &[DirectedDebt]) -> BalanceSheet {
    let mut ledger = BalanceLedger::new();
    ledger.record_batch(debts).unwrap();
    ledger.snapshot()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Property: Simplification preserves every net balance
    #[test]
    fn prop_net_preserved(
        debts in prop::collection::vec(debt_strategy(), 0..40),
        simplifier in simplifier_strategy(),
    ) {
        let sheet = normalized_sheet(&debts);
        let simplified = simplifier.simplify(&sheet);

        for id in PARTICIPANTS {
            let participant = ParticipantId::new(id);
            prop_assert_eq!(
                simplified.net_balance_of(&participant),
                sheet.net_balance_of(&participant)
            );
        }
    }

    /// Property: simplify(simplify(s)) == simplify(s)
    #[test]
    fn prop_idempotent(
        debts in prop::collection::vec(debt_strategy(), 0..40),
        simplifier in simplifier_strategy(),
    ) {
        let once = simplifier.simplify(&normalized_sheet(&debts));
        let twice = simplifier.simplify(&once);
        prop_assert_eq!(once, twice);
    }

    /// Property: Edges bounded by creditors + debtors - 1
    #[test]
    fn prop_edge_bound(
        debts in prop::collection::vec(debt_strategy(), 0..40),
        simplifier in simplifier_strategy(),
    ) {
        let sheet = normalized_sheet(&debts);
        let nonzero = sheet
            .net_positions()
            .values()
            .filter(|net| !net.is_zero())
            .count();

        let simplified = simplifier.simplify(&sheet);
        prop_assert!(simplified.edge_count() <= nonzero.saturating_sub(1));
    }

    /// Property: The ledger accepts the simplified sheet as a transform
    #[test]
    fn prop_ledger_accepts_simplified(
        debts in prop::collection::vec(debt_strategy(), 1..40),
        simplifier in simplifier_strategy(),
    ) {
        let mut ledger = BalanceLedger::new();
        ledger.record_batch(&debts).unwrap();

        let change = ledger.apply_transform(|sheet| simplifier.simplify(sheet));
        prop_assert!(change.is_ok());
        prop_assert!(ledger.check_conservation());

        let report = simplifier.simplify_with_report(&ledger.snapshot()).unwrap();
        prop_assert_eq!(report.edges_before, report.edges_after);
    }
}
