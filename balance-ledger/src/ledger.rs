//! Pairwise balance ledger
//!
//! Every mutation goes through one update rule: a new obligation first
//! offsets any debt in the opposite direction, and only the remainder is
//! booked forward. This keeps at most one direction populated per pair, so
//! the sheet never needs a separate normalization pass.
//!
//! # Example
//!
//! ```
//! use balance_ledger::{BalanceLedger, ParticipantId};
//! use rust_decimal::Decimal;
//!
//! let alice = ParticipantId::new("alice");
//! let bob = ParticipantId::new("bob");
//!
//! let mut ledger = BalanceLedger::new();
//! ledger.record_debt(&bob, &alice, Decimal::from(100)).unwrap();
//! ledger.record_debt(&alice, &bob, Decimal::from(40)).unwrap();
//!
//! assert_eq!(ledger.snapshot().amount(&bob, &alice), Decimal::from(60));
//! assert_eq!(ledger.net_balance_of(&alice), Decimal::from(60));
//! ```

use crate::{
    config::LedgerSettings,
    types::{BalanceSheet, DebtUpdate, DirectedDebt, ParticipantBalance, ParticipantId},
    Error, Result,
};
use rust_decimal::Decimal;
use std::collections::BTreeMap;

/// What a sheet transform changed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetChange {
    /// Edges before the transform
    pub edges_before: usize,

    /// Edges after the transform
    pub edges_after: usize,

    /// Gross amount before the transform
    pub gross_before: Decimal,

    /// Gross amount after the transform
    pub gross_after: Decimal,
}

/// Per-group ledger of directed pairwise debts
#[derive(Debug, Clone, Default)]
pub struct BalanceLedger {
    /// Normalized debt graph
    sheet: BalanceSheet,

    /// Epsilon and minor-unit settings
    settings: LedgerSettings,
}

impl BalanceLedger {
    /// Empty ledger with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty ledger with explicit settings
    pub fn with_settings(settings: LedgerSettings) -> Self {
        Self {
            sheet: BalanceSheet::new(),
            settings,
        }
    }

    /// Active settings
    pub fn settings(&self) -> &LedgerSettings {
        &self.settings
    }

    /// Record "debtor owes creditor `amount`"
    ///
    /// Rejected with [`Error::InvalidOperand`] if `amount` is not positive or
    /// debtor and creditor are the same; the sheet is untouched in that case.
    pub fn record_debt(
        &mut self,
        debtor: &ParticipantId,
        creditor: &ParticipantId,
        amount: Decimal,
    ) -> Result<DebtUpdate> {
        validate_debt(debtor, creditor, amount)?;
        let update = self.apply_debt(debtor, creditor, amount);

        tracing::debug!(
            debtor = %debtor,
            creditor = %creditor,
            amount = %amount,
            offset = %update.offset,
            added = %update.added,
            "Recorded debt"
        );

        Ok(update)
    }

    /// Record a cash payment from `payer` to `payee`
    ///
    /// The payment is booked as the payee owing the payer, which the offset
    /// rule nets against whatever the payer owed.
    pub fn record_settlement(
        &mut self,
        payer: &ParticipantId,
        payee: &ParticipantId,
        amount: Decimal,
    ) -> Result<DebtUpdate> {
        self.record_debt(payee, payer, amount)
    }

    /// Record several debts; all of them are validated before any is applied
    pub fn record_batch(&mut self, debts: &[DirectedDebt]) -> Result<Vec<DebtUpdate>> {
        for debt in debts {
            validate_debt(&debt.debtor, &debt.creditor, debt.amount)?;
        }

        let updates: Vec<DebtUpdate> = debts
            .iter()
            .map(|debt| self.apply_debt(&debt.debtor, &debt.creditor, debt.amount))
            .collect();

        tracing::debug!(count = updates.len(), "Recorded debt batch");
        Ok(updates)
    }

    /// Owed-to minus owed-by
    pub fn net_balance_of(&self, participant: &ParticipantId) -> Decimal {
        self.sheet.net_balance_of(participant)
    }

    /// Sum of what `participant` owes others
    pub fn total_owed_by(&self, participant: &ParticipantId) -> Decimal {
        self.sheet.total_owed_by(participant)
    }

    /// Sum of what others owe `participant`
    pub fn total_owed_to(&self, participant: &ParticipantId) -> Decimal {
        self.sheet.total_owed_to(participant)
    }

    /// Balance summary for reporting
    pub fn balance_of(&self, participant: &ParticipantId) -> ParticipantBalance {
        self.sheet.balance_of(participant)
    }

    /// Owes nothing and is owed nothing (within epsilon)
    pub fn is_clear(&self, participant: &ParticipantId) -> bool {
        let epsilon = self.settings.epsilon;
        let row_clear = self
            .sheet
            .row(participant)
            .map_or(true, |row| row.values().all(|amount| amount.abs() <= epsilon));

        row_clear
            && self
                .sheet
                .edges()
                .filter(|debt| &debt.creditor == participant)
                .all(|debt| debt.amount.abs() <= epsilon)
    }

    /// Drop a participant's row and column, only if clear
    pub fn remove_participant(&mut self, participant: &ParticipantId) -> Result<()> {
        if !self.is_clear(participant) {
            let balance = self.balance_of(participant);
            return Err(Error::MembershipConflict(format!(
                "{} owes {} and is owed {}",
                participant, balance.owed_by, balance.owed_to
            )));
        }

        self.sheet.remove_participant(participant);
        Ok(())
    }

    /// Deep, independent copy of the sheet
    pub fn snapshot(&self) -> BalanceSheet {
        self.sheet.clone()
    }

    /// Number of open edges
    pub fn edge_count(&self) -> usize {
        self.sheet.edge_count()
    }

    /// Σ net balances == 0 (within epsilon)
    pub fn check_conservation(&self) -> bool {
        let total: Decimal = self.sheet.net_positions().values().copied().sum();
        total.abs() < self.settings.epsilon
    }

    /// Replace the sheet with `transform(snapshot)`
    ///
    /// The new sheet must give every participant the same net balance
    /// (within epsilon); otherwise [`Error::InvariantViolation`] is returned
    /// and the current sheet is kept.
    pub fn apply_transform<F>(&mut self, transform: F) -> Result<SheetChange>
    where
        F: FnOnce(&BalanceSheet) -> BalanceSheet,
    {
        let mut candidate = transform(&self.sheet);
        candidate.prune(self.settings.epsilon);

        if !candidate.is_normalized(self.settings.epsilon) {
            return Err(Error::InvariantViolation(
                "transformed sheet holds opposing debts".to_string(),
            ));
        }

        let before = self.sheet.net_positions();
        let after = candidate.net_positions();
        if let Some(participant) = first_net_mismatch(&before, &after, self.settings.epsilon) {
            return Err(Error::InvariantViolation(format!(
                "net balance of {} changed from {} to {}",
                participant,
                before.get(&participant).copied().unwrap_or(Decimal::ZERO),
                after.get(&participant).copied().unwrap_or(Decimal::ZERO),
            )));
        }

        let change = SheetChange {
            edges_before: self.sheet.edge_count(),
            edges_after: candidate.edge_count(),
            gross_before: self.sheet.gross_amount(),
            gross_after: candidate.gross_amount(),
        };
        self.sheet = candidate;

        tracing::debug!(
            edges_before = change.edges_before,
            edges_after = change.edges_after,
            "Applied sheet transform"
        );

        Ok(change)
    }

    /// The offset-on-write update; operands already validated
    fn apply_debt(
        &mut self,
        debtor: &ParticipantId,
        creditor: &ParticipantId,
        amount: Decimal,
    ) -> DebtUpdate {
        let epsilon = self.settings.epsilon;
        let existing_reverse = self.sheet.amount(creditor, debtor);

        let (offset, added) = if existing_reverse > epsilon {
            if existing_reverse >= amount {
                self.sheet
                    .set_edge(creditor, debtor, existing_reverse - amount);
                (amount, Decimal::ZERO)
            } else {
                self.sheet.set_edge(creditor, debtor, Decimal::ZERO);
                let remainder = amount - existing_reverse;
                self.sheet.add_edge(debtor, creditor, remainder);
                (existing_reverse, remainder)
            }
        } else {
            self.sheet.add_edge(debtor, creditor, amount);
            (Decimal::ZERO, amount)
        };

        self.sheet.prune_pair(debtor, creditor, epsilon);

        DebtUpdate {
            debtor: debtor.clone(),
            creditor: creditor.clone(),
            requested: amount,
            offset,
            added,
        }
    }
}

fn validate_debt(debtor: &ParticipantId, creditor: &ParticipantId, amount: Decimal) -> Result<()> {
    if amount <= Decimal::ZERO {
        return Err(Error::InvalidOperand(format!(
            "Amount must be positive, got {}",
            amount
        )));
    }

    if debtor == creditor {
        return Err(Error::InvalidOperand(format!(
            "{} cannot owe themselves",
            debtor
        )));
    }

    Ok(())
}

fn first_net_mismatch(
    before: &BTreeMap<ParticipantId, Decimal>,
    after: &BTreeMap<ParticipantId, Decimal>,
    epsilon: Decimal,
) -> Option<ParticipantId> {
    before
        .keys()
        .chain(after.keys())
        .find(|participant| {
            let was = before.get(*participant).copied().unwrap_or(Decimal::ZERO);
            let now = after.get(*participant).copied().unwrap_or(Decimal::ZERO);
            (was - now).abs() >= epsilon
        })
        .cloned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(id: &str) -> ParticipantId {
        ParticipantId::new(id)
    }

    fn amount(units: i64) -> Decimal {
        Decimal::from(units)
    }

    #[test]
    fn test_record_debt_creates_edge() {
        let mut ledger = BalanceLedger::new();
        let update = ledger.record_debt(&p("B"), &p("A"), amount(100)).unwrap();

        assert_eq!(update.added, amount(100));
        assert_eq!(update.offset, Decimal::ZERO);
        assert_eq!(ledger.snapshot().amount(&p("B"), &p("A")), amount(100));
        assert_eq!(ledger.edge_count(), 1);
    }

    #[test]
    fn test_reverse_debt_is_offset_first() {
        let mut ledger = BalanceLedger::new();
        ledger.record_debt(&p("B"), &p("A"), amount(100)).unwrap();

        let update = ledger.record_debt(&p("A"), &p("B"), amount(40)).unwrap();
        assert!(update.is_fully_offset());
        assert_eq!(update.offset, amount(40));

        let sheet = ledger.snapshot();
        assert_eq!(sheet.amount(&p("B"), &p("A")), amount(60));
        assert_eq!(sheet.amount(&p("A"), &p("B")), Decimal::ZERO);
        assert!(sheet.row(&p("A")).is_none());
    }

    #[test]
    fn test_reverse_debt_flips_direction() {
        let mut ledger = BalanceLedger::new();
        ledger.record_debt(&p("B"), &p("A"), amount(30)).unwrap();

        let update = ledger.record_debt(&p("A"), &p("B"), amount(50)).unwrap();
        assert_eq!(update.offset, amount(30));
        assert_eq!(update.added, amount(20));

        let sheet = ledger.snapshot();
        assert_eq!(sheet.amount(&p("A"), &p("B")), amount(20));
        assert_eq!(sheet.amount(&p("B"), &p("A")), Decimal::ZERO);
        assert_eq!(sheet.edge_count(), 1);
        assert!(sheet.is_normalized(ledger.settings().epsilon));
    }

    #[test]
    fn test_exact_settlement_removes_entry() {
        let mut ledger = BalanceLedger::new();
        ledger.record_debt(&p("B"), &p("A"), amount(75)).unwrap();

        ledger.record_settlement(&p("B"), &p("A"), amount(75)).unwrap();

        let sheet = ledger.snapshot();
        assert!(sheet.is_empty());
        assert_eq!(sheet.edge_count(), 0);
        assert!(sheet.row(&p("B")).is_none());
        assert!(ledger.is_clear(&p("A")));
        assert!(ledger.is_clear(&p("B")));
    }

    #[test]
    fn test_overpayment_reverses_debt() {
        let mut ledger = BalanceLedger::new();
        ledger.record_debt(&p("B"), &p("A"), amount(50)).unwrap();
        ledger.record_settlement(&p("B"), &p("A"), amount(80)).unwrap();

        assert_eq!(ledger.snapshot().amount(&p("A"), &p("B")), amount(30));
        assert_eq!(ledger.net_balance_of(&p("B")), amount(30));
    }

    #[test]
    fn test_invalid_operands_leave_sheet_untouched() {
        let mut ledger = BalanceLedger::new();
        ledger.record_debt(&p("B"), &p("A"), amount(10)).unwrap();
        let before = ledger.snapshot();

        let zero = ledger.record_debt(&p("B"), &p("A"), Decimal::ZERO);
        assert!(matches!(zero, Err(Error::InvalidOperand(_))));

        let negative = ledger.record_debt(&p("B"), &p("A"), amount(-5));
        assert!(matches!(negative, Err(Error::InvalidOperand(_))));

        let selfish = ledger.record_debt(&p("A"), &p("A"), amount(5));
        assert!(matches!(selfish, Err(Error::InvalidOperand(_))));

        assert_eq!(ledger.snapshot(), before);
    }

    #[test]
    fn test_batch_is_all_or_nothing() {
        let mut ledger = BalanceLedger::new();
        let debts = vec![
            DirectedDebt::new(p("B"), p("A"), amount(10)),
            DirectedDebt::new(p("C"), p("C"), amount(10)),
        ];

        assert!(ledger.record_batch(&debts).is_err());
        assert!(ledger.snapshot().is_empty());

        let debts = vec![
            DirectedDebt::new(p("B"), p("A"), amount(10)),
            DirectedDebt::new(p("C"), p("A"), amount(15)),
        ];
        let updates = ledger.record_batch(&debts).unwrap();
        assert_eq!(updates.len(), 2);
        assert_eq!(ledger.total_owed_to(&p("A")), amount(25));
    }

    #[test]
    fn test_equal_then_exact_split_scenario() {
        let (a, b, c) = (p("A"), p("B"), p("C"));
        let mut ledger = BalanceLedger::new();

        // A pays 300, split equally
        ledger.record_debt(&b, &a, amount(100)).unwrap();
        ledger.record_debt(&c, &a, amount(100)).unwrap();

        // B pays 100: A owes 40, C owes 60
        ledger.record_debt(&a, &b, amount(40)).unwrap();
        ledger.record_debt(&c, &b, amount(60)).unwrap();

        let sheet = ledger.snapshot();
        assert_eq!(sheet.amount(&b, &a), amount(60));
        assert_eq!(sheet.amount(&c, &a), amount(100));
        assert_eq!(sheet.amount(&c, &b), amount(60));
        assert_eq!(sheet.amount(&a, &b), Decimal::ZERO);

        assert_eq!(ledger.net_balance_of(&a), amount(160));
        assert_eq!(ledger.net_balance_of(&b), Decimal::ZERO);
        assert_eq!(ledger.net_balance_of(&c), amount(-160));

        let balance_b = ledger.balance_of(&b);
        assert_eq!(balance_b.owed_by, amount(60));
        assert_eq!(balance_b.owed_to, amount(60));
        assert!(ledger.check_conservation());
    }

    #[test]
    fn test_is_clear_checks_both_directions() {
        let mut ledger = BalanceLedger::new();
        ledger.record_debt(&p("B"), &p("A"), amount(10)).unwrap();

        assert!(!ledger.is_clear(&p("A")));
        assert!(!ledger.is_clear(&p("B")));
        assert!(ledger.is_clear(&p("C")));
    }

    #[test]
    fn test_remove_participant_gated_by_clear() {
        let mut ledger = BalanceLedger::new();
        ledger.record_debt(&p("B"), &p("A"), amount(10)).unwrap();
        let before = ledger.snapshot();

        let result = ledger.remove_participant(&p("A"));
        assert!(matches!(result, Err(Error::MembershipConflict(_))));
        assert_eq!(ledger.snapshot(), before);

        ledger.record_settlement(&p("B"), &p("A"), amount(10)).unwrap();
        assert!(ledger.remove_participant(&p("A")).is_ok());
    }

    #[test]
    fn test_sub_epsilon_noise_is_cleaned_up() {
        let mut ledger = BalanceLedger::new();
        ledger.record_debt(&p("B"), &p("A"), Decimal::new(100_0005, 4)).unwrap();
        ledger.record_settlement(&p("B"), &p("A"), amount(100)).unwrap();

        assert!(ledger.snapshot().is_empty());
        assert!(ledger.is_clear(&p("B")));
    }

    #[test]
    fn test_debt_at_epsilon_never_leaves_two_directions() {
        let mut ledger = BalanceLedger::new();
        let epsilon = ledger.settings().epsilon;

        ledger.record_debt(&p("B"), &p("A"), epsilon).unwrap();
        assert!(ledger.snapshot().is_empty());
        assert!(ledger.is_clear(&p("B")));

        ledger.record_debt(&p("A"), &p("B"), amount(10)).unwrap();
        let sheet = ledger.snapshot();
        assert_eq!(sheet.edge_count(), 1);
        assert_eq!(sheet.amount(&p("A"), &p("B")), amount(10));
        assert_eq!(sheet.amount(&p("B"), &p("A")), Decimal::ZERO);
        assert!(sheet.is_normalized(epsilon));

        // Identity transform still passes the normalization check
        assert!(ledger.apply_transform(|sheet| sheet.clone()).is_ok());
    }

    #[test]
    fn test_snapshot_is_independent() {
        let mut ledger = BalanceLedger::new();
        ledger.record_debt(&p("B"), &p("A"), amount(10)).unwrap();

        let snapshot = ledger.snapshot();
        ledger.record_debt(&p("B"), &p("A"), amount(5)).unwrap();

        assert_eq!(snapshot.amount(&p("B"), &p("A")), amount(10));
        assert_eq!(ledger.snapshot().amount(&p("B"), &p("A")), amount(15));
    }

    #[test]
    fn test_apply_transform_rejects_changed_nets() {
        let mut ledger = BalanceLedger::new();
        ledger.record_debt(&p("B"), &p("A"), amount(10)).unwrap();
        let before = ledger.snapshot();

        let result = ledger.apply_transform(|_| {
            BalanceSheet::from_debts(vec![DirectedDebt::new(p("B"), p("A"), amount(9))])
        });

        assert!(matches!(result, Err(Error::InvariantViolation(_))));
        assert_eq!(ledger.snapshot(), before);
    }

    #[test]
    fn test_apply_transform_installs_equivalent_sheet() {
        let mut ledger = BalanceLedger::new();
        ledger.record_debt(&p("A"), &p("B"), amount(10)).unwrap();
        ledger.record_debt(&p("B"), &p("C"), amount(10)).unwrap();

        let change = ledger
            .apply_transform(|_| {
                BalanceSheet::from_debts(vec![DirectedDebt::new(p("A"), p("C"), amount(10))])
            })
            .unwrap();

        assert_eq!(change.edges_before, 2);
        assert_eq!(change.edges_after, 1);
        assert_eq!(change.gross_before, amount(20));
        assert_eq!(change.gross_after, amount(10));
        assert!(ledger.is_clear(&p("B")));
    }
}
