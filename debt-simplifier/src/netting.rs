//! Multilateral debt simplification
//!
//! Rewrites a debt graph into the fewest practical direct payments between
//! net debtors and net creditors, leaving every participant's net balance
//! unchanged.
//!
//! # Algorithm
//!
//! 1. Calculate net positions for each participant
//! 2. Split into net creditors and net debtors
//! 3. Order both sides by the configured [`MatchOrder`]
//! 4. Walk both lists with two pointers, settling `min(creditor, debtor)` each step
//!
//! Every step exhausts at least one side, so the result has at most
//! `creditors + debtors - 1` edges.
//!
//! # Example
//!
//! ```text
//! Gross obligations:
//!   A owes B: $100
//!   B owes C: $80
//!   C owes A: $50
//!
//! Net positions:
//!   A: -$50 (net payer)
//!   B: +$20 (net receiver)
//!   C: +$30 (net receiver)
//!
//! Net transfers:
//!   A pays B: $20
//!   A pays C: $30
//!
//! Savings: $230 → $50 (78% reduction)
//! ```

use crate::{
    config::Config,
    types::{MatchOrder, NetPosition, SimplificationReport, Transfer},
    Error, Result,
};
use balance_ledger::{BalanceSheet, DirectedDebt, ParticipantId};
use rust_decimal::Decimal;
use std::collections::BTreeSet;

/// Debt simplifier
#[derive(Debug, Clone, Copy, Default)]
pub struct DebtSimplifier {
    config: Config,
}

impl DebtSimplifier {
    /// Create new simplifier
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Active configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Equivalent sheet with a minimal-in-practice number of edges
    pub fn simplify(&self, sheet: &BalanceSheet) -> BalanceSheet {
        let positions = self.calculate_net_positions(sheet);
        let transfers = self.generate_transfers(&positions);
        to_sheet(transfers)
    }

    /// Simplify and describe what changed
    ///
    /// Fails with [`Error::Netting`] if the sheet's net positions do not
    /// sum to zero.
    pub fn simplify_with_report(&self, sheet: &BalanceSheet) -> Result<SimplificationReport> {
        let positions = self.calculate_net_positions(sheet);
        let transfers = self.settle_positions(&positions)?;
        let simplified = to_sheet(transfers.clone());

        let report = SimplificationReport {
            edges_before: sheet.edge_count(),
            edges_after: simplified.edge_count(),
            gross_before: sheet.gross_amount(),
            gross_after: simplified.gross_amount(),
            transfers,
        };

        tracing::debug!(
            edges_before = report.edges_before,
            edges_after = report.edges_after,
            gross_before = %report.gross_before,
            gross_after = %report.gross_after,
            "Simplification planned"
        );

        Ok(report)
    }

    /// Payments that settle the given net positions
    ///
    /// Positions may come from outside a [`BalanceSheet`], so they are
    /// checked for duplicate participants and zero sum first.
    pub fn settle_positions(&self, positions: &[NetPosition]) -> Result<Vec<Transfer>> {
        let mut seen = BTreeSet::new();
        for position in positions {
            if !seen.insert(&position.participant) {
                return Err(Error::Netting(format!(
                    "{} has more than one net position",
                    position.participant
                )));
            }
        }

        let total: Decimal = positions.iter().map(|p| p.net).sum();
        if total.abs() >= self.config.epsilon {
            return Err(Error::Netting(format!(
                "Net positions sum to {} instead of zero",
                total
            )));
        }

        Ok(self.generate_transfers(positions))
    }

    /// Calculate net positions, in ascending participant order
    fn calculate_net_positions(&self, sheet: &BalanceSheet) -> Vec<NetPosition> {
        sheet
            .net_positions()
            .into_iter()
            .map(|(participant, net)| NetPosition::new(participant, net))
            .collect()
    }

    /// Two-pointer greedy matching of debtors against creditors
    fn generate_transfers(&self, positions: &[NetPosition]) -> Vec<Transfer> {
        let epsilon = self.config.epsilon;

        let mut creditors: Vec<(ParticipantId, Decimal)> = positions
            .iter()
            .filter(|p| p.is_net_receiver(epsilon))
            .map(|p| (p.participant.clone(), p.abs_net_position()))
            .collect();

        let mut debtors: Vec<(ParticipantId, Decimal)> = positions
            .iter()
            .filter(|p| p.is_net_payer(epsilon))
            .map(|p| (p.participant.clone(), p.abs_net_position()))
            .collect();

        self.order(&mut creditors);
        self.order(&mut debtors);

        let mut transfers = Vec::new();
        let (mut i, mut j) = (0, 0);

        while i < creditors.len() && j < debtors.len() {
            let settle = creditors[i].1.min(debtors[j].1);

            if settle > epsilon {
                transfers.push(Transfer {
                    from: debtors[j].0.clone(),
                    to: creditors[i].0.clone(),
                    amount: settle,
                });
            }

            creditors[i].1 -= settle;
            debtors[j].1 -= settle;

            if creditors[i].1 <= epsilon {
                i += 1;
            }
            if debtors[j].1 <= epsilon {
                j += 1;
            }
        }

        transfers
    }

    fn order(&self, side: &mut [(ParticipantId, Decimal)]) {
        match self.config.match_order {
            MatchOrder::ById => side.sort_by(|a, b| a.0.cmp(&b.0)),
            MatchOrder::LargestFirst => {
                side.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)))
            }
        }
    }
}

/// Simplify with the default configuration
pub fn simplify(sheet: &BalanceSheet) -> BalanceSheet {
    DebtSimplifier::default().simplify(sheet)
}

fn to_sheet(transfers: Vec<Transfer>) -> BalanceSheet {
    BalanceSheet::from_debts(transfers.into_iter().map(DirectedDebt::from))
}
