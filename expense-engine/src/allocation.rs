//! Expense allocation
//!
//! Turns an allocated expense into ledger debts: every participant other than
//! the payer owes the payer their share. The whole plan goes to the ledger as
//! one batch, so a rejected share leaves the sheet untouched.

use crate::{split::Share, Error, Result};
use balance_ledger::{BalanceLedger, DebtUpdate, DirectedDebt, LedgerHandle, LedgerSettings, ParticipantId};
use rust_decimal::Decimal;

/// Maps shares onto ledger debts
#[derive(Debug, Clone, Copy, Default)]
pub struct ExpenseAllocationAdapter {
    settings: LedgerSettings,
}

impl ExpenseAllocationAdapter {
    /// Create new adapter
    pub fn new(settings: LedgerSettings) -> Self {
        Self { settings }
    }

    /// Debts owed to `payer`, one per non-payer participant with a positive share
    pub fn plan(&self, payer: &ParticipantId, shares: &[Share]) -> Result<Vec<DirectedDebt>> {
        if let Some(share) = shares.iter().find(|s| s.amount < Decimal::ZERO) {
            return Err(Error::InvalidOperand(format!(
                "Negative share {} for {}",
                share.amount, share.participant
            )));
        }

        Ok(shares
            .iter()
            .filter(|share| &share.participant != payer)
            .filter(|share| share.amount > self.settings.epsilon)
            .map(|share| DirectedDebt::new(share.participant.clone(), payer.clone(), share.amount))
            .collect())
    }

    /// Plan and apply through a ledger actor
    pub async fn apply(
        &self,
        ledger: &LedgerHandle,
        payer: &ParticipantId,
        shares: &[Share],
    ) -> Result<Vec<DebtUpdate>> {
        let debts = self.plan(payer, shares)?;
        if debts.is_empty() {
            return Ok(Vec::new());
        }
        Ok(ledger.record_batch(debts).await?)
    }

    /// Plan and apply to a ledger owned by the caller
    pub fn apply_to(
        &self,
        ledger: &mut BalanceLedger,
        payer: &ParticipantId,
        shares: &[Share],
    ) -> Result<Vec<DebtUpdate>> {
        let debts = self.plan(payer, shares)?;
        Ok(ledger.record_batch(&debts)?)
    }
}
