//! Metrics collection for observability
//!
//! This module provides Prometheus metrics for monitoring ledgers.
//!
//! # Metrics
//!
//! - `ledger_debts_recorded_total` - Debts recorded (expense shares, direct debts)
//! - `ledger_settlements_recorded_total` - Cash settlements recorded
//! - `ledger_offsets_total` - Updates that netted against a reverse debt
//! - `ledger_rejected_operations_total` - Invalid operands and declined removals
//! - `ledger_transforms_total` - Sheet transforms applied (simplification)
//! - `ledger_open_edges` - Open edges on the most recently updated sheet

use crate::types::DebtUpdate;
use prometheus::{IntCounter, IntGauge, Registry};
use rust_decimal::Decimal;
use std::sync::Arc;

/// Metrics collector
///
/// Clones share the same underlying counters, so one collector can be
/// handed to every group's actor.
#[derive(Clone)]
pub struct Metrics {
    /// Debts recorded
    pub debts_recorded: IntCounter,

    /// Settlements recorded
    pub settlements_recorded: IntCounter,

    /// Updates absorbed (partly or fully) by a reverse debt
    pub offsets: IntCounter,

    /// Rejected operations
    pub rejected_operations: IntCounter,

    /// Sheet transforms applied
    pub transforms: IntCounter,

    /// Open edges
    pub open_edges: IntGauge,

    /// Prometheus registry
    pub registry: Arc<Registry>,
}

impl Metrics {
    /// Create new metrics collector with its own registry
    pub fn new() -> prometheus::Result<Self> {
        let registry = Arc::new(Registry::new());

        let debts_recorded = IntCounter::new(
            "ledger_debts_recorded_total",
            "Total number of debts recorded",
        )?;
        registry.register(Box::new(debts_recorded.clone()))?;

        let settlements_recorded = IntCounter::new(
            "ledger_settlements_recorded_total",
            "Total number of settlements recorded",
        )?;
        registry.register(Box::new(settlements_recorded.clone()))?;

        let offsets = IntCounter::new(
            "ledger_offsets_total",
            "Updates netted against an opposing debt",
        )?;
        registry.register(Box::new(offsets.clone()))?;

        let rejected_operations = IntCounter::new(
            "ledger_rejected_operations_total",
            "Operations rejected before mutation",
        )?;
        registry.register(Box::new(rejected_operations.clone()))?;

        let transforms = IntCounter::new(
            "ledger_transforms_total",
            "Sheet transforms applied",
        )?;
        registry.register(Box::new(transforms.clone()))?;

        let open_edges = IntGauge::new("ledger_open_edges", "Open edges on the sheet")?;
        registry.register(Box::new(open_edges.clone()))?;

        Ok(Self {
            debts_recorded,
            settlements_recorded,
            offsets,
            rejected_operations,
            transforms,
            open_edges,
            registry,
        })
    }

    /// Record a debt update
    pub fn record_debt(&self, update: &DebtUpdate) {
        self.debts_recorded.inc();
        if update.offset > Decimal::ZERO {
            self.offsets.inc();
        }
    }

    /// Record a settlement update
    pub fn record_settlement(&self, update: &DebtUpdate) {
        self.settlements_recorded.inc();
        if update.offset > Decimal::ZERO {
            self.offsets.inc();
        }
    }

    /// Record a rejected operation
    pub fn record_rejection(&self) {
        self.rejected_operations.inc();
    }

    /// Record a sheet transform
    pub fn record_transform(&self) {
        self.transforms.inc();
    }

    /// Update open edge count
    pub fn update_open_edges(&self, edges: usize) {
        self.open_edges.set(edges as i64);
    }

    /// Get metrics registry
    pub fn registry(&self) -> &Registry {
        &self.registry
    }
}

impl std::fmt::Debug for Metrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Metrics")
            .field("debts_recorded", &self.debts_recorded.get())
            .field("settlements_recorded", &self.settlements_recorded.get())
            .field("open_edges", &self.open_edges.get())
            .finish()
    }
}
