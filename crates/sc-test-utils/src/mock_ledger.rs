//! In-memory fund ledger with transactional writes and fault injection.
//!
//! A transaction buffers its ledger rows and total changes and applies them
//! in one step on commit. Dropping it without commit discards everything,
//! which mirrors a rolled-back database transaction.

use async_trait::async_trait;
use chrono::Utc;
use sc_service::errors::ScError;
use sc_service::models::{FundEntry, FundScope, NewFundEntry};
use sc_service::repositories::{FundLedger, LedgerTransaction};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

/// Tenant key that does not depend on how the scope was built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tenant {
    Society(i64),
    Building(i64),
}

impl From<FundScope> for Tenant {
    fn from(scope: FundScope) -> Self {
        match scope {
            FundScope::Society(s) => Tenant::Society(s.id()),
            FundScope::Building(b) => Tenant::Building(b.id()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct StoredEntry {
    pub tenant: Tenant,
    pub created_by: i64,
    pub entry: FundEntry,
}

#[derive(Default)]
struct LedgerState {
    totals: HashMap<Tenant, i64>,
    entries: Vec<StoredEntry>,
    next_id: i64,
}

#[derive(Clone, Default)]
pub struct MockFundLedger {
    state: Arc<Mutex<LedgerState>>,
    fail_next_balance_update: Arc<AtomicBool>,
}

impl MockFundLedger {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tenant row with a starting total. Unregistered tenants
    /// behave like a missing row: the total update affects nothing.
    #[must_use]
    pub fn with_tenant(self, tenant: Tenant, total_cents: i64) -> Self {
        self.state.lock().unwrap().totals.insert(tenant, total_cents);
        self
    }

    /// Fail the next `apply_delta`, after the ledger row has been inserted.
    pub fn fail_next_balance_update(&self) {
        self.fail_next_balance_update.store(true, Ordering::SeqCst);
    }

    pub fn total(&self, tenant: Tenant) -> Option<i64> {
        self.state.lock().unwrap().totals.get(&tenant).copied()
    }

    /// Committed rows for a tenant, oldest first.
    pub fn stored_entries(&self, tenant: Tenant) -> Vec<StoredEntry> {
        self.state
            .lock()
            .unwrap()
            .entries
            .iter()
            .filter(|e| e.tenant == tenant)
            .cloned()
            .collect()
    }

    /// Overwrite a cached total without a ledger row, to simulate drift.
    pub fn corrupt_total(&self, tenant: Tenant, total_cents: i64) {
        self.state.lock().unwrap().totals.insert(tenant, total_cents);
    }
}

#[async_trait]
impl FundLedger for MockFundLedger {
    async fn begin(&self) -> Result<Box<dyn LedgerTransaction>, ScError> {
        Ok(Box::new(MockLedgerTransaction {
            ledger: self.clone(),
            pending_entries: Vec::new(),
            pending_deltas: Vec::new(),
        }))
    }

    async fn entries(&self, scope: FundScope) -> Result<Vec<FundEntry>, ScError> {
        let mut entries: Vec<FundEntry> = self
            .stored_entries(scope.into())
            .into_iter()
            .map(|e| e.entry)
            .collect();
        entries.reverse();
        Ok(entries)
    }

    async fn cached_total(&self, scope: FundScope) -> Result<i64, ScError> {
        self.total(scope.into())
            .ok_or_else(|| ScError::Database("tenant row not found".to_string()))
    }

    async fn ledger_sum(&self, scope: FundScope) -> Result<i64, ScError> {
        Ok(self
            .stored_entries(scope.into())
            .iter()
            .map(|e| e.entry.entry_type.delta(e.entry.amount_cents))
            .sum())
    }
}

pub struct MockLedgerTransaction {
    ledger: MockFundLedger,
    pending_entries: Vec<StoredEntry>,
    pending_deltas: Vec<(Tenant, i64)>,
}

#[async_trait]
impl LedgerTransaction for MockLedgerTransaction {
    async fn insert_entry(
        &mut self,
        scope: FundScope,
        entry: &NewFundEntry,
        created_by: i64,
    ) -> Result<FundEntry, ScError> {
        let id = {
            let mut state = self.ledger.state.lock().unwrap();
            state.next_id += 1;
            state.next_id
        };
        let row = FundEntry {
            id,
            amount_cents: entry.amount_cents,
            entry_type: entry.entry_type,
            description: entry.description.clone(),
            entry_date: entry.entry_date,
            created_at: Utc::now(),
        };
        self.pending_entries.push(StoredEntry {
            tenant: scope.into(),
            created_by,
            entry: row.clone(),
        });
        Ok(row)
    }

    async fn apply_delta(&mut self, scope: FundScope, delta_cents: i64) -> Result<i64, ScError> {
        if self
            .ledger
            .fail_next_balance_update
            .swap(false, Ordering::SeqCst)
        {
            return Err(ScError::Database("injected balance update failure".to_string()));
        }

        let tenant = Tenant::from(scope);
        let committed = self
            .ledger
            .total(tenant)
            .ok_or_else(|| ScError::Database("Fund total update affected no rows".to_string()))?;
        let pending: i64 = self
            .pending_deltas
            .iter()
            .filter(|(t, _)| *t == tenant)
            .map(|(_, d)| d)
            .sum();

        self.pending_deltas.push((tenant, delta_cents));
        Ok(committed + pending + delta_cents)
    }

    async fn commit(self: Box<Self>) -> Result<(), ScError> {
        let mut state = self.ledger.state.lock().unwrap();
        for (tenant, delta) in &self.pending_deltas {
            *state.totals.entry(*tenant).or_insert(0) += delta;
        }
        state.entries.extend(self.pending_entries.iter().cloned());
        Ok(())
    }
}
