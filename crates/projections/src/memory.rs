use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use common::AggregateId;
use event_store::EventId;
use rust_decimal::Decimal;
use tokio::sync::RwLock;

use crate::Result;
use crate::read_model::{BankAccount, BankAccountRepository};

#[derive(Default)]
struct RepositoryState {
    accounts: HashMap<AggregateId, BankAccount>,
    processed: HashSet<EventId>,
}

impl RepositoryState {
    /// Records the event id; false means it was seen before and the caller
    /// must skip the mutation.
    fn first_sighting(&mut self, event_id: &EventId) -> bool {
        self.processed.insert(*event_id)
    }
}

/// In-memory bank account repository for testing and local runs.
///
/// Rows and the processed-event set live under one lock, so the idempotency
/// check and the mutation are atomic.
#[derive(Clone, Default)]
pub struct InMemoryBankAccountRepository {
    state: Arc<RwLock<RepositoryState>>,
}

impl InMemoryBankAccountRepository {
    /// Creates a new empty repository.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of account rows.
    pub async fn account_count(&self) -> usize {
        self.state.read().await.accounts.len()
    }
}

#[async_trait]
impl BankAccountRepository for InMemoryBankAccountRepository {
    async fn insert_account(&self, account: BankAccount, event_id: &EventId) -> Result<()> {
        let mut state = self.state.write().await;
        if !state.first_sighting(event_id) {
            return Ok(());
        }
        state.accounts.insert(account.identifier.clone(), account);
        Ok(())
    }

    async fn apply_balance_delta(
        &self,
        identifier: &AggregateId,
        delta: Decimal,
        event_id: &EventId,
    ) -> Result<()> {
        let mut state = self.state.write().await;
        if !state.first_sighting(event_id) {
            return Ok(());
        }
        if let Some(account) = state.accounts.get_mut(identifier) {
            account.balance += delta;
        }
        Ok(())
    }

    async fn delete_by_identifier(
        &self,
        identifier: &AggregateId,
        event_id: &EventId,
    ) -> Result<()> {
        let mut state = self.state.write().await;
        if !state.first_sighting(event_id) {
            return Ok(());
        }
        state.accounts.remove(identifier);
        Ok(())
    }

    async fn find_all(&self) -> Result<Vec<BankAccount>> {
        let state = self.state.read().await;
        let mut accounts: Vec<_> = state.accounts.values().cloned().collect();
        accounts.sort_by(|a, b| a.creation_date.cmp(&b.creation_date));
        Ok(accounts)
    }

    async fn find_by_identifier(&self, identifier: &AggregateId) -> Result<Option<BankAccount>> {
        let state = self.state.read().await;
        Ok(state.accounts.get(identifier).cloned())
    }
}
