use std::sync::{Mutex, MutexGuard};

use sea_orm::DbErr;

use crate::{EngineError, Money, NewTransaction, ResultEngine, Transaction};

use super::LedgerStore;

#[derive(Debug, Default)]
struct State {
    starting_balance: Option<Money>,
    transactions: Vec<Transaction>,
    next_id: i32,
    inserts_left: Option<usize>,
}

/// In-memory ledger store.
///
/// Mirrors the ordering and single-write rules of [`DbStore`](super::DbStore)
/// and can be told to start failing inserts, which makes store outages
/// reproducible in tests.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_starting_balance(amount: Money) -> Self {
        let store = Self::default();
        if let Ok(mut state) = store.state.lock() {
            state.starting_balance = Some(amount);
        }
        store
    }

    /// Accept `count` more inserts, then fail every following one.
    pub fn fail_inserts_after(self, count: usize) -> Self {
        if let Ok(mut state) = self.state.lock() {
            state.inserts_left = Some(count);
        }
        self
    }

    fn lock(&self) -> ResultEngine<MutexGuard<'_, State>> {
        self.state
            .lock()
            .map_err(|_| EngineError::Database(DbErr::Custom("memory store poisoned".to_string())))
    }
}

impl LedgerStore for MemoryStore {
    async fn starting_balance(&self) -> ResultEngine<Option<Money>> {
        Ok(self.lock()?.starting_balance)
    }

    async fn set_starting_balance(&self, amount: Money) -> ResultEngine<()> {
        let mut state = self.lock()?;
        if state.starting_balance.is_some() {
            return Err(EngineError::AlreadyConfigured);
        }
        state.starting_balance = Some(amount);
        Ok(())
    }

    async fn insert_transaction(&self, tx: NewTransaction) -> ResultEngine<Transaction> {
        let mut state = self.lock()?;
        if let Some(left) = state.inserts_left.as_mut() {
            if *left == 0 {
                return Err(EngineError::Database(DbErr::Custom(
                    "memory store offline".to_string(),
                )));
            }
            *left -= 1;
        }

        state.next_id += 1;
        let stored = tx.into_transaction(state.next_id);
        state.transactions.push(stored.clone());
        Ok(stored)
    }

    async fn transactions(&self) -> ResultEngine<Vec<Transaction>> {
        let mut out = self.lock()?.transactions.clone();
        out.sort_by_key(|tx| (tx.date, tx.id));
        Ok(out)
    }
}
