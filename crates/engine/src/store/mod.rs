//! The Ledger Store seam.
//!
//! The store exclusively owns persisted settings and transactions; everything
//! else in the engine reads and writes through [`LedgerStore`]. [`DbStore`] is
//! the production implementation, [`MemoryStore`] a fake for tests.

use std::future::Future;

use crate::{Money, NewTransaction, ResultEngine, Transaction};

mod db;
mod memory;

pub use db::DbStore;
pub use memory::MemoryStore;

pub trait LedgerStore: Send + Sync {
    /// Reads the starting balance, `None` when it was never set.
    fn starting_balance(&self) -> impl Future<Output = ResultEngine<Option<Money>>> + Send;

    /// Stores the starting balance once. Fails with
    /// [`EngineError::AlreadyConfigured`](crate::EngineError::AlreadyConfigured)
    /// when a value is already present.
    fn set_starting_balance(&self, amount: Money) -> impl Future<Output = ResultEngine<()>> + Send;

    /// Appends a transaction and returns it with its assigned id.
    fn insert_transaction(
        &self,
        tx: NewTransaction,
    ) -> impl Future<Output = ResultEngine<Transaction>> + Send;

    /// All transactions in chronological order (`date`, then insertion).
    fn transactions(&self) -> impl Future<Output = ResultEngine<Vec<Transaction>>> + Send;
}
