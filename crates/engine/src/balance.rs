//! Balance Calculator.
//!
//! The balance is never stored on its own: it is derived from the starting
//! balance plus the amounts of every stored transaction. `Balance` is the
//! disposable in-process cache of that derivation.

use chrono::{DateTime, Utc};

use crate::{EngineError, LedgerStore, Money, ResultEngine, Transaction};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Balance {
    starting: Option<Money>,
    current: Option<Money>,
}

/// A stored running balance that disagrees with the derived one.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Discrepancy {
    pub transaction_id: i32,
    pub date: DateTime<Utc>,
    pub expected: Money,
    pub recorded: Money,
}

impl Balance {
    /// Reads the setting and every transaction from the store and derives
    /// the current balance. Both values are `None` while the ledger is not
    /// configured, which is not an error.
    pub async fn initialize<S: LedgerStore>(store: &S) -> ResultEngine<Self> {
        let starting = store.starting_balance().await?;
        let Some(starting) = starting else {
            return Ok(Self::default());
        };
        let transactions = store.transactions().await?;
        Self::from_parts(starting, &transactions)
    }

    /// `starting + Σ amount`, independent of the transactions' order.
    pub fn from_parts(starting: Money, transactions: &[Transaction]) -> ResultEngine<Self> {
        let current = transactions
            .iter()
            .try_fold(starting, |acc, tx| acc.checked_add(tx.amount))
            .ok_or_else(overflow)?;

        Ok(Self {
            starting: Some(starting),
            current: Some(current),
        })
    }

    pub fn starting(&self) -> Option<Money> {
        self.starting
    }

    pub fn current(&self) -> Option<Money> {
        self.current
    }

    pub fn is_configured(&self) -> bool {
        self.starting.is_some()
    }

    /// The balance `apply(amount)` would produce, without touching the cache.
    pub fn preview(&self, amount: Money) -> ResultEngine<Money> {
        let current = self.current.ok_or(EngineError::NotConfigured)?;
        current.checked_add(amount).ok_or_else(overflow)
    }

    /// Adds a signed amount to the cached balance and returns the new value.
    pub fn apply(&mut self, amount: Money) -> ResultEngine<Money> {
        let next = self.preview(amount)?;
        self.current = Some(next);
        Ok(next)
    }
}

/// Replays `transactions` (chronological) from `starting` and reports every
/// row whose stored running balance breaks
/// `running_balance[i] = starting + Σ amount[0..=i]`.
pub fn audit(starting: Money, transactions: &[Transaction]) -> Vec<Discrepancy> {
    let mut expected = starting;
    let mut out = Vec::new();
    for tx in transactions {
        expected = match expected.checked_add(tx.amount) {
            Some(value) => value,
            None => break,
        };
        if tx.running_balance != expected {
            out.push(Discrepancy {
                transaction_id: tx.id,
                date: tx.date,
                expected,
                recorded: tx.running_balance,
            });
        }
    }
    out
}

fn overflow() -> EngineError {
    EngineError::InvalidAmount("balance out of range".to_string())
}
