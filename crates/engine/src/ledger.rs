//! The application context handed to every command handler.
//!
//! `Ledger` owns the injected store and the cached [`Balance`]. The cache is
//! only ever replaced wholesale by [`Ledger::reload`] or advanced after the
//! store accepted a new transaction.

use chrono::Utc;
use chrono_tz::Tz;

use crate::{
    Balance, Discrepancy, EngineError, FileFormat, LedgerStore, Money, MonthlyReport,
    NewTransaction, ReportPeriod, ResultEngine, Transaction,
    balance::audit,
    export,
    import::{self, ImportOutcome, RunningBalancePolicy},
    validation::Entry,
};

#[derive(Debug)]
pub struct Ledger<S> {
    store: S,
    balance: Balance,
    policy: RunningBalancePolicy,
    timezone: Tz,
}

impl<S: LedgerStore> Ledger<S> {
    /// Return a builder for `Ledger`. Help to build the struct.
    pub fn builder(store: S) -> LedgerBuilder<S> {
        LedgerBuilder {
            store,
            policy: RunningBalancePolicy::default(),
            timezone: Tz::UTC,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn timezone(&self) -> Tz {
        self.timezone
    }

    pub fn policy(&self) -> RunningBalancePolicy {
        self.policy
    }

    /// Rebuilds the cached balance from the store.
    pub async fn reload(&mut self) -> ResultEngine<()> {
        self.balance = Balance::initialize(&self.store).await?;
        tracing::debug!(
            starting = ?self.balance.starting(),
            current = ?self.balance.current(),
            "ledger reloaded"
        );
        Ok(())
    }

    pub fn is_configured(&self) -> bool {
        self.balance.is_configured()
    }

    pub fn starting_balance(&self) -> Option<Money> {
        self.balance.starting()
    }

    pub fn current_balance(&self) -> ResultEngine<Money> {
        self.balance.current().ok_or(EngineError::NotConfigured)
    }

    /// Sets the starting balance. It can be set only once.
    pub async fn set_starting_balance(&mut self, amount: Money) -> ResultEngine<Money> {
        if self.balance.is_configured() {
            return Err(EngineError::AlreadyConfigured);
        }
        self.store.set_starting_balance(amount).await?;
        tracing::info!(%amount, "starting balance set");

        // Transactions imported before the setup count towards the balance.
        self.reload().await?;
        self.current_balance()
    }

    /// Records a validated entry dated now and returns the stored row.
    ///
    /// The new running balance is computed first, persisted with the row, and
    /// only then applied to the cache, so a store failure leaves the cache in
    /// sync with the store.
    pub async fn add_transaction(&mut self, entry: Entry) -> ResultEngine<Transaction> {
        let running_balance = self.balance.preview(entry.amount)?;

        let now = Utc::now();
        let stored = self
            .store
            .insert_transaction(NewTransaction {
                date: now,
                amount: entry.amount,
                category: entry.category,
                description: entry.description,
                running_balance,
                created_at: now,
            })
            .await?;

        self.balance.apply(stored.amount)?;
        tracing::info!(
            id = stored.id,
            amount = %stored.amount,
            category = %stored.category,
            balance = %stored.running_balance,
            "transaction added"
        );
        Ok(stored)
    }

    /// Every transaction, chronological.
    pub async fn transactions(&self) -> ResultEngine<Vec<Transaction>> {
        self.store.transactions().await
    }

    /// Expense breakdown for `period`; `None` when the month has no expenses.
    pub async fn monthly_report(&self, period: ReportPeriod) -> ResultEngine<Option<MonthlyReport>> {
        let transactions = self.store.transactions().await?;
        Ok(MonthlyReport::build(&transactions, period, self.timezone))
    }

    /// Dump of the whole ledger in `format`; `None` when it is empty.
    pub async fn export(&self, format: FileFormat) -> ResultEngine<Option<Vec<u8>>> {
        let transactions = self.store.transactions().await?;
        if transactions.is_empty() {
            return Ok(None);
        }
        export::export(format, &transactions, self.timezone).map(Some)
    }

    /// Rows whose stored running balance disagrees with the derived one.
    /// Empty while the ledger is not configured.
    pub async fn audit(&self) -> ResultEngine<Vec<Discrepancy>> {
        let Some(starting) = self.store.starting_balance().await? else {
            return Ok(Vec::new());
        };
        let transactions = self.store.transactions().await?;
        Ok(audit(starting, &transactions))
    }

    /// Validates and imports a CSV or xlsx file.
    ///
    /// Nothing is written when validation fails. Once rows start landing the
    /// cache is reloaded whatever happens, so it reflects a partial import
    /// too.
    pub async fn import_file(
        &mut self,
        format: FileFormat,
        data: &[u8],
    ) -> ResultEngine<ImportOutcome> {
        let rows = import::read(format, data, self.timezone)?;
        let opening = self.balance.current();

        let replayed = import::replay(&self.store, rows, self.policy, opening).await;
        if let Err(err) = self.reload().await {
            tracing::error!("failed to reload ledger after import: {err}");
        }
        let mut outcome = replayed?;

        match self.audit().await {
            Ok(found) => {
                if !found.is_empty() {
                    tracing::warn!(
                        count = found.len(),
                        "running balances disagree with the ledger after import"
                    );
                }
                outcome.discrepancies = found.len();
            }
            Err(err) => tracing::warn!("post-import audit failed: {err}"),
        }

        tracing::info!(
            total = outcome.total,
            imported = outcome.imported,
            complete = outcome.is_complete(),
            "import finished"
        );
        Ok(outcome)
    }
}

/// The builder for `Ledger`
pub struct LedgerBuilder<S> {
    store: S,
    policy: RunningBalancePolicy,
    timezone: Tz,
}

impl<S: LedgerStore> LedgerBuilder<S> {
    pub fn policy(mut self, policy: RunningBalancePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Timezone used for month boundaries and naive import timestamps.
    pub fn timezone(mut self, timezone: Tz) -> Self {
        self.timezone = timezone;
        self
    }

    /// Construct `Ledger` and load its state from the store.
    pub async fn build(self) -> ResultEngine<Ledger<S>> {
        let mut ledger = Ledger {
            store: self.store,
            balance: Balance::default(),
            policy: self.policy,
            timezone: self.timezone,
        };
        ledger.reload().await?;
        Ok(ledger)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Category, MemoryStore, validation::validate_entry};

    async fn configured(store: MemoryStore) -> Ledger<MemoryStore> {
        Ledger::builder(store).build().await.unwrap()
    }

    #[tokio::test]
    async fn failed_insert_keeps_cache_in_sync() {
        let store = MemoryStore::with_starting_balance(Money::new(100_000)).fail_inserts_after(1);
        let mut ledger = configured(store).await;

        ledger
            .add_transaction(validate_entry("-50", "Food", "Lunch").unwrap())
            .await
            .unwrap();
        let err = ledger
            .add_transaction(validate_entry("-20", "Transport", "Bus").unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::Database(_)));
        assert_eq!(ledger.current_balance().unwrap(), Money::new(95_000));
    }

    #[tokio::test]
    async fn set_starting_balance_counts_earlier_imports() {
        let mut ledger = configured(MemoryStore::new()).await;
        let data = "\
date,amount,category,description,running_balance,created_at
2024-03-01,-50,Food,Lunch,-50,2024-03-01
";
        let outcome = ledger.import_file(FileFormat::Csv, data.as_bytes()).await.unwrap();
        assert_eq!(outcome.imported, 1);
        assert_eq!(ledger.current_balance(), Err(EngineError::NotConfigured));

        let balance = ledger.set_starting_balance(Money::new(100_000)).await.unwrap();
        assert_eq!(balance, Money::new(95_000));
        assert_eq!(ledger.starting_balance(), Some(Money::new(100_000)));
    }

    #[tokio::test]
    async fn trusted_import_reports_drift() {
        let mut ledger = configured(MemoryStore::with_starting_balance(Money::new(100_000))).await;
        let data = "\
date,amount,category,description,running_balance,created_at
2024-03-01,-50,Food,Lunch,950,2024-03-01
2024-03-02,-50,Food,Dinner,123,2024-03-02
";
        let outcome = ledger.import_file(FileFormat::Csv, data.as_bytes()).await.unwrap();
        assert_eq!(outcome.imported, 2);
        assert_eq!(outcome.discrepancies, 1);
        assert_eq!(ledger.current_balance().unwrap(), Money::new(90_000));

        let found = ledger.audit().await.unwrap();
        assert_eq!(found[0].expected, Money::new(90_000));
        assert_eq!(found[0].recorded, Money::new(12_300));
    }

    #[tokio::test]
    async fn partial_import_reloads_cache() {
        let store = MemoryStore::with_starting_balance(Money::new(100_000)).fail_inserts_after(1);
        let mut ledger = configured(store).await;
        let data = "\
date,amount,category,description,running_balance,created_at
2024-03-01,-50,Food,Lunch,950,2024-03-01
2024-03-02,-50,Food,Dinner,900,2024-03-02
";
        let outcome = ledger.import_file(FileFormat::Csv, data.as_bytes()).await.unwrap();
        assert_eq!(outcome.imported, 1);
        assert!(!outcome.is_complete());
        assert_eq!(ledger.current_balance().unwrap(), Money::new(95_000));
        assert_eq!(ledger.transactions().await.unwrap()[0].category, Category::Food);
    }
}
