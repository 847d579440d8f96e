//! Personal ledger engine.
//!
//! A single-user ledger: a starting balance plus an append-only log of
//! signed transactions. The engine derives the balance from that log,
//! validates new entries and import files (CSV or xlsx), replays imports into the store
//! and builds monthly expense reports. Persistence goes through the
//! [`LedgerStore`] trait so the same code runs on a database or in memory.

pub use balance::{Balance, Discrepancy};
pub use category::Category;
pub use error::EngineError;
pub use file_format::FileFormat;
pub use import::{ImportFailure, ImportOutcome, RunningBalancePolicy};
pub use ledger::{Ledger, LedgerBuilder};
pub use money::Money;
pub use report::{CategoryBreakdown, MonthlyReport, ReportPeriod};
pub use store::{DbStore, LedgerStore, MemoryStore};
pub use transactions::{NewTransaction, Transaction};
pub use validation::{Entry, REQUIRED_COLUMNS, validate_entry};

pub mod balance;
mod category;
mod error;
pub mod export;
mod file_format;
pub mod import;
mod ledger;
mod money;
pub mod report;
mod settings;
mod store;
mod transactions;
pub mod validation;

pub type ResultEngine<T> = Result<T, EngineError>;
