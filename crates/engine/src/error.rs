//! The module contains the errors the engine can throw.
//!
//! The errors are grouped by how the command layer reports them:
//!
//! - [`AlreadyConfigured`] / [`NotConfigured`]: the starting balance state
//!   forbids the operation.
//! - [`InvalidAmount`], [`InvalidCategory`], [`InvalidPeriod`],
//!   [`InvalidTimestamp`]: malformed user input, nothing was mutated.
//! - [`ValidationFailed`]: an import file was rejected, carrying every
//!   violation found.
//! - [`Database`]: the ledger store is unavailable.
//!
//!  [`AlreadyConfigured`]: EngineError::AlreadyConfigured
//!  [`NotConfigured`]: EngineError::NotConfigured
//!  [`InvalidAmount`]: EngineError::InvalidAmount
//!  [`InvalidCategory`]: EngineError::InvalidCategory
//!  [`InvalidPeriod`]: EngineError::InvalidPeriod
//!  [`InvalidTimestamp`]: EngineError::InvalidTimestamp
//!  [`ValidationFailed`]: EngineError::ValidationFailed
//!  [`Database`]: EngineError::Database
use sea_orm::DbErr;
use thiserror::Error;

/// Engine custom errors.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("starting balance already set")]
    AlreadyConfigured,
    #[error("starting balance not set")]
    NotConfigured,
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
    #[error("Invalid category: {0}")]
    InvalidCategory(String),
    #[error("Invalid period: {0}")]
    InvalidPeriod(String),
    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(String),
    #[error("import rejected with {} error(s)", .0.len())]
    ValidationFailed(Vec<String>),
    #[error("Export failed: {0}")]
    Export(String),
    #[error(transparent)]
    Database(#[from] DbErr),
}

impl PartialEq for EngineError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::AlreadyConfigured, Self::AlreadyConfigured) => true,
            (Self::NotConfigured, Self::NotConfigured) => true,
            (Self::InvalidAmount(a), Self::InvalidAmount(b)) => a == b,
            (Self::InvalidCategory(a), Self::InvalidCategory(b)) => a == b,
            (Self::InvalidPeriod(a), Self::InvalidPeriod(b)) => a == b,
            (Self::InvalidTimestamp(a), Self::InvalidTimestamp(b)) => a == b,
            (Self::ValidationFailed(a), Self::ValidationFailed(b)) => a == b,
            (Self::Export(a), Self::Export(b)) => a == b,
            (Self::Database(a), Self::Database(b)) => a.to_string() == b.to_string(),
            _ => false,
        }
    }
}
