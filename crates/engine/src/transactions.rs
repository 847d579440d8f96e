//! Transaction primitives.
//!
//! A `Transaction` is an immutable ledger row: once stored it is never
//! updated or deleted. `running_balance` is the balance snapshot right after
//! the transaction is applied in chronological order.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};

use crate::{Category, EngineError, Money};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Transaction {
    pub id: i32,
    pub date: DateTime<Utc>,
    pub amount: Money,
    pub category: Category,
    pub description: String,
    pub running_balance: Money,
    pub created_at: DateTime<Utc>,
}

impl Transaction {
    pub fn is_expense(&self) -> bool {
        self.amount.is_negative()
    }
}

/// A transaction not yet persisted; the store assigns the id.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewTransaction {
    pub date: DateTime<Utc>,
    pub amount: Money,
    pub category: Category,
    pub description: String,
    pub running_balance: Money,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "transactions")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub date: DateTimeUtc,
    pub amount: i64,
    pub category: String,
    pub description: String,
    pub running_balance: i64,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<&NewTransaction> for ActiveModel {
    fn from(tx: &NewTransaction) -> Self {
        Self {
            id: ActiveValue::NotSet,
            date: ActiveValue::Set(tx.date),
            amount: ActiveValue::Set(tx.amount.cents()),
            category: ActiveValue::Set(tx.category.as_str().to_string()),
            description: ActiveValue::Set(tx.description.clone()),
            running_balance: ActiveValue::Set(tx.running_balance.cents()),
            created_at: ActiveValue::Set(tx.created_at),
        }
    }
}

impl TryFrom<Model> for Transaction {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: model.id,
            date: model.date,
            amount: Money::new(model.amount),
            category: model.category.parse()?,
            description: model.description,
            running_balance: Money::new(model.running_balance),
            created_at: model.created_at,
        })
    }
}

impl NewTransaction {
    /// Attaches a store-assigned id.
    pub fn into_transaction(self, id: i32) -> Transaction {
        Transaction {
            id,
            date: self.date,
            amount: self.amount,
            category: self.category,
            description: self.description,
            running_balance: self.running_balance,
            created_at: self.created_at,
        }
    }
}
