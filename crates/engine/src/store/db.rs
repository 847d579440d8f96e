use sea_orm::{ActiveValue, DatabaseConnection, QueryOrder, TransactionTrait, prelude::*};

use crate::{
    EngineError, Money, NewTransaction, ResultEngine, Transaction,
    settings::{self, STARTING_BALANCE_KEY},
    transactions,
};

use super::LedgerStore;

/// Ledger store backed by a sea-orm connection.
#[derive(Clone, Debug)]
pub struct DbStore {
    database: DatabaseConnection,
}

impl DbStore {
    pub fn new(database: DatabaseConnection) -> Self {
        Self { database }
    }
}

impl LedgerStore for DbStore {
    async fn starting_balance(&self) -> ResultEngine<Option<Money>> {
        let model = settings::Entity::find_by_id(STARTING_BALANCE_KEY.to_string())
            .one(&self.database)
            .await?;

        model.map(|m| m.value.parse::<Money>()).transpose()
    }

    async fn set_starting_balance(&self, amount: Money) -> ResultEngine<()> {
        let db_tx = self.database.begin().await?;

        let existing = settings::Entity::find_by_id(STARTING_BALANCE_KEY.to_string())
            .one(&db_tx)
            .await?;
        if existing.is_some() {
            return Err(EngineError::AlreadyConfigured);
        }

        settings::ActiveModel {
            key: ActiveValue::Set(STARTING_BALANCE_KEY.to_string()),
            value: ActiveValue::Set(amount.to_string()),
        }
        .insert(&db_tx)
        .await?;

        db_tx.commit().await?;
        Ok(())
    }

    async fn insert_transaction(&self, tx: NewTransaction) -> ResultEngine<Transaction> {
        let model = transactions::ActiveModel::from(&tx)
            .insert(&self.database)
            .await?;
        Transaction::try_from(model)
    }

    async fn transactions(&self) -> ResultEngine<Vec<Transaction>> {
        transactions::Entity::find()
            .order_by_asc(transactions::Column::Date)
            .order_by_asc(transactions::Column::Id)
            .all(&self.database)
            .await?
            .into_iter()
            .map(Transaction::try_from)
            .collect()
    }
}
