//! Key/value settings table. The ledger only uses `starting_balance`.

use sea_orm::entity::prelude::*;

pub(crate) const STARTING_BALANCE_KEY: &str = "starting_balance";

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "settings")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub key: String,
    pub value: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
