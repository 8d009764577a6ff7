//! Receiver entity - An organisation or person claiming donated food.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Receiver database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "receivers")]
pub struct Model {
    /// Unique identifier for the receiver
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Display name (e.g., "`FoodBankNY`")
    pub name: String,
    /// City the receiver collects in
    pub city: String,
    /// Phone number or email address
    pub contact: String,
}

/// Defines relationships between Receiver and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One receiver has many claims
    #[sea_orm(has_many = "super::claim::Entity")]
    Claims,
}

impl Related<super::claim::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Claims.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
