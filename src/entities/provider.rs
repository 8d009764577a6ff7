//! Provider entity - An organisation donating surplus food.
//!
//! Providers are registered explicitly or implicitly when their first listing is created.
//! They are never deleted automatically and own zero or more listings.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Provider database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "providers")]
pub struct Model {
    /// Unique, stable identifier for the provider
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Display name (e.g., "`FreshMart`")
    pub name: String,
    /// Free-text kind of provider (e.g., "Restaurant", "Grocery Store")
    pub provider_type: String,
    /// City the provider operates in
    pub city: String,
    /// Phone number or email address
    pub contact: String,
}

/// Defines relationships between Provider and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One provider has many listings
    #[sea_orm(has_many = "super::listing::Entity")]
    Listings,
}

impl Related<super::listing::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Listings.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
