//! Listing entity - A quantity of one food type offered by a provider.
//!
//! `provider_type` is a denormalized copy of the provider's type taken when the
//! listing was created, so later edits to the provider do not rewrite history.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Listing database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "food_listings")]
pub struct Model {
    /// Unique identifier for the listing
    #[sea_orm(primary_key)]
    pub id: i64,
    /// ID of the provider offering this food
    pub provider_id: i64,
    /// Kind of food (e.g., "Bread", "Rice")
    pub food_type: String,
    /// Units available, never negative
    pub quantity: i64,
    /// City where the food can be collected
    pub city: String,
    /// Provider type at the time of listing
    pub provider_type: String,
}

/// Defines relationships between Listing and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each listing belongs to one provider
    #[sea_orm(
        belongs_to = "super::provider::Entity",
        from = "Column::ProviderId",
        to = "super::provider::Column::Id"
    )]
    Provider,
    /// One listing has many claims
    #[sea_orm(has_many = "super::claim::Entity")]
    Claims,
}

impl Related<super::provider::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Provider.def()
    }
}

impl Related<super::claim::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Claims.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
