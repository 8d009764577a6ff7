//! Claim entity - A receiver's request against a listing.
//!
//! Claims are created `Pending` and move exactly once to `Completed` or `Cancelled`.
//! Status and meal type are stored as their display strings.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle status of a claim
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum ClaimStatus {
    /// Awaiting pickup
    #[sea_orm(string_value = "Pending")]
    Pending,
    /// Food was handed over
    #[sea_orm(string_value = "Completed")]
    Completed,
    /// Claim was withdrawn
    #[sea_orm(string_value = "Cancelled")]
    Cancelled,
}

impl ClaimStatus {
    /// Returns true for statuses with no outgoing transitions.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }

    /// Stored and displayed name of the status.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Completed => "Completed",
            Self::Cancelled => "Cancelled",
        }
    }
}

impl fmt::Display for ClaimStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Meal the claimed food is intended for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum MealType {
    /// Breakfast
    #[sea_orm(string_value = "Breakfast")]
    Breakfast,
    /// Lunch
    #[sea_orm(string_value = "Lunch")]
    Lunch,
    /// Dinner
    #[sea_orm(string_value = "Dinner")]
    Dinner,
    /// Snacks
    #[sea_orm(string_value = "Snacks")]
    Snacks,
}

impl MealType {
    /// Stored and displayed name of the meal type.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Breakfast => "Breakfast",
            Self::Lunch => "Lunch",
            Self::Dinner => "Dinner",
            Self::Snacks => "Snacks",
        }
    }
}

impl fmt::Display for MealType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Claim database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "claims")]
pub struct Model {
    /// Unique identifier for the claim
    #[sea_orm(primary_key)]
    pub id: i64,
    /// ID of the listing being claimed
    pub listing_id: i64,
    /// ID of the claiming receiver
    pub receiver_id: i64,
    /// Current lifecycle status
    pub status: ClaimStatus,
    /// Intended meal
    pub meal_type: MealType,
    /// When the claim was created
    pub created_at: DateTimeUtc,
}

/// Defines relationships between Claim and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each claim targets one listing
    #[sea_orm(
        belongs_to = "super::listing::Entity",
        from = "Column::ListingId",
        to = "super::listing::Column::Id"
    )]
    Listing,
    /// Each claim is made by one receiver
    #[sea_orm(
        belongs_to = "super::receiver::Entity",
        from = "Column::ReceiverId",
        to = "super::receiver::Column::Id"
    )]
    Receiver,
}

impl Related<super::listing::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Listing.def()
    }
}

impl Related<super::receiver::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Receiver.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
