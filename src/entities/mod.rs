//! Entity module - Contains all SeaORM entity definitions for the database.
//! These entities represent the database tables and their relationships.
//! Each entity has a Model struct for data and an Entity struct for operations.

pub mod claim;
pub mod listing;
pub mod provider;
pub mod receiver;

// Re-export specific types to avoid conflicts
pub use claim::{
    ClaimStatus, Column as ClaimColumn, Entity as Claim, MealType, Model as ClaimModel,
};
pub use listing::{Column as ListingColumn, Entity as Listing, Model as ListingModel};
pub use provider::{Column as ProviderColumn, Entity as Provider, Model as ProviderModel};
pub use receiver::{Column as ReceiverColumn, Entity as Receiver, Model as ReceiverModel};
