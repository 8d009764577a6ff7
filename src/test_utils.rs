//! Shared test utilities for `food-share`.
//!
//! This module provides common helper functions for setting up test databases
//! and creating test entities with sensible defaults.

use crate::{
    core::{
        claim::ClaimLifecycle,
        listing::{self, ListingDetails},
        provider::{self, NewProvider},
        receiver::{self, NewReceiver},
    },
    entities::{self, MealType},
    errors::Result,
};
use sea_orm::DatabaseConnection;

/// Creates an in-memory `SQLite` database with all tables initialized.
/// This is the standard setup for all integration tests.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

/// Creates a test provider with sensible defaults.
///
/// # Defaults
/// * `provider_type`: "Grocery Store"
/// * `city`: "New York"
/// * `contact`: "555-0100"
pub async fn create_test_provider(
    db: &DatabaseConnection,
    name: &str,
) -> Result<entities::provider::Model> {
    create_custom_provider(db, name, "Grocery Store", "New York").await
}

/// Creates a test provider with a custom type and city.
pub async fn create_custom_provider(
    db: &DatabaseConnection,
    name: &str,
    provider_type: &str,
    city: &str,
) -> Result<entities::provider::Model> {
    provider::register_provider(
        db,
        NewProvider {
            name: name.to_string(),
            provider_type: provider_type.to_string(),
            city: city.to_string(),
            contact: "555-0100".to_string(),
        },
    )
    .await
}

/// Creates a test receiver in "New York".
pub async fn create_test_receiver(
    db: &DatabaseConnection,
    name: &str,
) -> Result<entities::receiver::Model> {
    create_custom_receiver(db, name, "New York").await
}

/// Creates a test receiver in a custom city.
pub async fn create_custom_receiver(
    db: &DatabaseConnection,
    name: &str,
    city: &str,
) -> Result<entities::receiver::Model> {
    receiver::register_receiver(
        db,
        NewReceiver {
            name: name.to_string(),
            city: city.to_string(),
            contact: "555-0199".to_string(),
        },
    )
    .await
}

/// Creates a "Bread" listing that inherits the provider's city and type.
pub async fn create_test_listing(
    db: &DatabaseConnection,
    provider_id: i64,
    quantity: i64,
) -> Result<entities::listing::Model> {
    listing::create_listing(
        db,
        provider_id,
        ListingDetails {
            food_type: "Bread".to_string(),
            quantity,
            city: None,
            provider_type: None,
        },
    )
    .await
}

/// Creates a listing with a custom food type and city.
pub async fn create_custom_listing(
    db: &DatabaseConnection,
    provider_id: i64,
    food_type: &str,
    quantity: i64,
    city: &str,
) -> Result<entities::listing::Model> {
    listing::create_listing(
        db,
        provider_id,
        ListingDetails {
            food_type: food_type.to_string(),
            quantity,
            city: Some(city.to_string()),
            provider_type: None,
        },
    )
    .await
}

/// Creates a `Pending` lunch claim under the default quantity policy.
pub async fn create_test_claim(
    db: &DatabaseConnection,
    listing_id: i64,
    receiver_id: i64,
) -> Result<entities::claim::Model> {
    create_custom_claim(db, listing_id, receiver_id, MealType::Lunch).await
}

/// Creates a `Pending` claim for a custom meal type.
pub async fn create_custom_claim(
    db: &DatabaseConnection,
    listing_id: i64,
    receiver_id: i64,
    meal_type: MealType,
) -> Result<entities::claim::Model> {
    ClaimLifecycle::default()
        .create_claim(db, listing_id, receiver_id, meal_type)
        .await
}
