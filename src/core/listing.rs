//! Listing business logic - Creating, adjusting, removing and browsing food listings.
//!
//! Quantities are never negative. A listing copies its provider's type and city at
//! creation time unless the caller overrides them. A listing referenced by any claim
//! cannot be deleted.

use crate::{
    core::{
        provider::{NewProvider, register_provider},
        query::{FieldRef, Filter, JoinSpec, QuerySpec, SortOrder},
        schema::EntityKind,
    },
    entities::{Claim, Listing, Provider, claim, listing, provider},
    errors::{Error, Result},
};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    FromQueryResult, PaginatorTrait, QueryFilter, Set, TransactionTrait,
};
use serde::Serialize;
use tracing::{info, instrument};

/// What is being offered; the owning provider is passed separately.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingDetails {
    /// Kind of food, must not be blank
    pub food_type: String,
    /// Units available, zero or more
    pub quantity: i64,
    /// Collection city; defaults to the provider's city
    pub city: Option<String>,
    /// Provider type to record; defaults to the provider's type
    pub provider_type: Option<String>,
}

/// Optional conditions for [`search_listings`]. Unset fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListingFilter {
    /// Exact collection city
    pub city: Option<String>,
    /// Owning provider ID
    pub provider_id: Option<i64>,
    /// Exact provider name
    pub provider_name: Option<String>,
    /// Exact food type
    pub food_type: Option<String>,
    /// Maximum number of listings returned
    pub limit: Option<u64>,
}

/// A listing joined with its provider's name and contact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromQueryResult)]
pub struct ListingView {
    /// Listing ID
    pub listing_id: i64,
    /// Kind of food
    pub food_type: String,
    /// Units available
    pub quantity: i64,
    /// Provider type recorded on the listing
    pub provider_type: String,
    /// Collection city
    pub city: String,
    /// Provider name, if the provider row still exists
    pub provider_name: Option<String>,
    /// Provider contact, if the provider row still exists
    pub provider_contact: Option<String>,
}

const fn validate_quantity(quantity: i64) -> Result<()> {
    if quantity < 0 {
        return Err(Error::InvalidQuantity { quantity });
    }
    Ok(())
}

/// Creates a listing for an existing provider.
///
/// # Errors
/// * `Error::InvalidQuantity` - quantity is negative
/// * `Error::Validation` - food type is blank
/// * `Error::NotFound` - the provider does not exist
#[instrument(skip(db))]
pub async fn create_listing<C>(
    db: &C,
    provider_id: i64,
    details: ListingDetails,
) -> Result<listing::Model>
where
    C: ConnectionTrait,
{
    validate_quantity(details.quantity)?;
    let food_type = details.food_type.trim();
    if food_type.is_empty() {
        return Err(Error::Validation {
            message: "Food type cannot be empty".to_string(),
        });
    }

    let provider = Provider::find_by_id(provider_id)
        .one(db)
        .await?
        .ok_or(Error::NotFound {
            entity: EntityKind::Provider,
            id: provider_id,
        })?;

    let listing = listing::ActiveModel {
        provider_id: Set(provider.id),
        food_type: Set(food_type.to_string()),
        quantity: Set(details.quantity),
        city: Set(details.city.unwrap_or(provider.city)),
        provider_type: Set(details.provider_type.unwrap_or(provider.provider_type)),
        ..Default::default()
    }
    .insert(db)
    .await?;

    info!(
        listing_id = listing.id,
        provider_id, "Created listing of {} x{}", listing.food_type, listing.quantity
    );
    Ok(listing)
}

/// Registers a provider and creates its first listing in one transaction.
///
/// Nothing is stored if either step fails.
pub async fn create_listing_with_new_provider(
    db: &DatabaseConnection,
    new_provider: NewProvider,
    details: ListingDetails,
) -> Result<(provider::Model, listing::Model)> {
    let txn = db.begin().await?;

    let provider = register_provider(&txn, new_provider).await?;
    let listing = create_listing(&txn, provider.id, details).await?;

    txn.commit().await?;
    Ok((provider, listing))
}

/// Finds a listing by ID.
pub async fn get_listing<C>(db: &C, listing_id: i64) -> Result<Option<listing::Model>>
where
    C: ConnectionTrait,
{
    Listing::find_by_id(listing_id)
        .one(db)
        .await
        .map_err(Into::into)
}

/// Sets a listing's quantity.
///
/// # Errors
/// Returns `Error::InvalidQuantity` for a negative quantity, `Error::NotFound` if the
/// listing does not exist.
#[instrument(skip(db))]
pub async fn update_listing_quantity<C>(
    db: &C,
    listing_id: i64,
    quantity: i64,
) -> Result<listing::Model>
where
    C: ConnectionTrait,
{
    validate_quantity(quantity)?;

    let result = Listing::update_many()
        .col_expr(listing::Column::Quantity, Expr::value(quantity))
        .filter(listing::Column::Id.eq(listing_id))
        .exec(db)
        .await?;

    if result.rows_affected == 0 {
        return Err(Error::NotFound {
            entity: EntityKind::Listing,
            id: listing_id,
        });
    }

    info!(listing_id, quantity, "Updated listing quantity");
    get_listing(db, listing_id).await?.ok_or(Error::NotFound {
        entity: EntityKind::Listing,
        id: listing_id,
    })
}

/// Deletes a listing that no claim references.
///
/// # Errors
/// Returns `Error::NotFound` if the listing does not exist, `Error::ListingHasClaims`
/// if claims still reference it.
#[instrument(skip(db))]
pub async fn delete_listing(db: &DatabaseConnection, listing_id: i64) -> Result<()> {
    let txn = db.begin().await?;

    let claims = Claim::find()
        .filter(claim::Column::ListingId.eq(listing_id))
        .count(&txn)
        .await?;
    if claims > 0 {
        return Err(Error::ListingHasClaims { listing_id, claims });
    }

    let result = Listing::delete_by_id(listing_id).exec(&txn).await?;
    if result.rows_affected == 0 {
        return Err(Error::NotFound {
            entity: EntityKind::Listing,
            id: listing_id,
        });
    }

    txn.commit().await?;
    info!(listing_id, "Deleted listing");
    Ok(())
}

/// Lists listings matching `filter`, newest first, with provider name and contact.
pub async fn search_listings<C>(db: &C, filter: &ListingFilter) -> Result<Vec<ListingView>>
where
    C: ConnectionTrait,
{
    let listing_field = |name: &str| FieldRef::new(EntityKind::Listing, name);
    let provider_field = |name: &str| FieldRef::new(EntityKind::Provider, name);

    let mut spec = QuerySpec::new(EntityKind::Listing)
        .join(JoinSpec::left(EntityKind::Listing, EntityKind::Provider))
        .column(listing_field("id"), "listing_id")
        .column(listing_field("food_type"), "food_type")
        .column(listing_field("quantity"), "quantity")
        .column(listing_field("provider_type"), "provider_type")
        .column(listing_field("city"), "city")
        .column(provider_field("name"), "provider_name")
        .column(provider_field("contact"), "provider_contact")
        .order_by(listing_field("id"), SortOrder::Desc);

    if let Some(city) = &filter.city {
        spec = spec.filter(Filter::equals(listing_field("city"), city.as_str()));
    }
    if let Some(provider_id) = filter.provider_id {
        spec = spec.filter(Filter::equals(listing_field("provider_id"), provider_id));
    }
    if let Some(name) = &filter.provider_name {
        spec = spec.filter(Filter::equals(provider_field("name"), name.as_str()));
    }
    if let Some(food_type) = &filter.food_type {
        spec = spec.filter(Filter::equals(listing_field("food_type"), food_type.as_str()));
    }
    if let Some(limit) = filter.limit {
        spec = spec.limit(limit);
    }

    spec.build(db.get_database_backend())?.fetch_all(db).await
}
