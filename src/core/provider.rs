//! Provider registration and lookup.

use crate::{
    entities::{Provider, provider},
    errors::{Error, Result},
};
use sea_orm::{ActiveModelTrait, ConnectionTrait, EntityTrait, Set};
use tracing::{info, instrument};

/// Details for registering a provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewProvider {
    /// Display name, must not be blank
    pub name: String,
    /// Free-text provider kind (e.g., "Restaurant")
    pub provider_type: String,
    /// City of operation
    pub city: String,
    /// Phone number or email address
    pub contact: String,
}

/// Registers a provider after trimming and validating its name.
///
/// # Errors
/// Returns `Error::Validation` for a blank name, or `Error::Storage` if the insert fails.
#[instrument(skip(db))]
pub async fn register_provider<C>(db: &C, new: NewProvider) -> Result<provider::Model>
where
    C: ConnectionTrait,
{
    let name = new.name.trim();
    if name.is_empty() {
        return Err(Error::Validation {
            message: "Provider name cannot be empty".to_string(),
        });
    }

    let provider = provider::ActiveModel {
        name: Set(name.to_string()),
        provider_type: Set(new.provider_type.trim().to_string()),
        city: Set(new.city.trim().to_string()),
        contact: Set(new.contact.trim().to_string()),
        ..Default::default()
    }
    .insert(db)
    .await?;

    info!(provider_id = provider.id, "Registered provider '{}'", provider.name);
    Ok(provider)
}

/// Finds a provider by ID.
pub async fn get_provider<C>(db: &C, provider_id: i64) -> Result<Option<provider::Model>>
where
    C: ConnectionTrait,
{
    Provider::find_by_id(provider_id)
        .one(db)
        .await
        .map_err(Into::into)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::*;

    #[tokio::test]
    async fn test_register_provider_trims_fields() -> Result<()> {
        let db = setup_test_db().await?;

        let provider = register_provider(
            &db,
            NewProvider {
                name: "  FreshMart ".to_string(),
                provider_type: "Grocery Store".to_string(),
                city: " New York".to_string(),
                contact: "fresh@example.com".to_string(),
            },
        )
        .await?;

        assert_eq!(provider.name, "FreshMart");
        assert_eq!(provider.city, "New York");
        assert_eq!(get_provider(&db, provider.id).await?, Some(provider));
        Ok(())
    }

    #[tokio::test]
    async fn test_register_provider_rejects_blank_name() -> Result<()> {
        let db = setup_test_db().await?;

        let result = register_provider(
            &db,
            NewProvider {
                name: "   ".to_string(),
                provider_type: "Restaurant".to_string(),
                city: "Austin".to_string(),
                contact: "555-0100".to_string(),
            },
        )
        .await;

        assert!(matches!(result, Err(Error::Validation { .. })));
        Ok(())
    }
}
