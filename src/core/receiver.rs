//! Receiver registration and lookup.

use crate::{
    entities::{Receiver, receiver},
    errors::{Error, Result},
};
use sea_orm::{ActiveModelTrait, ConnectionTrait, EntityTrait, Set};
use tracing::{info, instrument};

/// Details for registering a receiver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewReceiver {
    /// Display name, must not be blank
    pub name: String,
    /// City of collection
    pub city: String,
    /// Phone number or email address
    pub contact: String,
}

/// Registers a receiver after trimming and validating its name.
///
/// # Errors
/// Returns `Error::Validation` for a blank name, or `Error::Storage` if the insert fails.
#[instrument(skip(db))]
pub async fn register_receiver<C>(db: &C, new: NewReceiver) -> Result<receiver::Model>
where
    C: ConnectionTrait,
{
    let name = new.name.trim();
    if name.is_empty() {
        return Err(Error::Validation {
            message: "Receiver name cannot be empty".to_string(),
        });
    }

    let receiver = receiver::ActiveModel {
        name: Set(name.to_string()),
        city: Set(new.city.trim().to_string()),
        contact: Set(new.contact.trim().to_string()),
        ..Default::default()
    }
    .insert(db)
    .await?;

    info!(receiver_id = receiver.id, "Registered receiver '{}'", receiver.name);
    Ok(receiver)
}

/// Finds a receiver by ID.
pub async fn get_receiver<C>(db: &C, receiver_id: i64) -> Result<Option<receiver::Model>>
where
    C: ConnectionTrait,
{
    Receiver::find_by_id(receiver_id)
        .one(db)
        .await
        .map_err(Into::into)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::*;

    #[tokio::test]
    async fn test_register_and_get_receiver() -> Result<()> {
        let db = setup_test_db().await?;

        let receiver = create_test_receiver(&db, "FoodBankNY").await?;

        assert_eq!(receiver.name, "FoodBankNY");
        assert_eq!(get_receiver(&db, receiver.id).await?, Some(receiver));
        assert_eq!(get_receiver(&db, 999).await?, None);
        Ok(())
    }

    #[tokio::test]
    async fn test_register_receiver_rejects_blank_name() -> Result<()> {
        let db = setup_test_db().await?;

        let result = register_receiver(
            &db,
            NewReceiver {
                name: String::new(),
                city: "Austin".to_string(),
                contact: "555-0100".to_string(),
            },
        )
        .await;

        assert!(matches!(result, Err(Error::Validation { .. })));
        Ok(())
    }
}
