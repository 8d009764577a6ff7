//! Database configuration module for `food-share`.
//!
//! This module handles `SQLite` database connection and table creation using `SeaORM`.
//! Tables are generated from the entity definitions with `Schema::create_table_from_entity`,
//! and [`verify_schema`] checks the live store against the declared schema model so a
//! mismatched database is rejected at startup instead of failing mid-report.

use crate::core::schema::EntityKind;
use crate::entities::{Claim, Listing, Provider, Receiver};
use crate::errors::{Error, Result};
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, DbBackend, Schema, Statement};
use tracing::{debug, info, instrument, warn};

/// Default database location used when neither the settings file nor `DATABASE_URL` names one.
pub const DEFAULT_DATABASE_URL: &str = "sqlite://data/food_share.sqlite?mode=rwc";

/// Gets the database URL from the environment, falling back to `fallback`.
#[must_use]
pub fn get_database_url(fallback: &str) -> String {
    std::env::var("DATABASE_URL").unwrap_or_else(|_| fallback.to_string())
}

/// Establishes a pooled connection to the database at `database_url`.
///
/// The returned handle is passed explicitly to every operation; connections are
/// acquired from and released back to the pool per statement or transaction.
#[instrument]
pub async fn create_connection(database_url: &str) -> Result<DatabaseConnection> {
    debug!("Connecting to database");
    Database::connect(database_url).await.map_err(Into::into)
}

/// Creates all tables, with foreign keys, from the entity definitions if they are missing.
///
/// Referenced tables are created first so the foreign keys resolve.
#[instrument(skip(db))]
pub async fn create_tables(db: &DatabaseConnection) -> Result<()> {
    let builder = db.get_database_backend();
    let schema = Schema::new(builder);

    let mut provider_table = schema.create_table_from_entity(Provider);
    let mut receiver_table = schema.create_table_from_entity(Receiver);
    let mut listing_table = schema.create_table_from_entity(Listing);
    let mut claim_table = schema.create_table_from_entity(Claim);

    provider_table.if_not_exists();
    receiver_table.if_not_exists();
    listing_table.if_not_exists();
    claim_table.if_not_exists();

    db.execute(builder.build(&provider_table)).await?;
    db.execute(builder.build(&receiver_table)).await?;
    db.execute(builder.build(&listing_table)).await?;
    db.execute(builder.build(&claim_table)).await?;

    info!("Database tables ensured");
    Ok(())
}

/// Compares every declared table with the live store and fails on missing columns.
///
/// Only `SQLite` exposes `PRAGMA table_info`; other backends are skipped with a warning.
///
/// # Errors
/// Returns `Error::SchemaMismatch` naming the first table with missing columns (a missing
/// table reports all of its columns), or `Error::Storage` if the inspection fails.
#[instrument(skip(db))]
pub async fn verify_schema<C>(db: &C) -> Result<()>
where
    C: ConnectionTrait,
{
    let backend = db.get_database_backend();
    if backend != DbBackend::Sqlite {
        warn!(?backend, "Schema verification is only implemented for SQLite");
        return Ok(());
    }

    for entity in EntityKind::ALL {
        let table = entity.table_name();
        let rows = db
            .query_all(Statement::from_string(
                backend,
                format!("PRAGMA table_info(\"{table}\")"),
            ))
            .await?;

        let mut present = Vec::with_capacity(rows.len());
        for row in &rows {
            present.push(row.try_get::<String>("", "name")?);
        }

        let missing: Vec<String> = entity
            .fields()
            .iter()
            .filter(|field| !present.iter().any(|name| name == field.name))
            .map(|field| field.name.to_string())
            .collect();

        if !missing.is_empty() {
            return Err(Error::SchemaMismatch {
                table: table.to_string(),
                missing,
            });
        }
        debug!(table, columns = present.len(), "Table matches declared schema");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{ClaimModel, ListingModel, ProviderModel, ReceiverModel};
    use sea_orm::{EntityTrait, QuerySelect};

    #[tokio::test]
    async fn test_create_tables() -> Result<()> {
        let db = Database::connect("sqlite::memory:").await?;
        create_tables(&db).await?;

        // Test that tables exist by querying them
        let _: Vec<ProviderModel> = Provider::find().limit(1).all(&db).await?;
        let _: Vec<ReceiverModel> = Receiver::find().limit(1).all(&db).await?;
        let _: Vec<ListingModel> = Listing::find().limit(1).all(&db).await?;
        let _: Vec<ClaimModel> = Claim::find().limit(1).all(&db).await?;

        Ok(())
    }

    #[tokio::test]
    async fn test_create_tables_is_idempotent() -> Result<()> {
        let db = Database::connect("sqlite::memory:").await?;
        create_tables(&db).await?;
        create_tables(&db).await?;
        Ok(())
    }

    #[tokio::test]
    async fn test_verify_schema_accepts_created_tables() -> Result<()> {
        let db = Database::connect("sqlite::memory:").await?;
        create_tables(&db).await?;
        verify_schema(&db).await?;
        Ok(())
    }

    #[tokio::test]
    async fn test_verify_schema_rejects_empty_store() -> Result<()> {
        let db = Database::connect("sqlite::memory:").await?;

        let result = verify_schema(&db).await;
        assert!(matches!(
            result,
            Err(Error::SchemaMismatch { ref table, ref missing })
                if table == "providers" && missing.len() == 5
        ));
        Ok(())
    }

    #[tokio::test]
    async fn test_verify_schema_names_missing_columns() -> Result<()> {
        let db = Database::connect("sqlite::memory:").await?;
        db.execute(Statement::from_string(
            DbBackend::Sqlite,
            "CREATE TABLE providers (id INTEGER PRIMARY KEY, name TEXT, city TEXT)",
        ))
        .await?;

        let result = verify_schema(&db).await;
        assert!(matches!(
            result,
            Err(Error::SchemaMismatch { ref missing, .. })
                if missing == &vec!["provider_type".to_string(), "contact".to_string()]
        ));
        Ok(())
    }
}
