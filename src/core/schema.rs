//! Schema model - Static, read-only description of the four stored entities.
//!
//! The query builder validates every field and join against these definitions before a
//! statement is rendered, and startup compares them with the live store. Table and column
//! names here must agree with the `SeaORM` entities in [`crate::entities`].

use crate::{
    entities::{Claim, Listing, Provider, Receiver},
    errors::{Error, Result},
};
use sea_orm::{ConnectionTrait, EntityTrait};
use serde::{Deserialize, Serialize};
use std::fmt;

/// One of the four stored entities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EntityKind {
    /// Food donor
    Provider,
    /// Food claimant
    Receiver,
    /// Quantity of food offered by a provider
    Listing,
    /// Receiver's request against a listing
    Claim,
}

impl EntityKind {
    /// All entities in table-creation order (referenced tables first).
    pub const ALL: [Self; 4] = [Self::Provider, Self::Receiver, Self::Listing, Self::Claim];

    /// Name of the backing table.
    #[must_use]
    pub const fn table_name(self) -> &'static str {
        match self {
            Self::Provider => "providers",
            Self::Receiver => "receivers",
            Self::Listing => "food_listings",
            Self::Claim => "claims",
        }
    }

    /// Declared fields of the entity, primary key first.
    #[must_use]
    pub const fn fields(self) -> &'static [FieldDef] {
        match self {
            Self::Provider => PROVIDER_FIELDS,
            Self::Receiver => RECEIVER_FIELDS,
            Self::Listing => LISTING_FIELDS,
            Self::Claim => CLAIM_FIELDS,
        }
    }

    /// Looks up a declared field by name.
    #[must_use]
    pub fn field(self, name: &str) -> Option<&'static FieldDef> {
        self.fields().iter().find(|field| field.name == name)
    }

    /// Name of the primary key column.
    #[must_use]
    pub const fn primary_key(self) -> &'static str {
        "id"
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Provider => "Provider",
            Self::Receiver => "Receiver",
            Self::Listing => "Listing",
            Self::Claim => "Claim",
        };
        f.write_str(name)
    }
}

/// Storage type of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    /// 64-bit signed integer
    Integer,
    /// UTF-8 text
    Text,
    /// UTC timestamp
    Timestamp,
}

/// Definition of a single entity field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDef {
    /// Column name
    pub name: &'static str,
    /// Storage type
    pub field_type: FieldType,
    /// Whether NULL is allowed
    pub nullable: bool,
    /// Entity this field references through its primary key, if any
    pub references: Option<EntityKind>,
}

impl FieldDef {
    const fn column(name: &'static str, field_type: FieldType) -> Self {
        Self {
            name,
            field_type,
            nullable: false,
            references: None,
        }
    }

    const fn foreign_key(name: &'static str, target: EntityKind) -> Self {
        Self {
            name,
            field_type: FieldType::Integer,
            nullable: false,
            references: Some(target),
        }
    }
}

const PROVIDER_FIELDS: &[FieldDef] = &[
    FieldDef::column("id", FieldType::Integer),
    FieldDef::column("name", FieldType::Text),
    FieldDef::column("provider_type", FieldType::Text),
    FieldDef::column("city", FieldType::Text),
    FieldDef::column("contact", FieldType::Text),
];

const RECEIVER_FIELDS: &[FieldDef] = &[
    FieldDef::column("id", FieldType::Integer),
    FieldDef::column("name", FieldType::Text),
    FieldDef::column("city", FieldType::Text),
    FieldDef::column("contact", FieldType::Text),
];

const LISTING_FIELDS: &[FieldDef] = &[
    FieldDef::column("id", FieldType::Integer),
    FieldDef::foreign_key("provider_id", EntityKind::Provider),
    FieldDef::column("food_type", FieldType::Text),
    FieldDef::column("quantity", FieldType::Integer),
    FieldDef::column("city", FieldType::Text),
    FieldDef::column("provider_type", FieldType::Text),
];

const CLAIM_FIELDS: &[FieldDef] = &[
    FieldDef::column("id", FieldType::Integer),
    FieldDef::foreign_key("listing_id", EntityKind::Listing),
    FieldDef::foreign_key("receiver_id", EntityKind::Receiver),
    FieldDef::column("status", FieldType::Text),
    FieldDef::column("meal_type", FieldType::Text),
    FieldDef::column("created_at", FieldType::Timestamp),
];

/// How rows of one entity relate to rows of another along a foreign key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cardinality {
    /// Each source row matches at most one target row (source holds the key).
    ManyToOne,
    /// Each source row may match many target rows (target holds the key).
    OneToMany,
}

/// A declared foreign-key path between two entities.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Relationship {
    /// Entity holding the foreign key column
    pub child: EntityKind,
    /// Foreign key column on `child`
    pub column: &'static str,
    /// Entity referenced by the key
    pub parent: EntityKind,
    /// Direction as seen from the entity the traversal starts at
    pub cardinality: Cardinality,
}

/// Finds the declared foreign-key path from `from` to `to`, in either direction.
///
/// Returns `None` when neither entity declares a key referencing the other.
#[must_use]
pub fn relationship(from: EntityKind, to: EntityKind) -> Option<Relationship> {
    let key_on = |child: EntityKind, parent: EntityKind| {
        child
            .fields()
            .iter()
            .find(|field| field.references == Some(parent))
            .map(|field| field.name)
    };

    if let Some(column) = key_on(from, to) {
        return Some(Relationship {
            child: from,
            column,
            parent: to,
            cardinality: Cardinality::ManyToOne,
        });
    }

    key_on(to, from).map(|column| Relationship {
        child: to,
        column,
        parent: from,
        cardinality: Cardinality::OneToMany,
    })
}

/// Checks that a row with the given primary key exists.
///
/// Used by the claim lifecycle before writing a claim that references a listing and a
/// receiver.
///
/// # Errors
/// Returns `Error::NotFound` if no such row exists, or `Error::Storage` if the lookup fails.
pub async fn validate_reference<C>(db: &C, entity: EntityKind, id: i64) -> Result<()>
where
    C: ConnectionTrait,
{
    let exists = match entity {
        EntityKind::Provider => Provider::find_by_id(id).one(db).await?.is_some(),
        EntityKind::Receiver => Receiver::find_by_id(id).one(db).await?.is_some(),
        EntityKind::Listing => Listing::find_by_id(id).one(db).await?.is_some(),
        EntityKind::Claim => Claim::find_by_id(id).one(db).await?.is_some(),
    };

    if exists {
        Ok(())
    } else {
        Err(Error::NotFound { entity, id })
    }
}
