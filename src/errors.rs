//! Unified error type for query construction, claim lifecycle and storage failures.

use crate::core::schema::EntityKind;
use crate::entities::ClaimStatus;
use thiserror::Error;

/// Every failure the crate can surface to a caller.
#[derive(Debug, Error)]
pub enum Error {
    /// A filter, projection or aggregation names a field that is not declared on an
    /// entity in scope.
    #[error("Unknown field `{field}` on {entity}")]
    UnknownField {
        /// Entity the field was looked up on
        entity: EntityKind,
        /// Field name as requested
        field: String,
    },

    /// A join has no declared foreign-key path, or does not connect to the entities in scope.
    #[error("Invalid join from {from} to {to}: {reason}")]
    InvalidJoin {
        /// Entity the join starts from
        from: EntityKind,
        /// Entity the join targets
        to: EntityKind,
        /// Why the join was rejected
        reason: &'static str,
    },

    /// The aggregation descriptor is incomplete or inconsistent.
    #[error("Invalid aggregation: {message}")]
    InvalidAggregation {
        /// Description of the problem
        message: String,
    },

    /// Aggregating over this entity would count its rows more than once.
    #[error("Aggregating over {entity} after a one-to-many join would double count its rows")]
    FanOut {
        /// Entity whose rows are multiplied by the join
        entity: EntityKind,
    },

    /// A referenced row does not exist.
    #[error("{entity} {id} not found")]
    NotFound {
        /// Entity that was looked up
        entity: EntityKind,
        /// Identifier that failed to resolve
        id: i64,
    },

    /// The requested claim status change is not allowed.
    #[error("Claim {claim_id} cannot move from {from} to {to}")]
    InvalidTransition {
        /// Claim being transitioned
        claim_id: i64,
        /// Status observed in the store
        from: ClaimStatus,
        /// Status requested by the caller
        to: ClaimStatus,
    },

    /// A listing quantity below zero was supplied.
    #[error("Invalid quantity: {quantity} (must be zero or more)")]
    InvalidQuantity {
        /// Rejected quantity
        quantity: i64,
    },

    /// The listing has nothing left to hand over.
    #[error("Listing {listing_id} has no remaining quantity")]
    InsufficientQuantity {
        /// Listing that is empty
        listing_id: i64,
    },

    /// Claims still reference the listing, so it cannot be removed.
    #[error("Listing {listing_id} is referenced by {claims} claim(s)")]
    ListingHasClaims {
        /// Listing that was to be deleted
        listing_id: i64,
        /// Number of claims referencing it
        claims: u64,
    },

    /// Input failed a basic validation rule.
    #[error("Validation error: {message}")]
    Validation {
        /// Description of the rule that failed
        message: String,
    },

    /// The live store does not match the declared schema.
    #[error("Schema mismatch on table `{table}`: missing columns {missing:?}")]
    SchemaMismatch {
        /// Table that disagrees
        table: String,
        /// Declared columns absent from the store
        missing: Vec<String>,
    },

    /// Configuration could not be loaded.
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the problem
        message: String,
    },

    /// Any failure reported by the storage collaborator.
    #[error("Storage error: {0}")]
    Storage(#[from] sea_orm::DbErr),
}

/// Coarse classification of an [`Error`] for presentation layers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Unknown field in a query descriptor
    UnknownField,
    /// Join not backed by a declared relationship
    InvalidJoin,
    /// Malformed or double-counting aggregation
    InvalidAggregation,
    /// Referenced entity is missing
    NotFound,
    /// Claim lifecycle violation
    InvalidTransition,
    /// Input or quantity reconciliation failure
    Validation,
    /// Store schema disagrees with the declared model
    Schema,
    /// Settings could not be loaded
    Config,
    /// Storage collaborator failure
    Storage,
}

impl Error {
    /// Classifies the error without exposing storage-specific details.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::UnknownField { .. } => ErrorKind::UnknownField,
            Self::InvalidJoin { .. } => ErrorKind::InvalidJoin,
            Self::InvalidAggregation { .. } | Self::FanOut { .. } => ErrorKind::InvalidAggregation,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::InvalidTransition { .. } => ErrorKind::InvalidTransition,
            Self::InvalidQuantity { .. }
            | Self::InsufficientQuantity { .. }
            | Self::ListingHasClaims { .. }
            | Self::Validation { .. } => ErrorKind::Validation,
            Self::SchemaMismatch { .. } => ErrorKind::Schema,
            Self::Config { .. } => ErrorKind::Config,
            Self::Storage(_) => ErrorKind::Storage,
        }
    }
}

/// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;
