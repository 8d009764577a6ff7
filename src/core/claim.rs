//! Claim lifecycle - Creating claims and moving them out of `Pending`.
//!
//! A claim starts `Pending` and moves exactly once, to `Completed` or `Cancelled`.
//! The status change is a conditional update on the stored status, so two callers racing
//! to transition the same claim cannot both succeed.

use crate::{
    config::{AppConfig, QuantityPolicy},
    core::schema::{EntityKind, validate_reference},
    entities::{Claim, ClaimStatus, Listing, MealType, claim, listing},
    errors::{Error, Result},
};
use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    QueryFilter, Set, TransactionTrait,
};
use tracing::{info, instrument, warn};

/// Creates and transitions claims under a listing quantity policy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClaimLifecycle {
    policy: QuantityPolicy,
}

impl ClaimLifecycle {
    /// Creates a lifecycle manager applying `policy` to listing quantities.
    #[must_use]
    pub const fn new(policy: QuantityPolicy) -> Self {
        Self { policy }
    }

    /// Creates a lifecycle manager using the configured quantity policy.
    #[must_use]
    pub const fn from_config(config: &AppConfig) -> Self {
        Self::new(config.quantity_policy)
    }

    /// Policy applied on claim creation and completion.
    #[must_use]
    pub const fn policy(&self) -> QuantityPolicy {
        self.policy
    }

    /// Records a new `Pending` claim by `receiver_id` against `listing_id`.
    ///
    /// Both references are checked in the same transaction as the insert.
    ///
    /// # Errors
    /// * `Error::NotFound` - the listing or receiver does not exist
    /// * `Error::InsufficientQuantity` - the listing is empty and quantities are consumed
    #[instrument(skip(self, db))]
    pub async fn create_claim(
        &self,
        db: &DatabaseConnection,
        listing_id: i64,
        receiver_id: i64,
        meal_type: MealType,
    ) -> Result<claim::Model> {
        let txn = db.begin().await?;

        let listing = Listing::find_by_id(listing_id)
            .one(&txn)
            .await?
            .ok_or(Error::NotFound {
                entity: EntityKind::Listing,
                id: listing_id,
            })?;
        validate_reference(&txn, EntityKind::Receiver, receiver_id).await?;

        if self.policy == QuantityPolicy::ConsumeOnCompletion && listing.quantity == 0 {
            return Err(Error::InsufficientQuantity { listing_id });
        }

        let claim = claim::ActiveModel {
            listing_id: Set(listing_id),
            receiver_id: Set(receiver_id),
            status: Set(ClaimStatus::Pending),
            meal_type: Set(meal_type),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        txn.commit().await?;

        info!(
            claim_id = claim.id,
            listing_id, receiver_id, "Created {} claim", claim.meal_type
        );
        Ok(claim)
    }

    /// Moves a `Pending` claim to `Completed` or `Cancelled`.
    ///
    /// Under [`QuantityPolicy::ConsumeOnCompletion`], completing a claim drains the listing
    /// to zero in the same transaction.
    ///
    /// # Errors
    /// * `Error::NotFound` - the claim does not exist
    /// * `Error::InvalidTransition` - the claim is already terminal, another caller moved it
    ///   first, or `new_status` is `Pending`
    /// * `Error::InsufficientQuantity` - completion would consume an empty listing; the
    ///   claim stays `Pending`
    #[instrument(skip(self, db))]
    pub async fn transition_status(
        &self,
        db: &DatabaseConnection,
        claim_id: i64,
        new_status: ClaimStatus,
    ) -> Result<claim::Model> {
        let current = get_claim(db, claim_id).await?.ok_or(Error::NotFound {
            entity: EntityKind::Claim,
            id: claim_id,
        })?;

        if current.status.is_terminal() || !new_status.is_terminal() {
            warn!(
                claim_id,
                from = %current.status,
                to = %new_status,
                "Rejected claim transition"
            );
            return Err(Error::InvalidTransition {
                claim_id,
                from: current.status,
                to: new_status,
            });
        }

        let txn = db.begin().await?;

        // Only a row still Pending in the store may change.
        let result = Claim::update_many()
            .col_expr(claim::Column::Status, Expr::value(new_status))
            .filter(claim::Column::Id.eq(claim_id))
            .filter(claim::Column::Status.eq(ClaimStatus::Pending))
            .exec(&txn)
            .await?;

        if result.rows_affected == 0 {
            let stored = Claim::find_by_id(claim_id)
                .one(&txn)
                .await?
                .ok_or(Error::NotFound {
                    entity: EntityKind::Claim,
                    id: claim_id,
                })?;
            warn!(
                claim_id,
                from = %stored.status,
                to = %new_status,
                "Claim was transitioned concurrently"
            );
            return Err(Error::InvalidTransition {
                claim_id,
                from: stored.status,
                to: new_status,
            });
        }

        if new_status == ClaimStatus::Completed
            && self.policy == QuantityPolicy::ConsumeOnCompletion
        {
            let drained = Listing::update_many()
                .col_expr(listing::Column::Quantity, Expr::value(0_i64))
                .filter(listing::Column::Id.eq(current.listing_id))
                .filter(listing::Column::Quantity.gt(0))
                .exec(&txn)
                .await?;
            if drained.rows_affected == 0 {
                warn!(
                    claim_id,
                    listing_id = current.listing_id,
                    "Listing has nothing left to hand over"
                );
                return Err(Error::InsufficientQuantity {
                    listing_id: current.listing_id,
                });
            }
        }

        txn.commit().await?;

        info!(claim_id, status = %new_status, "Claim transitioned");
        Ok(claim::Model {
            status: new_status,
            ..current
        })
    }
}

/// Finds a claim by ID.
pub async fn get_claim<C>(db: &C, claim_id: i64) -> Result<Option<claim::Model>>
where
    C: ConnectionTrait,
{
    Claim::find_by_id(claim_id)
        .one(db)
        .await
        .map_err(Into::into)
}
