//! Reporting engine - The fixed catalogue of aggregate reports.
//!
//! Every report is a [`QuerySpec`] rendered by the query builder; nothing here writes
//! statement text. Each report has a typed function returning its rows, and
//! [`run_report`] turns any of them into a [`ReportTable`] for display.
//!
//! Grouping by a person or organisation always includes its ID as a hidden key, so two
//! providers that share a name are reported separately.

use crate::{
    core::{
        query::{Aggregation, FieldRef, Filter, JoinSpec, QuerySpec, SortOrder},
        schema::EntityKind,
    },
    entities::{ClaimStatus, MealType, provider},
    errors::Result,
};
use sea_orm::{ConnectionTrait, FromQueryResult};
use serde::Serialize;
use std::{collections::BTreeMap, fmt};
use tracing::instrument;

fn field(entity: EntityKind, name: &str) -> FieldRef {
    FieldRef::new(entity, name)
}

/// Providers and receivers registered in one city.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CityCounts {
    /// City name
    pub city: String,
    /// Providers in the city
    pub provider_count: i64,
    /// Receivers in the city
    pub receiver_count: i64,
}

/// Total listed quantity for one provider type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromQueryResult)]
pub struct ProviderTypeQuantity {
    /// Provider type recorded on the listings
    pub provider_type: String,
    /// Sum of listing quantities
    pub total_quantity: i64,
}

/// Total quantity of the listings a receiver has claimed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromQueryResult)]
pub struct ReceiverClaimed {
    /// Receiver name
    pub receiver: String,
    /// Sum of claimed listing quantities
    pub total_claimed: i64,
}

/// Number of listings in one city.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromQueryResult)]
pub struct CityListingCount {
    /// Collection city
    pub city: String,
    /// Listings in the city
    pub listing_count: i64,
}

/// Number of listings of one food type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromQueryResult)]
pub struct FoodTypeCount {
    /// Food type
    pub food_type: String,
    /// Listings of this food type
    pub count: i64,
}

/// Number of claims made against listings of one food type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromQueryResult)]
pub struct FoodTypeClaimCount {
    /// Food type
    pub food_type: String,
    /// Claims against listings of this food type
    pub claim_count: i64,
}

/// Completed claims against one provider's listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromQueryResult)]
pub struct ProviderSuccessfulClaims {
    /// Provider name
    pub provider: String,
    /// Claims in `Completed` status
    pub successful_claims: i64,
}

/// Share of all claims in one status.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusShare {
    /// Claim status
    pub status: ClaimStatus,
    /// Claims in this status
    pub claims: i64,
    /// Percentage of all claims, two decimals
    pub percentage: f64,
}

/// Average listing quantity across a receiver's claims.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReceiverAverage {
    /// Receiver name
    pub receiver: String,
    /// Average claimed quantity, rounded to two decimals
    pub avg_quantity_claimed: f64,
}

/// Number of claims for one meal type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromQueryResult)]
pub struct MealTypeCount {
    /// Meal type
    pub meal_type: MealType,
    /// Claims for this meal type
    pub claim_count: i64,
}

/// Total quantity listed by one provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProviderDonation {
    /// Provider name
    pub provider: String,
    /// Sum of the provider's listing quantities, zero without listings
    pub total_donated: i64,
}

#[derive(Debug, FromQueryResult)]
struct CityCount {
    city: String,
    entries: i64,
}

#[derive(Debug, FromQueryResult)]
struct Total {
    total: Option<i64>,
}

#[derive(Debug, FromQueryResult)]
struct StatusCount {
    status: ClaimStatus,
    claims: i64,
}

#[derive(Debug, FromQueryResult)]
struct ReceiverAvgRow {
    receiver: String,
    avg_quantity: Option<f64>,
}

#[derive(Debug, FromQueryResult)]
struct ProviderSumRow {
    provider: String,
    total_donated: Option<i64>,
}

async fn count_per_city<C>(db: &C, entity: EntityKind) -> Result<Vec<CityCount>>
where
    C: ConnectionTrait,
{
    QuerySpec::new(entity)
        .aggregate(Aggregation::count("entries").group_by(field(entity, "city"), "city"))
        .build(db.get_database_backend())?
        .fetch_all(db)
        .await
}

/// Report 1: providers and receivers per city.
///
/// A city with only providers or only receivers is listed with zero for the other side.
/// Sorted by provider count descending, then city.
#[instrument(skip(db))]
pub async fn providers_and_receivers_per_city<C>(db: &C) -> Result<Vec<CityCounts>>
where
    C: ConnectionTrait,
{
    let providers = count_per_city(db, EntityKind::Provider).await?;
    let receivers = count_per_city(db, EntityKind::Receiver).await?;

    let mut merged: BTreeMap<String, (i64, i64)> = BTreeMap::new();
    for row in providers {
        merged.entry(row.city).or_default().0 = row.entries;
    }
    for row in receivers {
        merged.entry(row.city).or_default().1 = row.entries;
    }

    let mut rows: Vec<CityCounts> = merged
        .into_iter()
        .map(|(city, (provider_count, receiver_count))| CityCounts {
            city,
            provider_count,
            receiver_count,
        })
        .collect();
    rows.sort_by(|a, b| {
        b.provider_count
            .cmp(&a.provider_count)
            .then_with(|| a.city.cmp(&b.city))
    });
    Ok(rows)
}

/// Report 2: total listed quantity by provider type, largest first.
#[instrument(skip(db))]
pub async fn quantity_by_provider_type<C>(db: &C) -> Result<Vec<ProviderTypeQuantity>>
where
    C: ConnectionTrait,
{
    QuerySpec::new(EntityKind::Listing)
        .aggregate(
            Aggregation::sum(field(EntityKind::Listing, "quantity"), "total_quantity")
                .group_by(field(EntityKind::Listing, "provider_type"), "provider_type")
                .order(SortOrder::Desc),
        )
        .build(db.get_database_backend())?
        .fetch_all(db)
        .await
}

/// Report 3: provider contact details, optionally limited to one city.
#[instrument(skip(db))]
pub async fn provider_contacts<C>(db: &C, city: Option<&str>) -> Result<Vec<provider::Model>>
where
    C: ConnectionTrait,
{
    let mut spec = QuerySpec::new(EntityKind::Provider)
        .order_by(field(EntityKind::Provider, "id"), SortOrder::Asc);
    if let Some(city) = city {
        spec = spec.filter(Filter::equals(field(EntityKind::Provider, "city"), city));
    }
    spec.build(db.get_database_backend())?.fetch_all(db).await
}

/// Report 4: total claimed quantity per receiver, largest first.
#[instrument(skip(db))]
pub async fn top_receivers_by_quantity<C>(db: &C) -> Result<Vec<ReceiverClaimed>>
where
    C: ConnectionTrait,
{
    QuerySpec::new(EntityKind::Claim)
        .join(JoinSpec::inner(EntityKind::Claim, EntityKind::Receiver))
        .join(JoinSpec::inner(EntityKind::Claim, EntityKind::Listing))
        .aggregate(
            Aggregation::sum(field(EntityKind::Listing, "quantity"), "total_claimed")
                .group_by(field(EntityKind::Receiver, "name"), "receiver")
                .group_by_hidden(field(EntityKind::Receiver, "id"))
                .order(SortOrder::Desc),
        )
        .build(db.get_database_backend())?
        .fetch_all(db)
        .await
}

/// Report 5: sum of all listing quantities; zero when nothing is listed.
#[instrument(skip(db))]
pub async fn total_available_quantity<C>(db: &C) -> Result<i64>
where
    C: ConnectionTrait,
{
    let total: Option<Total> = QuerySpec::new(EntityKind::Listing)
        .aggregate(Aggregation::sum(
            field(EntityKind::Listing, "quantity"),
            "total",
        ))
        .build(db.get_database_backend())?
        .fetch_one(db)
        .await?;
    Ok(total.and_then(|row| row.total).unwrap_or(0))
}

/// Report 6: number of listings per city, most first.
#[instrument(skip(db))]
pub async fn listings_per_city<C>(db: &C) -> Result<Vec<CityListingCount>>
where
    C: ConnectionTrait,
{
    QuerySpec::new(EntityKind::Listing)
        .aggregate(
            Aggregation::count("listing_count")
                .group_by(field(EntityKind::Listing, "city"), "city")
                .order(SortOrder::Desc),
        )
        .build(db.get_database_backend())?
        .fetch_all(db)
        .await
}

/// Report 7: number of listings per food type, most first.
#[instrument(skip(db))]
pub async fn listings_per_food_type<C>(db: &C) -> Result<Vec<FoodTypeCount>>
where
    C: ConnectionTrait,
{
    QuerySpec::new(EntityKind::Listing)
        .aggregate(
            Aggregation::count("count")
                .group_by(field(EntityKind::Listing, "food_type"), "food_type")
                .order(SortOrder::Desc),
        )
        .build(db.get_database_backend())?
        .fetch_all(db)
        .await
}

/// Report 8: number of claims per food type, most first.
#[instrument(skip(db))]
pub async fn claims_per_food_type<C>(db: &C) -> Result<Vec<FoodTypeClaimCount>>
where
    C: ConnectionTrait,
{
    QuerySpec::new(EntityKind::Claim)
        .join(JoinSpec::inner(EntityKind::Claim, EntityKind::Listing))
        .aggregate(
            Aggregation::count_of(field(EntityKind::Claim, "id"), "claim_count")
                .group_by(field(EntityKind::Listing, "food_type"), "food_type")
                .order(SortOrder::Desc),
        )
        .build(db.get_database_backend())?
        .fetch_all(db)
        .await
}

/// Report 9: completed claims per provider, most first.
#[instrument(skip(db))]
pub async fn successful_claims_per_provider<C>(db: &C) -> Result<Vec<ProviderSuccessfulClaims>>
where
    C: ConnectionTrait,
{
    QuerySpec::new(EntityKind::Claim)
        .join(JoinSpec::inner(EntityKind::Claim, EntityKind::Listing))
        .join(JoinSpec::inner(EntityKind::Listing, EntityKind::Provider))
        .filter(Filter::equals(
            field(EntityKind::Claim, "status"),
            ClaimStatus::Completed,
        ))
        .aggregate(
            Aggregation::count_of(field(EntityKind::Claim, "id"), "successful_claims")
                .group_by(field(EntityKind::Provider, "name"), "provider")
                .group_by_hidden(field(EntityKind::Provider, "id"))
                .order(SortOrder::Desc),
        )
        .build(db.get_database_backend())?
        .fetch_all(db)
        .await
}

/// Splits 100.00% into basis points proportional to `counts`.
///
/// Uses the largest remainder method so the shares always add up to exactly 10 000.
/// Remainder ties go to the earlier entry.
fn basis_points(counts: &[i64]) -> Vec<i64> {
    const WHOLE: i64 = 10_000;

    let total: i64 = counts.iter().sum();
    if total <= 0 {
        return vec![0; counts.len()];
    }

    let mut shares: Vec<i64> = counts.iter().map(|count| count * WHOLE / total).collect();
    let remainders: Vec<i64> = counts.iter().map(|count| count * WHOLE % total).collect();
    let leftover = WHOLE - shares.iter().sum::<i64>();

    let mut order: Vec<usize> = (0..counts.len()).collect();
    order.sort_by(|&a, &b| remainders[b].cmp(&remainders[a]).then(a.cmp(&b)));
    for &index in order
        .iter()
        .take(usize::try_from(leftover).unwrap_or_default())
    {
        shares[index] += 1;
    }
    shares
}

/// Report 10: percentage of claims in each status.
///
/// Percentages add up to exactly 100.00 whenever claims exist. Returns no rows when
/// there are no claims.
#[instrument(skip(db))]
pub async fn claim_status_distribution<C>(db: &C) -> Result<Vec<StatusShare>>
where
    C: ConnectionTrait,
{
    let counts: Vec<StatusCount> = QuerySpec::new(EntityKind::Claim)
        .aggregate(
            Aggregation::count("claims")
                .group_by(field(EntityKind::Claim, "status"), "status")
                .order(SortOrder::Desc),
        )
        .build(db.get_database_backend())?
        .fetch_all(db)
        .await?;

    let shares = basis_points(&counts.iter().map(|row| row.claims).collect::<Vec<_>>());

    // Basis points never exceed 10 000, well inside f64's exact range.
    #[allow(clippy::cast_precision_loss)]
    let rows = counts
        .into_iter()
        .zip(shares)
        .map(|(row, share)| StatusShare {
            status: row.status,
            claims: row.claims,
            percentage: share as f64 / 100.0,
        })
        .collect();
    Ok(rows)
}

fn round_to_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Report 11: average claimed listing quantity per receiver, highest first.
#[instrument(skip(db))]
pub async fn average_quantity_per_receiver<C>(db: &C) -> Result<Vec<ReceiverAverage>>
where
    C: ConnectionTrait,
{
    let rows: Vec<ReceiverAvgRow> = QuerySpec::new(EntityKind::Claim)
        .join(JoinSpec::inner(EntityKind::Claim, EntityKind::Receiver))
        .join(JoinSpec::inner(EntityKind::Claim, EntityKind::Listing))
        .aggregate(
            Aggregation::avg(field(EntityKind::Listing, "quantity"), "avg_quantity")
                .group_by(field(EntityKind::Receiver, "name"), "receiver")
                .group_by_hidden(field(EntityKind::Receiver, "id"))
                .order(SortOrder::Desc),
        )
        .build(db.get_database_backend())?
        .fetch_all(db)
        .await?;

    Ok(rows
        .into_iter()
        .map(|row| ReceiverAverage {
            receiver: row.receiver,
            avg_quantity_claimed: round_to_cents(row.avg_quantity.unwrap_or_default()),
        })
        .collect())
}

/// Report 12: number of claims per meal type, most first.
#[instrument(skip(db))]
pub async fn claims_per_meal_type<C>(db: &C) -> Result<Vec<MealTypeCount>>
where
    C: ConnectionTrait,
{
    QuerySpec::new(EntityKind::Claim)
        .aggregate(
            Aggregation::count("claim_count")
                .group_by(field(EntityKind::Claim, "meal_type"), "meal_type")
                .order(SortOrder::Desc),
        )
        .build(db.get_database_backend())?
        .fetch_all(db)
        .await
}

/// Report 13: total listed quantity per provider, largest first.
///
/// Providers without listings are included with a total of zero.
#[instrument(skip(db))]
pub async fn donations_per_provider<C>(db: &C) -> Result<Vec<ProviderDonation>>
where
    C: ConnectionTrait,
{
    let rows: Vec<ProviderSumRow> = QuerySpec::new(EntityKind::Provider)
        .join(JoinSpec::left(EntityKind::Provider, EntityKind::Listing))
        .aggregate(
            Aggregation::sum(field(EntityKind::Listing, "quantity"), "total_donated")
                .group_by(field(EntityKind::Provider, "name"), "provider")
                .group_by_hidden(field(EntityKind::Provider, "id"))
                .order(SortOrder::Desc),
        )
        .build(db.get_database_backend())?
        .fetch_all(db)
        .await?;

    Ok(rows
        .into_iter()
        .map(|row| ProviderDonation {
            provider: row.provider,
            total_donated: row.total_donated.unwrap_or(0),
        })
        .collect())
}

/// Every report in the catalogue, in presentation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ReportKind {
    /// Report 1
    ProvidersAndReceiversPerCity,
    /// Report 2
    QuantityByProviderType,
    /// Report 3
    ProviderContacts,
    /// Report 4
    TopReceivers,
    /// Report 5
    TotalAvailable,
    /// Report 6
    ListingsPerCity,
    /// Report 7
    ListingsPerFoodType,
    /// Report 8
    ClaimsPerFoodType,
    /// Report 9
    SuccessfulClaimsPerProvider,
    /// Report 10
    ClaimStatusDistribution,
    /// Report 11
    AverageQuantityPerReceiver,
    /// Report 12
    ClaimsPerMealType,
    /// Report 13
    DonationsPerProvider,
}

impl ReportKind {
    /// All reports, numbered 1 through 13 in this order.
    pub const ALL: [Self; 13] = [
        Self::ProvidersAndReceiversPerCity,
        Self::QuantityByProviderType,
        Self::ProviderContacts,
        Self::TopReceivers,
        Self::TotalAvailable,
        Self::ListingsPerCity,
        Self::ListingsPerFoodType,
        Self::ClaimsPerFoodType,
        Self::SuccessfulClaimsPerProvider,
        Self::ClaimStatusDistribution,
        Self::AverageQuantityPerReceiver,
        Self::ClaimsPerMealType,
        Self::DonationsPerProvider,
    ];

    /// Question the report answers.
    #[must_use]
    pub const fn title(self) -> &'static str {
        match self {
            Self::ProvidersAndReceiversPerCity => {
                "How many food providers and receivers are there in each city?"
            }
            Self::QuantityByProviderType => "Which type of food provider contributes the most food?",
            Self::ProviderContacts => "Contact information of food providers",
            Self::TopReceivers => "Which receivers have claimed the most food?",
            Self::TotalAvailable => "What is the total quantity of food available?",
            Self::ListingsPerCity => "Which city has the highest number of food listings?",
            Self::ListingsPerFoodType => "What are the most commonly available food types?",
            Self::ClaimsPerFoodType => "How many claims have been made for each food type?",
            Self::SuccessfulClaimsPerProvider => {
                "Which provider has had the most completed claims?"
            }
            Self::ClaimStatusDistribution => "Percentage of claims by status",
            Self::AverageQuantityPerReceiver => "Average quantity of food claimed per receiver",
            Self::ClaimsPerMealType => "Which meal type is claimed the most?",
            Self::DonationsPerProvider => "Total quantity of food donated by each provider",
        }
    }

    /// Position in the catalogue, starting at 1.
    #[must_use]
    pub fn number(self) -> usize {
        Self::ALL
            .iter()
            .position(|kind| *kind == self)
            .map_or(0, |index| index + 1)
    }
}

/// Inputs used by parameterized reports.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReportParams {
    /// City for the provider contacts report; `None` lists every provider
    pub city: Option<String>,
}

/// A single value in a report table.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Cell {
    /// Free text
    Text(String),
    /// Whole number
    Integer(i64),
    /// Two-decimal number
    Decimal(f64),
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(text) => f.write_str(text),
            Self::Integer(value) => write!(f, "{value}"),
            Self::Decimal(value) => write!(f, "{value:.2}"),
        }
    }
}

/// Presentation-neutral report output: named columns and rows of typed cells.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportTable {
    /// Report that produced the table
    pub kind: ReportKind,
    /// Column headers
    pub columns: Vec<&'static str>,
    /// Rows, each with one cell per column
    pub rows: Vec<Vec<Cell>>,
}

impl ReportTable {
    fn new(kind: ReportKind, columns: Vec<&'static str>, rows: Vec<Vec<Cell>>) -> Self {
        Self {
            kind,
            columns,
            rows,
        }
    }
}

impl fmt::Display for ReportTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}. {}", self.kind.number(), self.kind.title())?;
        if self.rows.is_empty() {
            return writeln!(f, "(no rows)");
        }

        let rendered: Vec<Vec<String>> = self
            .rows
            .iter()
            .map(|row| row.iter().map(ToString::to_string).collect())
            .collect();
        let widths: Vec<usize> = self
            .columns
            .iter()
            .enumerate()
            .map(|(index, header)| {
                rendered
                    .iter()
                    .filter_map(|row| row.get(index).map(String::len))
                    .fold(header.len(), usize::max)
            })
            .collect();

        let header: Vec<String> = self
            .columns
            .iter()
            .zip(&widths)
            .map(|(name, width)| format!("{name:<width$}"))
            .collect();
        writeln!(f, "{}", header.join(" | ").trim_end())?;
        let rule: Vec<String> = widths.iter().map(|width| "-".repeat(*width)).collect();
        writeln!(f, "{}", rule.join("-+-"))?;

        for (row, cells) in self.rows.iter().zip(&rendered) {
            let line: Vec<String> = row
                .iter()
                .zip(cells)
                .zip(&widths)
                .map(|((cell, text), width)| match cell {
                    Cell::Text(_) => format!("{text:<width$}"),
                    Cell::Integer(_) | Cell::Decimal(_) => format!("{text:>width$}"),
                })
                .collect();
            writeln!(f, "{}", line.join(" | ").trim_end())?;
        }
        Ok(())
    }
}

fn text(value: impl Into<String>) -> Cell {
    Cell::Text(value.into())
}

/// Runs one report and shapes its rows into a [`ReportTable`].
///
/// # Errors
/// Returns `Error::Storage` if the store cannot be queried.
#[instrument(skip(db))]
pub async fn run_report<C>(db: &C, kind: ReportKind, params: &ReportParams) -> Result<ReportTable>
where
    C: ConnectionTrait,
{
    let table = match kind {
        ReportKind::ProvidersAndReceiversPerCity => ReportTable::new(
            kind,
            vec!["City", "Provider_Count", "Receiver_Count"],
            providers_and_receivers_per_city(db)
                .await?
                .into_iter()
                .map(|row| {
                    vec![
                        text(row.city),
                        Cell::Integer(row.provider_count),
                        Cell::Integer(row.receiver_count),
                    ]
                })
                .collect(),
        ),
        ReportKind::QuantityByProviderType => ReportTable::new(
            kind,
            vec!["Provider_Type", "Total_Quantity"],
            quantity_by_provider_type(db)
                .await?
                .into_iter()
                .map(|row| vec![text(row.provider_type), Cell::Integer(row.total_quantity)])
                .collect(),
        ),
        ReportKind::ProviderContacts => ReportTable::new(
            kind,
            vec!["Provider_ID", "Name", "Provider_Type", "City", "Contact"],
            provider_contacts(db, params.city.as_deref())
                .await?
                .into_iter()
                .map(|row| {
                    vec![
                        Cell::Integer(row.id),
                        text(row.name),
                        text(row.provider_type),
                        text(row.city),
                        text(row.contact),
                    ]
                })
                .collect(),
        ),
        ReportKind::TopReceivers => ReportTable::new(
            kind,
            vec!["Receiver", "Total_Claimed"],
            top_receivers_by_quantity(db)
                .await?
                .into_iter()
                .map(|row| vec![text(row.receiver), Cell::Integer(row.total_claimed)])
                .collect(),
        ),
        ReportKind::TotalAvailable => ReportTable::new(
            kind,
            vec!["Total_Available"],
            vec![vec![Cell::Integer(total_available_quantity(db).await?)]],
        ),
        ReportKind::ListingsPerCity => ReportTable::new(
            kind,
            vec!["City", "Listing_Count"],
            listings_per_city(db)
                .await?
                .into_iter()
                .map(|row| vec![text(row.city), Cell::Integer(row.listing_count)])
                .collect(),
        ),
        ReportKind::ListingsPerFoodType => ReportTable::new(
            kind,
            vec!["Food_Type", "Count"],
            listings_per_food_type(db)
                .await?
                .into_iter()
                .map(|row| vec![text(row.food_type), Cell::Integer(row.count)])
                .collect(),
        ),
        ReportKind::ClaimsPerFoodType => ReportTable::new(
            kind,
            vec!["Food_Type", "Claim_Count"],
            claims_per_food_type(db)
                .await?
                .into_iter()
                .map(|row| vec![text(row.food_type), Cell::Integer(row.claim_count)])
                .collect(),
        ),
        ReportKind::SuccessfulClaimsPerProvider => ReportTable::new(
            kind,
            vec!["Provider", "Successful_Claims"],
            successful_claims_per_provider(db)
                .await?
                .into_iter()
                .map(|row| vec![text(row.provider), Cell::Integer(row.successful_claims)])
                .collect(),
        ),
        ReportKind::ClaimStatusDistribution => ReportTable::new(
            kind,
            vec!["Status", "Claims", "Percentage"],
            claim_status_distribution(db)
                .await?
                .into_iter()
                .map(|row| {
                    vec![
                        text(row.status.as_str()),
                        Cell::Integer(row.claims),
                        Cell::Decimal(row.percentage),
                    ]
                })
                .collect(),
        ),
        ReportKind::AverageQuantityPerReceiver => ReportTable::new(
            kind,
            vec!["Receiver", "Avg_Quantity_Claimed"],
            average_quantity_per_receiver(db)
                .await?
                .into_iter()
                .map(|row| vec![text(row.receiver), Cell::Decimal(row.avg_quantity_claimed)])
                .collect(),
        ),
        ReportKind::ClaimsPerMealType => ReportTable::new(
            kind,
            vec!["Meal_Type", "Claim_Count"],
            claims_per_meal_type(db)
                .await?
                .into_iter()
                .map(|row| vec![text(row.meal_type.as_str()), Cell::Integer(row.claim_count)])
                .collect(),
        ),
        ReportKind::DonationsPerProvider => ReportTable::new(
            kind,
            vec!["Provider", "Total_Donated"],
            donations_per_provider(db)
                .await?
                .into_iter()
                .map(|row| vec![text(row.provider), Cell::Integer(row.total_donated)])
                .collect(),
        ),
    };
    Ok(table)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::float_cmp, clippy::unwrap_used)]
    use super::*;
    use crate::config::QuantityPolicy;
    use crate::core::claim::ClaimLifecycle;
    use crate::test_utils::*;

    #[test]
    fn test_basis_points_sum_to_whole() {
        assert_eq!(basis_points(&[2, 1]), vec![6667, 3333]);
        assert_eq!(basis_points(&[1, 1, 1]), vec![3334, 3333, 3333]);
        assert_eq!(basis_points(&[5]), vec![10_000]);
        assert_eq!(basis_points(&[3, 3, 1]).iter().sum::<i64>(), 10_000);
        assert!(basis_points(&[]).is_empty());
    }

    #[test]
    fn test_round_to_cents() {
        assert_eq!(round_to_cents(5.0 / 3.0), 1.67);
        assert_eq!(round_to_cents(7.5), 7.5);
    }

    #[test]
    fn test_report_numbers_follow_catalogue_order() {
        assert_eq!(ReportKind::ProvidersAndReceiversPerCity.number(), 1);
        assert_eq!(ReportKind::SuccessfulClaimsPerProvider.number(), 9);
        assert_eq!(ReportKind::DonationsPerProvider.number(), 13);
    }

    #[tokio::test]
    async fn test_completed_claim_counts_for_provider() -> Result<()> {
        let db = setup_test_db().await?;
        let provider = create_test_provider(&db, "FreshMart").await?;
        let listing = create_test_listing(&db, provider.id, 50).await?;
        let receiver = create_test_receiver(&db, "FoodBankNY").await?;
        let claim = create_test_claim(&db, listing.id, receiver.id).await?;
        let lifecycle = ClaimLifecycle::default();

        lifecycle
            .transition_status(&db, claim.id, ClaimStatus::Completed)
            .await?;
        assert!(
            lifecycle
                .transition_status(&db, claim.id, ClaimStatus::Cancelled)
                .await
                .is_err()
        );

        let rows = successful_claims_per_provider(&db).await?;
        assert_eq!(
            rows,
            vec![ProviderSuccessfulClaims {
                provider: "FreshMart".to_string(),
                successful_claims: 1,
            }]
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_pending_claims_are_not_successful() -> Result<()> {
        let db = setup_test_db().await?;
        let provider = create_test_provider(&db, "FreshMart").await?;
        let listing = create_test_listing(&db, provider.id, 50).await?;
        let receiver = create_test_receiver(&db, "FoodBankNY").await?;
        create_test_claim(&db, listing.id, receiver.id).await?;

        assert!(successful_claims_per_provider(&db).await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_providers_and_receivers_per_city_includes_one_sided_cities() -> Result<()> {
        let db = setup_test_db().await?;
        create_test_provider(&db, "FreshMart").await?;
        create_test_provider(&db, "Corner Deli").await?;
        create_custom_provider(&db, "Bean Town", "Restaurant", "Boston").await?;
        create_test_receiver(&db, "FoodBankNY").await?;
        create_custom_receiver(&db, "Windy Pantry", "Chicago").await?;

        let rows = providers_and_receivers_per_city(&db).await?;

        let summary: Vec<(&str, i64, i64)> = rows
            .iter()
            .map(|row| (row.city.as_str(), row.provider_count, row.receiver_count))
            .collect();
        assert_eq!(
            summary,
            vec![("New York", 2, 1), ("Boston", 1, 0), ("Chicago", 0, 1)]
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_quantity_reports() -> Result<()> {
        let db = setup_test_db().await?;
        let grocery = create_test_provider(&db, "FreshMart").await?;
        let restaurant = create_custom_provider(&db, "Bean Town", "Restaurant", "Boston").await?;
        create_custom_listing(&db, grocery.id, "Bread", 50, "New York").await?;
        create_custom_listing(&db, grocery.id, "Rice", 20, "New York").await?;
        create_custom_listing(&db, restaurant.id, "Bread", 10, "Boston").await?;

        assert_eq!(total_available_quantity(&db).await?, 80);

        let by_type = quantity_by_provider_type(&db).await?;
        assert_eq!(by_type[0].provider_type, "Grocery Store");
        assert_eq!(by_type[0].total_quantity, 70);
        assert_eq!(by_type[1].total_quantity, 10);

        let per_city = listings_per_city(&db).await?;
        assert_eq!(per_city[0].city, "New York");
        assert_eq!(per_city[0].listing_count, 2);

        let per_food = listings_per_food_type(&db).await?;
        assert_eq!(per_food[0].food_type, "Bread");
        assert_eq!(per_food[0].count, 2);
        Ok(())
    }

    #[tokio::test]
    async fn test_total_available_is_zero_without_listings() -> Result<()> {
        let db = setup_test_db().await?;
        assert_eq!(total_available_quantity(&db).await?, 0);
        Ok(())
    }

    #[tokio::test]
    async fn test_donations_include_providers_without_listings() -> Result<()> {
        let db = setup_test_db().await?;
        let busy = create_test_provider(&db, "FreshMart").await?;
        create_test_provider(&db, "Idle Farm").await?;
        let listing = create_test_listing(&db, busy.id, 50).await?;
        create_test_listing(&db, busy.id, 20).await?;

        // Claims on a listing must not inflate the provider's total.
        let receiver = create_test_receiver(&db, "FoodBankNY").await?;
        create_test_claim(&db, listing.id, receiver.id).await?;
        create_test_claim(&db, listing.id, receiver.id).await?;

        let rows = donations_per_provider(&db).await?;
        assert_eq!(
            rows,
            vec![
                ProviderDonation {
                    provider: "FreshMart".to_string(),
                    total_donated: 70,
                },
                ProviderDonation {
                    provider: "Idle Farm".to_string(),
                    total_donated: 0,
                },
            ]
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_providers_sharing_a_name_are_reported_separately() -> Result<()> {
        let db = setup_test_db().await?;
        let first = create_test_provider(&db, "FreshMart").await?;
        let second = create_custom_provider(&db, "FreshMart", "Restaurant", "Boston").await?;
        create_test_listing(&db, first.id, 5).await?;
        create_test_listing(&db, second.id, 7).await?;

        let rows = donations_per_provider(&db).await?;
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].total_donated, 7);
        assert_eq!(rows[1].total_donated, 5);
        Ok(())
    }

    #[tokio::test]
    async fn test_receiver_reports() -> Result<()> {
        let db = setup_test_db().await?;
        let provider = create_test_provider(&db, "FreshMart").await?;
        let large = create_custom_listing(&db, provider.id, "Bread", 10, "New York").await?;
        let small = create_custom_listing(&db, provider.id, "Rice", 5, "New York").await?;
        let tiny = create_custom_listing(&db, provider.id, "Soup", 2, "New York").await?;
        let first = create_test_receiver(&db, "FoodBankNY").await?;
        let second = create_test_receiver(&db, "Shelter").await?;

        create_test_claim(&db, large.id, first.id).await?;
        create_test_claim(&db, small.id, first.id).await?;
        create_test_claim(&db, tiny.id, second.id).await?;
        create_test_claim(&db, tiny.id, second.id).await?;
        create_custom_claim(&db, small.id, second.id, MealType::Dinner).await?;

        let totals = top_receivers_by_quantity(&db).await?;
        assert_eq!(totals[0].receiver, "FoodBankNY");
        assert_eq!(totals[0].total_claimed, 15);
        assert_eq!(totals[1].total_claimed, 9);

        let averages = average_quantity_per_receiver(&db).await?;
        assert_eq!(averages[0].receiver, "FoodBankNY");
        assert_eq!(averages[0].avg_quantity_claimed, 7.5);
        assert_eq!(averages[1].avg_quantity_claimed, 3.0);

        let per_food = claims_per_food_type(&db).await?;
        assert_eq!(per_food[0].food_type, "Rice");
        assert_eq!(per_food[0].claim_count, 2);
        assert_eq!(per_food[1].food_type, "Soup");

        let per_meal = claims_per_meal_type(&db).await?;
        assert_eq!(per_meal[0].meal_type, MealType::Lunch);
        assert_eq!(per_meal[0].claim_count, 4);
        assert_eq!(per_meal[1].meal_type, MealType::Dinner);
        Ok(())
    }

    #[tokio::test]
    async fn test_rounded_average() -> Result<()> {
        let db = setup_test_db().await?;
        let provider = create_test_provider(&db, "FreshMart").await?;
        let one = create_test_listing(&db, provider.id, 1).await?;
        let two = create_test_listing(&db, provider.id, 2).await?;
        let receiver = create_test_receiver(&db, "FoodBankNY").await?;
        create_test_claim(&db, one.id, receiver.id).await?;
        create_test_claim(&db, two.id, receiver.id).await?;
        create_test_claim(&db, two.id, receiver.id).await?;

        let averages = average_quantity_per_receiver(&db).await?;
        assert_eq!(averages[0].avg_quantity_claimed, 1.67);
        Ok(())
    }

    #[tokio::test]
    async fn test_status_distribution_sums_to_one_hundred() -> Result<()> {
        let db = setup_test_db().await?;
        assert!(claim_status_distribution(&db).await?.is_empty());

        let provider = create_test_provider(&db, "FreshMart").await?;
        let listing = create_test_listing(&db, provider.id, 50).await?;
        let receiver = create_test_receiver(&db, "FoodBankNY").await?;
        let lifecycle = ClaimLifecycle::new(QuantityPolicy::Untracked);
        let completed = create_test_claim(&db, listing.id, receiver.id).await?;
        let cancelled = create_test_claim(&db, listing.id, receiver.id).await?;
        create_test_claim(&db, listing.id, receiver.id).await?;
        lifecycle
            .transition_status(&db, completed.id, ClaimStatus::Completed)
            .await?;
        lifecycle
            .transition_status(&db, cancelled.id, ClaimStatus::Cancelled)
            .await?;

        let shares = claim_status_distribution(&db).await?;
        assert_eq!(shares.len(), 3);
        let total: f64 = shares.iter().map(|share| share.percentage).sum();
        assert!((total - 100.0).abs() < 0.01);
        assert!(shares.iter().any(|share| share.percentage == 33.34));
        Ok(())
    }

    #[tokio::test]
    async fn test_provider_contacts_filtered_by_city() -> Result<()> {
        let db = setup_test_db().await?;
        create_test_provider(&db, "FreshMart").await?;
        create_custom_provider(&db, "Bean Town", "Restaurant", "Boston").await?;

        assert_eq!(provider_contacts(&db, None).await?.len(), 2);
        let boston = provider_contacts(&db, Some("Boston")).await?;
        assert_eq!(boston.len(), 1);
        assert_eq!(boston[0].name, "Bean Town");
        assert!(provider_contacts(&db, Some("Nowhere")).await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_every_report_runs_on_an_empty_store() -> Result<()> {
        let db = setup_test_db().await?;
        let params = ReportParams::default();

        for kind in ReportKind::ALL {
            let table = run_report(&db, kind, &params).await?;
            assert_eq!(table.kind, kind);
            for row in &table.rows {
                assert_eq!(row.len(), table.columns.len());
            }
        }
        Ok(())
    }

    #[tokio::test]
    async fn test_report_table_renders_aligned_text() -> Result<()> {
        let db = setup_test_db().await?;
        let provider = create_test_provider(&db, "FreshMart").await?;
        create_test_listing(&db, provider.id, 50).await?;

        let table = run_report(
            &db,
            ReportKind::DonationsPerProvider,
            &ReportParams::default(),
        )
        .await?;
        let rendered = table.to_string();

        assert_eq!(
            rendered,
            "13. Total quantity of food donated by each provider\n\
             Provider  | Total_Donated\n\
             ----------+--------------\n\
             FreshMart |            50\n"
        );
        Ok(())
    }
}
