/// Claim creation and status transitions
pub mod claim;
/// Listing management and the filtered listing view
pub mod listing;
/// Provider registration and lookup
pub mod provider;
/// Parameterized query construction
pub mod query;
/// Receiver registration and lookup
pub mod receiver;
/// The fixed catalogue of aggregate reports
pub mod report;
/// Static entity, field and relationship definitions
pub mod schema;
