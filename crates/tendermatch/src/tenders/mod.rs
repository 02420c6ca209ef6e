//! Tender ingestion and recommendation.

pub mod adapters;
pub mod recommend;
pub mod sync;

pub use adapters::{default_adapters, NewTender, ShapeAdapter};
pub use recommend::{RecommendationEngine, SearchOutcome};
pub use sync::{SyncReport, TenderSynchronizer};

/// Deadline fallback for listings that omit one.
pub(crate) fn default_deadline() -> String {
    (chrono::Utc::now() + chrono::Duration::days(30)).to_rfc3339()
}
