//! Idempotent tender synchronization.

use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;

use crate::db::{tender_repo, Database};
use crate::db::tender_repo::TenderRow;
use crate::error::Result;
use crate::services::{SourceParams, TenderSource};
use crate::tenders::adapters::{self, NewTender, ShapeAdapter};
use crate::tenders::default_deadline;

/// Aggregate outcome of one sync pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncReport {
    pub saved: u32,
    pub skipped: u32,
    pub failed: u32,
}

/// Pulls listings from the configured source and upserts them by natural
/// key. Safe to re-invoke at any time; a record that already exists is a
/// skip, never a duplicate.
pub struct TenderSynchronizer {
    db: Database,
    source: Arc<dyn TenderSource>,
    adapters: Vec<Box<dyn ShapeAdapter>>,
    source_name: String,
}

impl TenderSynchronizer {
    pub fn new(db: Database, source: Arc<dyn TenderSource>, source_name: &str) -> Self {
        Self {
            db,
            source,
            adapters: adapters::default_adapters(),
            source_name: source_name.to_string(),
        }
    }

    /// Fetches one page and stores new listings. Each record fails or
    /// succeeds on its own; one bad record never aborts the batch.
    pub async fn sync(&self, params: &SourceParams) -> Result<SyncReport> {
        log::debug!("Syncing tender page {}", params.page);
        let records = self.source.fetch_page(params).await?;
        log::info!("Fetched {} raw tender records", records.len());

        let mut report = SyncReport::default();
        for raw in &records {
            match self.sync_one(raw) {
                Ok(true) => report.saved += 1,
                Ok(false) => report.skipped += 1,
                Err(e) => {
                    log::warn!("Skipping tender record after error: {}", e);
                    report.failed += 1;
                }
            }
        }

        log::info!(
            "Tender sync done: {} saved, {} skipped, {} failed",
            report.saved,
            report.skipped,
            report.failed
        );
        Ok(report)
    }

    /// Returns Ok(true) when the record was stored, Ok(false) when it
    /// already existed.
    fn sync_one(&self, raw: &Value) -> Result<bool> {
        let tender = match adapters::normalize(raw, &self.adapters) {
            Some(tender) => tender,
            None => {
                let preview: String = raw.to_string().chars().take(200).collect();
                return Err(crate::error::TenderMatchError::Internal(format!(
                    "no adapter matched payload: {}",
                    preview
                )));
            }
        };

        // A record without any natural key can never be recognized on
        // re-sync and would be inserted fresh every time.
        if tender.external_id.is_none() && tender.bid_number.is_none() {
            return Err(crate::error::TenderMatchError::Internal(format!(
                "record '{}' has neither an external id nor a bid number",
                tender.title
            )));
        }

        let existing = tender_repo::find_by_natural_key(
            &self.db,
            tender.external_id.as_deref(),
            &self.source_name,
            tender.bid_number.as_deref(),
        )?;
        if existing.is_some() {
            return Ok(false);
        }

        match tender_repo::insert(&self.db, &self.to_row(&tender, raw)) {
            Ok(()) => Ok(true),
            // Lost a race with a concurrent sync; same outcome as the
            // lookup hit.
            Err(e) if e.is_constraint_violation() => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    fn to_row(&self, tender: &NewTender, raw: &Value) -> TenderRow {
        let now = chrono::Utc::now().to_rfc3339();
        TenderRow {
            id: uuid::Uuid::new_v4().to_string(),
            external_id: tender.external_id.clone(),
            bid_number: tender.bid_number.clone(),
            source: self.source_name.clone(),
            title: tender.title.clone(),
            agency: tender.agency.clone(),
            category: tender.category.clone(),
            value_min: tender.value_min,
            value_max: tender.value_max,
            deadline: tender.deadline.clone().unwrap_or_else(default_deadline),
            match_score: None,
            match_details: None,
            raw: Some(raw.to_string()),
            created_at: now.clone(),
            updated_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::result::Result;

    use async_trait::async_trait;
    use serde_json::json;

    use crate::error::ExternalServiceError;

    struct FixtureSource(Vec<Value>);

    #[async_trait]
    impl TenderSource for FixtureSource {
        async fn fetch_page(
            &self,
            _params: &SourceParams,
        ) -> Result<Vec<Value>, ExternalServiceError> {
            Ok(self.0.clone())
        }
    }

    fn records() -> Vec<Value> {
        vec![
            json!({"bidNumber": "T-100", "title": "Road maintenance", "deadline": "2026-09-15T00:00:00Z"}),
            json!({"externalId": "E-7", "title": "School IT refresh"}),
            json!({"tender_id": "A-3", "name": "Bridge inspection", "closing_date": "2026-11-01T00:00:00Z"}),
        ]
    }

    #[tokio::test]
    async fn test_sync_then_resync_is_idempotent() {
        let db = Database::open_in_memory().unwrap();
        let sync = TenderSynchronizer::new(db, Arc::new(FixtureSource(records())), "gov-portal");

        let first = sync.sync(&SourceParams::default()).await.unwrap();
        assert_eq!(first, SyncReport { saved: 3, skipped: 0, failed: 0 });

        let second = sync.sync(&SourceParams::default()).await.unwrap();
        assert_eq!(second, SyncReport { saved: 0, skipped: 3, failed: 0 });
    }

    #[tokio::test]
    async fn test_duplicate_bid_number_stored_once() {
        let db = Database::open_in_memory().unwrap();
        let record = json!({"bidNumber": "T-100", "title": "Road maintenance"});
        let sync = TenderSynchronizer::new(
            db.clone(),
            Arc::new(FixtureSource(vec![record])),
            "gov-portal",
        );

        sync.sync(&SourceParams::default()).await.unwrap();
        sync.sync(&SourceParams::default()).await.unwrap();

        let found = tender_repo::find_by_natural_key(&db, None, "gov-portal", Some("T-100"))
            .unwrap()
            .unwrap();
        assert_eq!(found.title, "Road maintenance");
        assert_eq!(tender_repo::list_ranked(&db, 100).unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_bad_record_does_not_abort_batch() {
        let db = Database::open_in_memory().unwrap();
        let mut mixed = records();
        mixed.insert(1, json!({"nothing": "recognizable"}));
        let sync = TenderSynchronizer::new(db, Arc::new(FixtureSource(mixed)), "gov-portal");

        let report = sync.sync(&SourceParams::default()).await.unwrap();
        assert_eq!(report, SyncReport { saved: 3, skipped: 0, failed: 1 });
    }

    #[tokio::test]
    async fn test_keyless_record_is_rejected_not_duplicated() {
        let db = Database::open_in_memory().unwrap();
        // Valid shape, but no externalId and no bidNumber: there is no
        // natural key to dedupe on across syncs.
        let keyless = json!({"title": "Unidentifiable listing"});
        let sync = TenderSynchronizer::new(
            db.clone(),
            Arc::new(FixtureSource(vec![keyless])),
            "gov-portal",
        );

        let first = sync.sync(&SourceParams::default()).await.unwrap();
        assert_eq!(first, SyncReport { saved: 0, skipped: 0, failed: 1 });

        let second = sync.sync(&SourceParams::default()).await.unwrap();
        assert_eq!(second, SyncReport { saved: 0, skipped: 0, failed: 1 });

        assert!(tender_repo::list_ranked(&db, 100).unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_missing_deadline_defaults_thirty_days_out() {
        let db = Database::open_in_memory().unwrap();
        let sync = TenderSynchronizer::new(
            db.clone(),
            Arc::new(FixtureSource(vec![
                json!({"bidNumber": "T-9", "title": "No deadline given"}),
            ])),
            "gov-portal",
        );
        sync.sync(&SourceParams::default()).await.unwrap();

        let row = tender_repo::find_by_natural_key(&db, None, "gov-portal", Some("T-9"))
            .unwrap()
            .unwrap();
        let deadline = chrono::DateTime::parse_from_rfc3339(&row.deadline).unwrap();
        let days_out = (deadline.with_timezone(&chrono::Utc) - chrono::Utc::now()).num_days();
        assert!((29..=30).contains(&days_out), "got {} days", days_out);
    }

    #[tokio::test]
    async fn test_raw_snapshot_is_kept() {
        let db = Database::open_in_memory().unwrap();
        let sync = TenderSynchronizer::new(
            db.clone(),
            Arc::new(FixtureSource(vec![
                json!({"bidNumber": "T-1", "title": "Snapshot check", "extraField": 7}),
            ])),
            "gov-portal",
        );
        sync.sync(&SourceParams::default()).await.unwrap();

        let row = tender_repo::find_by_natural_key(&db, None, "gov-portal", Some("T-1"))
            .unwrap()
            .unwrap();
        assert!(row.raw.as_deref().unwrap().contains("extraField"));
    }

    #[tokio::test]
    async fn test_source_failure_propagates() {
        struct BrokenSource;

        #[async_trait]
        impl TenderSource for BrokenSource {
            async fn fetch_page(
                &self,
                _params: &SourceParams,
            ) -> Result<Vec<Value>, ExternalServiceError> {
                Err(ExternalServiceError::Transient("registry down".to_string()))
            }
        }

        let db = Database::open_in_memory().unwrap();
        let sync = TenderSynchronizer::new(db, Arc::new(BrokenSource), "gov-portal");
        assert!(sync.sync(&SourceParams::default()).await.is_err());
    }
}
