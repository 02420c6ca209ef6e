//! End-to-end tests for the document-to-recommendation pipeline.

mod common;

use serde_json::json;

use tendermatch::db::{document_repo, profile_repo, tender_repo};
use tendermatch::jobs::DocumentStatus;
use tendermatch::services::SourceParams;
use tendermatch::tenders::SyncReport;

use common::{candidate, TestHarness};

const ACME_TEXT: &str = "ACME Corp provides IT consulting services";

fn acme_extraction() -> serde_json::Value {
    json!({
        "companyDescription": ACME_TEXT,
        "companyActivities": ["IT consulting"]
    })
}

#[tokio::test]
async fn upload_process_and_complete() {
    let harness = TestHarness::new(ACME_TEXT, acme_extraction(), vec![]);

    let document_id = harness.upload("owner-1");

    // Upload is synchronous and leaves the record pending.
    let record = document_repo::find_by_id(&harness.db, &document_id)
        .unwrap()
        .unwrap();
    assert_eq!(record.status, "pending");
    assert!(profile_repo::find_by_owner(&harness.db, "owner-1")
        .unwrap()
        .is_none());

    harness.processor.trigger(&document_id).unwrap();
    let status = harness.wait_terminal(&document_id).await;

    assert_eq!(status.status, DocumentStatus::Completed);
    assert_eq!(status.progress, 100);

    let record = document_repo::find_by_id(&harness.db, &document_id)
        .unwrap()
        .unwrap();
    assert_eq!(record.status, "completed");
    assert_eq!(record.extracted_text.as_deref(), Some(ACME_TEXT));
    assert!(record.processed_at.is_some());

    // Blank profile gains 30 base + 15 description + 15 activities.
    let profile = profile_repo::find_by_owner(&harness.db, "owner-1")
        .unwrap()
        .unwrap();
    assert!(profile.completeness >= 60);
    assert!(profile.query_data.contains("ACME Corp"));
}

#[tokio::test]
async fn reupload_supersedes_and_reprocesses() {
    let harness = TestHarness::new(ACME_TEXT, acme_extraction(), vec![]);

    let first = harness.upload("owner-1");
    harness.processor.trigger(&first).unwrap();
    harness.wait_terminal(&first).await;

    let second = harness.upload("owner-1");
    assert!(document_repo::find_by_id(&harness.db, &first)
        .unwrap()
        .is_none());

    harness.processor.trigger(&second).unwrap();
    let status = harness.wait_terminal(&second).await;
    assert_eq!(status.status, DocumentStatus::Completed);

    // Profile survives the replacement and stays merged.
    let profile = profile_repo::find_by_owner(&harness.db, "owner-1")
        .unwrap()
        .unwrap();
    assert!(profile.completeness >= 60);
}

#[tokio::test]
async fn sync_is_idempotent_across_calls() {
    let harness = TestHarness::new(ACME_TEXT, acme_extraction(), vec![]);
    let params = SourceParams::default();

    let first = harness.synchronizer.sync(&params).await.unwrap();
    assert_eq!(
        first,
        SyncReport {
            saved: 3,
            skipped: 0,
            failed: 0
        }
    );

    let second = harness.synchronizer.sync(&params).await.unwrap();
    assert_eq!(
        second,
        SyncReport {
            saved: 0,
            skipped: 3,
            failed: 0
        }
    );

    // The record without a deadline got the thirty-day default.
    let no_deadline = tender_repo::find_by_natural_key(&harness.db, None, "synthetic", Some("T-SYN-003"))
        .unwrap()
        .unwrap();
    assert!(chrono::DateTime::parse_from_rfc3339(&no_deadline.deadline).is_ok());
}

#[tokio::test]
async fn full_flow_document_to_ranked_recommendations() {
    let harness = TestHarness::new(
        ACME_TEXT,
        acme_extraction(),
        vec![
            candidate("T-SYN-002", "Managed network services", 88.0),
            candidate("T-SYN-001", "Office IT infrastructure refresh", 61.5),
        ],
    );

    let document_id = harness.upload("owner-1");
    harness.processor.trigger(&document_id).unwrap();
    harness.wait_terminal(&document_id).await;

    harness
        .synchronizer
        .sync(&SourceParams::default())
        .await
        .unwrap();

    let ranked = harness
        .engine
        .get_recommendations("owner-1", 10, true)
        .await
        .unwrap();

    // Scored tenders first, strictly descending; the unscored one trails.
    let scores: Vec<Option<f64>> = ranked.iter().map(|t| t.match_score).collect();
    assert_eq!(scores, vec![Some(88.0), Some(61.5), None]);
    assert_eq!(ranked[0].bid_number.as_deref(), Some("T-SYN-002"));
    assert_eq!(ranked.len(), 3);

    // Candidates updated the synced rows in place instead of duplicating.
    assert_eq!(tender_repo::list_ranked(&harness.db, 100).unwrap().len(), 3);

    // The search query came from the merged profile.
    let queries = harness.search.queries.lock().unwrap();
    assert!(queries[0].contains("ACME Corp"));
}

#[tokio::test]
async fn refresh_without_candidates_serves_unscored_order() {
    let harness = TestHarness::new(ACME_TEXT, acme_extraction(), vec![]);

    harness
        .synchronizer
        .sync(&SourceParams::default())
        .await
        .unwrap();

    // Empty candidate set: the scored set stays empty, one retry happens,
    // and the unscored deadline ordering is served.
    let ranked = harness
        .engine
        .get_recommendations("owner-1", 10, true)
        .await
        .unwrap();
    assert_eq!(ranked.len(), 3);
    assert!(ranked.iter().all(|t| t.match_score.is_none()));
    assert_eq!(
        harness
            .search
            .calls
            .load(std::sync::atomic::Ordering::SeqCst),
        2
    );

    let deadlines: Vec<&str> = ranked.iter().map(|t| t.deadline.as_str()).collect();
    let mut sorted = deadlines.clone();
    sorted.sort();
    assert_eq!(deadlines, sorted);
}
