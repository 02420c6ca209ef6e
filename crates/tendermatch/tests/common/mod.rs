//! Test harness for isolated pipeline execution.
//!
//! `TestHarness` wires the full stack — intake, processor, synchronizer,
//! recommendation engine — against scripted external services and an
//! in-memory database, inside a temporary storage directory.

#![allow(dead_code)]

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tempfile::TempDir;

use tendermatch::config::IntakeConfig;
use tendermatch::error::ExternalServiceError;
use tendermatch::jobs::ProgressBroadcaster;
use tendermatch::ocr::{DocumentProcessor, ProcessingPolicy, StatusResponse};
use tendermatch::profile::{ProfileExtractor, ProfileMerger};
use tendermatch::services::{
    SearchCandidate, SemanticSearch, SyntheticTenderSource, TicketStatus,
};
use tendermatch::services::{ExtractionService, OcrService};
use tendermatch::{
    Database, DocumentIntake, DocumentStore, PostCommitHooks, RecommendationEngine,
    TenderSynchronizer,
};

/// OCR double: needs one poll before the ticket turns processed, then
/// serves the configured text.
pub struct MockOcr {
    text: String,
    pub polls: AtomicU32,
}

impl MockOcr {
    pub fn returning(text: &str) -> Self {
        Self {
            text: text.to_string(),
            polls: AtomicU32::new(0),
        }
    }
}

#[async_trait]
impl OcrService for MockOcr {
    async fn submit(&self, _bytes: &[u8]) -> Result<String, ExternalServiceError> {
        Ok("ticket-1".to_string())
    }

    async fn poll(&self, _ticket: &str) -> Result<TicketStatus, ExternalServiceError> {
        let seen = self.polls.fetch_add(1, Ordering::SeqCst);
        if seen == 0 {
            Ok(TicketStatus::Processing)
        } else {
            Ok(TicketStatus::Processed)
        }
    }

    async fn retrieve(&self, _ticket: &str) -> Result<String, ExternalServiceError> {
        Ok(self.text.clone())
    }
}

pub struct MockExtraction(pub Value);

#[async_trait]
impl ExtractionService for MockExtraction {
    async fn infer(&self, _text: &str) -> Result<Value, ExternalServiceError> {
        Ok(self.0.clone())
    }
}

/// Search double recording every query it receives.
pub struct MockSearch {
    candidates: Vec<SearchCandidate>,
    pub calls: AtomicU32,
    pub queries: std::sync::Mutex<Vec<String>>,
}

impl MockSearch {
    pub fn returning(candidates: Vec<SearchCandidate>) -> Self {
        Self {
            candidates,
            calls: AtomicU32::new(0),
            queries: std::sync::Mutex::new(vec![]),
        }
    }
}

#[async_trait]
impl SemanticSearch for MockSearch {
    async fn query(
        &self,
        text: &str,
        _limit: u32,
        _active_only: bool,
    ) -> Result<Vec<SearchCandidate>, ExternalServiceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.queries.lock().unwrap().push(text.to_string());
        Ok(self.candidates.clone())
    }
}

pub fn candidate(bid: &str, title: &str, similarity: f64) -> SearchCandidate {
    SearchCandidate {
        external_id: None,
        bid_number: Some(bid.to_string()),
        source: "synthetic".to_string(),
        title: title.to_string(),
        agency: None,
        category: None,
        value_min: None,
        value_max: None,
        deadline: Some("2026-09-15T00:00:00Z".to_string()),
        similarity,
        match_details: None,
    }
}

pub struct TestHarness {
    temp_dir: TempDir,
    pub db: Database,
    pub intake: DocumentIntake,
    pub processor: DocumentProcessor,
    pub synchronizer: TenderSynchronizer,
    pub engine: RecommendationEngine,
    pub ocr: Arc<MockOcr>,
    pub search: Arc<MockSearch>,
}

impl TestHarness {
    pub fn new(ocr_text: &str, extraction: Value, candidates: Vec<SearchCandidate>) -> Self {
        let temp_dir = TempDir::new().expect("temp dir");
        let db = Database::open_in_memory().expect("in-memory database");

        let intake = DocumentIntake::new(
            db.clone(),
            DocumentStore::new(temp_dir.path()),
            IntakeConfig::default(),
        );

        let ocr = Arc::new(MockOcr::returning(ocr_text));
        let processor = DocumentProcessor::new(
            db.clone(),
            DocumentStore::new(temp_dir.path()),
            ocr.clone(),
            ProfileExtractor::new(Arc::new(MockExtraction(extraction)), 6000),
            ProfileMerger::new(db.clone()),
            ProgressBroadcaster::new(64),
            PostCommitHooks::new(),
            ProcessingPolicy {
                submit_timeout: Duration::from_millis(500),
                poll_interval: Duration::from_millis(2),
                max_poll_attempts: 20,
            },
        );

        let synchronizer =
            TenderSynchronizer::new(db.clone(), Arc::new(SyntheticTenderSource), "synthetic");

        let search = Arc::new(MockSearch::returning(candidates));
        let engine = RecommendationEngine::new(db.clone(), search.clone(), true);

        Self {
            temp_dir,
            db,
            intake,
            processor,
            synchronizer,
            engine,
            ocr,
            search,
        }
    }

    /// Uploads a small PDF for the owner and returns its document id.
    pub fn upload(&self, owner_id: &str) -> String {
        self.intake
            .submit_document(b"%PDF-1.4 fixture", "company.pdf", "application/pdf", owner_id)
            .expect("upload accepted")
    }

    /// Polls the status interface until the document reaches a terminal
    /// state.
    pub async fn wait_terminal(&self, document_id: &str) -> StatusResponse {
        for _ in 0..500 {
            let status = self.processor.status(document_id).expect("status");
            if status.status.is_terminal() {
                return status;
            }
            tokio::time::sleep(Duration::from_millis(2)).await;
        }
        panic!("document {} never reached a terminal state", document_id);
    }
}
