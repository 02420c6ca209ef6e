//! Seams for the external collaborators: OCR, structured extraction,
//! tender source, semantic search, and the notification sink.
//!
//! Each collaborator is a trait; one concrete implementation is selected
//! at startup (live HTTP, recorded fixture, or synthetic) so no call-site
//! branches on the backing strategy.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ExternalServiceError;

pub mod http;
pub mod source;

pub use http::{HttpExtractionService, HttpOcrService, HttpSemanticSearch, HttpTenderSource};
pub use source::{build_tender_source, RecordedTenderSource, SyntheticTenderSource};

/// Status of an OCR ticket as reported by the external service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TicketStatus {
    Queued,
    Processing,
    Processed,
    Error,
}

/// Parameters for fetching a page of raw tender listings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SourceParams {
    pub category: Option<String>,
    pub page: u32,
    pub page_size: u32,
}

/// A ranked candidate returned by the semantic search service.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchCandidate {
    pub external_id: Option<String>,
    pub bid_number: Option<String>,
    pub source: String,
    pub title: String,
    #[serde(default)]
    pub agency: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub value_min: Option<f64>,
    #[serde(default)]
    pub value_max: Option<f64>,
    #[serde(default)]
    pub deadline: Option<String>,
    /// Similarity signal, 0–100.
    pub similarity: f64,
    #[serde(default)]
    pub match_details: Option<String>,
}

/// Event delivered to notification sinks after a pipeline run commits.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase", tag = "kind")]
pub enum PipelineEvent {
    DocumentCompleted {
        document_id: String,
        completeness: u8,
    },
    DocumentFailed {
        document_id: String,
        error: String,
    },
}

/// External OCR service: submit bytes, poll the ticket, retrieve text.
#[async_trait]
pub trait OcrService: Send + Sync {
    async fn submit(&self, bytes: &[u8]) -> Result<String, ExternalServiceError>;
    async fn poll(&self, ticket: &str) -> Result<TicketStatus, ExternalServiceError>;
    async fn retrieve(&self, ticket: &str) -> Result<String, ExternalServiceError>;
}

/// External language-model extraction service.
#[async_trait]
pub trait ExtractionService: Send + Sync {
    async fn infer(&self, text: &str) -> Result<serde_json::Value, ExternalServiceError>;
}

/// External source of raw tender listings.
#[async_trait]
pub trait TenderSource: Send + Sync {
    async fn fetch_page(
        &self,
        params: &SourceParams,
    ) -> Result<Vec<serde_json::Value>, ExternalServiceError>;
}

/// External semantic search over tender listings.
#[async_trait]
pub trait SemanticSearch: Send + Sync {
    async fn query(
        &self,
        text: &str,
        limit: u32,
        active_only: bool,
    ) -> Result<Vec<SearchCandidate>, ExternalServiceError>;
}

/// Notification sink, invoked from the post-commit hook list. Delivery
/// mechanics are out of scope; implementations must not fail the pipeline.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn notify(&self, owner_id: &str, event: &PipelineEvent);
}

/// Sink that just logs events. Useful default when no delivery channel
/// is configured.
pub struct LogNotificationSink;

#[async_trait]
impl NotificationSink for LogNotificationSink {
    async fn notify(&self, owner_id: &str, event: &PipelineEvent) {
        match event {
            PipelineEvent::DocumentCompleted {
                document_id,
                completeness,
            } => log::info!(
                "Document {} for owner {} completed (completeness {})",
                document_id,
                owner_id,
                completeness
            ),
            PipelineEvent::DocumentFailed { document_id, error } => log::warn!(
                "Document {} for owner {} failed: {}",
                document_id,
                owner_id,
                error
            ),
        }
    }
}
