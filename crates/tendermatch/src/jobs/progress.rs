//! Job progress types and the broadcast channel for streaming them.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Lifecycle status of a document. Mirrors the persisted `status` column.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DocumentStatus {
    Pending,
    Processing,
    Completed,
    Error,
}

impl DocumentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentStatus::Pending => "pending",
            DocumentStatus::Processing => "processing",
            DocumentStatus::Completed => "completed",
            DocumentStatus::Error => "error",
        }
    }

    /// Parses a persisted status string, defaulting to Pending on anything
    /// unknown.
    pub fn parse(s: &str, document_id: &str) -> Self {
        match s {
            "pending" => DocumentStatus::Pending,
            "processing" => DocumentStatus::Processing,
            "completed" => DocumentStatus::Completed,
            "error" => DocumentStatus::Error,
            other => {
                log::warn!(
                    "Unknown document status '{}' for {}, defaulting to pending",
                    other,
                    document_id
                );
                DocumentStatus::Pending
            }
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, DocumentStatus::Completed | DocumentStatus::Error)
    }
}

/// Stage of the ingestion pipeline, used for the status interface's
/// heuristic progress value.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum JobStage {
    Queued,
    Submitting,
    Polling,
    Extracting,
    Merging,
    Completed,
    Failed,
}

impl std::fmt::Display for JobStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JobStage::Queued => write!(f, "Queued"),
            JobStage::Submitting => write!(f, "Submitting to OCR"),
            JobStage::Polling => write!(f, "Waiting for OCR"),
            JobStage::Extracting => write!(f, "Extracting profile"),
            JobStage::Merging => write!(f, "Merging profile"),
            JobStage::Completed => write!(f, "Completed"),
            JobStage::Failed => write!(f, "Failed"),
        }
    }
}

/// Progress event for a document job.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressEvent {
    pub document_id: String,
    pub stage: JobStage,
    pub status: DocumentStatus,
    /// Human-readable message describing current activity.
    pub message: String,
    pub timestamp: DateTime<Utc>,
    /// Error message (set on failure).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ProgressEvent {
    pub fn new(document_id: &str, stage: JobStage, message: &str) -> Self {
        let status = match stage {
            JobStage::Completed => DocumentStatus::Completed,
            JobStage::Failed => DocumentStatus::Error,
            JobStage::Queued => DocumentStatus::Pending,
            _ => DocumentStatus::Processing,
        };

        Self {
            document_id: document_id.to_string(),
            stage,
            status,
            message: message.to_string(),
            timestamp: Utc::now(),
            error: None,
        }
    }

    pub fn failed(document_id: &str, error: &str) -> Self {
        let mut event = Self::new(document_id, JobStage::Failed, "Processing failed");
        event.error = Some(error.to_string());
        event
    }
}

/// Broadcasts job progress events for streaming observers.
#[derive(Clone)]
pub struct ProgressBroadcaster {
    sender: Arc<broadcast::Sender<ProgressEvent>>,
}

impl ProgressBroadcaster {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender: Arc::new(sender),
        }
    }

    /// Sends a progress event to all subscribers.
    pub fn send(&self, event: ProgressEvent) {
        // Ignore errors - no active receivers is fine
        let _ = self.sender.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ProgressEvent> {
        self.sender.subscribe()
    }
}

impl Default for ProgressBroadcaster {
    fn default() -> Self {
        Self::new(100)
    }
}
