//! OCR orchestration: the document processing state machine.
//!
//! `pending → processing → {completed, error}`. Triggering is decoupled
//! from the upload and returns immediately; the slow work (submission,
//! bounded polling, extraction, merging) runs on a spawned task. Failures
//! are written into the owning record — a background job never crashes
//! the process or throws past its boundary.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;

use crate::config::OcrConfig;
use crate::db::{document_repo, Database};
use crate::db::document_repo::DocumentRow;
use crate::error::{ExternalServiceError, Result, TenderMatchError};
use crate::hooks::PostCommitHooks;
use crate::intake::DocumentStore;
use crate::jobs::{DocumentStatus, JobRegistry, JobStage, ProgressBroadcaster, ProgressEvent, TrackedJob};
use crate::profile::{ProfileExtractor, ProfileMerger};
use crate::services::{OcrService, PipelineEvent, TicketStatus};

/// Timing policy for the OCR state machine.
#[derive(Debug, Clone)]
pub struct ProcessingPolicy {
    /// Wall-clock ceiling for the submission call.
    pub submit_timeout: Duration,
    /// Fixed interval between ticket polls.
    pub poll_interval: Duration,
    /// Hard ceiling on poll attempts.
    pub max_poll_attempts: u32,
}

impl ProcessingPolicy {
    pub fn from_config(config: &OcrConfig) -> Self {
        Self {
            submit_timeout: Duration::from_secs(config.submit_timeout_secs),
            poll_interval: Duration::from_secs(config.poll_interval_secs),
            max_poll_attempts: config.max_poll_attempts,
        }
    }
}

impl Default for ProcessingPolicy {
    fn default() -> Self {
        Self::from_config(&OcrConfig::default())
    }
}

/// Response of the status interface. Progress is a stage heuristic, not a
/// measurement.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    pub status: DocumentStatus,
    pub stage: JobStage,
    pub progress: u8,
    pub message: String,
}

struct Inner {
    db: Database,
    store: DocumentStore,
    ocr: Arc<dyn OcrService>,
    extractor: ProfileExtractor,
    merger: ProfileMerger,
    registry: JobRegistry,
    broadcaster: ProgressBroadcaster,
    hooks: PostCommitHooks,
    policy: ProcessingPolicy,
}

/// Orchestrates document processing. Cloning is cheap (inner `Arc`).
#[derive(Clone)]
pub struct DocumentProcessor {
    inner: Arc<Inner>,
}

impl DocumentProcessor {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        db: Database,
        store: DocumentStore,
        ocr: Arc<dyn OcrService>,
        extractor: ProfileExtractor,
        merger: ProfileMerger,
        broadcaster: ProgressBroadcaster,
        hooks: PostCommitHooks,
        policy: ProcessingPolicy,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                db,
                store,
                ocr,
                extractor,
                merger,
                registry: JobRegistry::new(),
                broadcaster,
                hooks,
                policy,
            }),
        }
    }

    /// Subscribes to pipeline progress events.
    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<ProgressEvent> {
        self.inner.broadcaster.subscribe()
    }

    /// Starts background processing for a pending document. Returns as soon
    /// as the work is accepted; completion is observed via `status`.
    pub fn trigger(&self, document_id: &str) -> Result<()> {
        let record = document_repo::find_by_id(&self.inner.db, document_id)?
            .ok_or_else(|| TenderMatchError::NotFound(format!("document {}", document_id)))?;

        document_repo::update_status(&self.inner.db, document_id, "processing", None)?;
        self.inner.registry.set(TrackedJob::queued(document_id));
        self.inner
            .broadcaster
            .send(ProgressEvent::new(document_id, JobStage::Queued, "Queued for processing"));

        let this = self.clone();
        tokio::spawn(async move {
            this.run(record).await;
        });

        Ok(())
    }

    /// Reads the current status, healing the persisted record against the
    /// registry first. The persisted record is authoritative.
    pub fn status(&self, document_id: &str) -> Result<StatusResponse> {
        let record = document_repo::find_by_id(&self.inner.db, document_id)?
            .ok_or_else(|| TenderMatchError::NotFound(format!("document {}", document_id)))?;

        let healed = self
            .inner
            .registry
            .reconcile(&self.inner.db, document_id, &record.status)?;
        let status = DocumentStatus::parse(&healed, document_id);

        let job = self.inner.registry.get(document_id);
        let (stage, message, attempt) = match (&job, status) {
            (Some(job), _) if job.stage != JobStage::Queued || !status.is_terminal() => {
                (job.stage, job.message.clone(), job.attempt)
            }
            // No live registry entry (e.g. after restart) — derive from
            // the record alone.
            (_, DocumentStatus::Completed) => (
                JobStage::Completed,
                "Processing completed".to_string(),
                0,
            ),
            (_, DocumentStatus::Error) => (
                JobStage::Failed,
                message_for_error(record.error.as_deref()),
                0,
            ),
            (_, DocumentStatus::Processing) => (
                JobStage::Polling,
                "Still processing".to_string(),
                0,
            ),
            (_, DocumentStatus::Pending) => (
                JobStage::Queued,
                "Awaiting processing trigger".to_string(),
                0,
            ),
        };

        Ok(StatusResponse {
            status,
            stage,
            progress: progress_for(stage, attempt, self.inner.policy.max_poll_attempts),
            message,
        })
    }

    async fn run(&self, record: DocumentRow) {
        log::info!("Processing document {} for owner {}", record.id, record.owner_id);
        if let Err(e) = self.process(&record).await {
            self.fail(&record, e).await;
        }
    }

    async fn process(&self, record: &DocumentRow) -> Result<()> {
        let bytes = self.inner.store.read(Path::new(&record.storage_path))?;

        self.update(&record.id, JobStage::Submitting, "Submitting document to OCR", None, 0);
        let submit = self.inner.ocr.submit(&bytes);
        let ticket = match tokio::time::timeout(self.inner.policy.submit_timeout, submit).await {
            Ok(Ok(ticket)) => ticket,
            Ok(Err(e)) => return Err(e.into()),
            Err(_) => {
                return Err(ExternalServiceError::Timeout(format!(
                    "OCR submission exceeded {}s",
                    self.inner.policy.submit_timeout.as_secs()
                ))
                .into())
            }
        };
        log::debug!("Document {} submitted, ticket {}", record.id, ticket);

        let text = self.poll_for_text(record, &ticket).await?;
        document_repo::set_extracted_text(&self.inner.db, &record.id, &text)?;

        self.update(&record.id, JobStage::Extracting, "Extracting company profile", Some(&ticket), 0);
        let extracted = self.inner.extractor.extract(&text).await;

        // A newer upload may have superseded this document mid-flight.
        // The completion is orphaned: drop it before it touches the
        // profile or resurrects a deleted record.
        if document_repo::find_by_id(&self.inner.db, &record.id)?.is_none() {
            log::debug!(
                "Document {} superseded during processing, dropping completion",
                record.id
            );
            return Ok(());
        }

        self.update(&record.id, JobStage::Merging, "Merging profile data", Some(&ticket), 0);
        let profile = self.inner.merger.merge(&record.owner_id, &extracted)?;

        let data = serde_json::to_string(&extracted)
            .map_err(|e| TenderMatchError::Internal(format!("serialize extraction: {}", e)))?;
        document_repo::complete(&self.inner.db, &record.id, &data)?;

        self.update(&record.id, JobStage::Completed, "Processing completed", Some(&ticket), 0);
        self.inner
            .hooks
            .run(
                &record.owner_id,
                &PipelineEvent::DocumentCompleted {
                    document_id: record.id.clone(),
                    completeness: profile.completeness,
                },
            )
            .await;

        log::info!("Document {} completed", record.id);
        Ok(())
    }

    /// Polls the ticket at a fixed interval under the attempt ceiling.
    /// Transient poll errors consume an attempt; they never loop forever.
    async fn poll_for_text(&self, record: &DocumentRow, ticket: &str) -> Result<String> {
        let max = self.inner.policy.max_poll_attempts;

        for attempt in 1..=max {
            tokio::time::sleep(self.inner.policy.poll_interval).await;
            self.update(
                &record.id,
                JobStage::Polling,
                &format!("Waiting for OCR ({}/{})", attempt, max),
                Some(ticket),
                attempt,
            );

            match self.inner.ocr.poll(ticket).await {
                Ok(TicketStatus::Processed) => {
                    let text = self.inner.ocr.retrieve(ticket).await?;
                    return Ok(text);
                }
                Ok(TicketStatus::Error) => {
                    return Err(ExternalServiceError::Processing(format!(
                        "OCR ticket {} reported failure",
                        ticket
                    ))
                    .into());
                }
                Ok(_) => {}
                Err(e) => {
                    log::warn!(
                        "Poll attempt {}/{} for document {} failed: {}",
                        attempt,
                        max,
                        record.id,
                        e
                    );
                }
            }
        }

        Err(ExternalServiceError::Timeout(format!(
            "OCR did not finish within {} poll attempts",
            max
        ))
        .into())
    }

    async fn fail(&self, record: &DocumentRow, err: TenderMatchError) {
        log::error!("Processing document {} failed: {}", record.id, err);

        let detail = err.to_string();
        let user_message = match &err {
            TenderMatchError::External(e) => e.user_message(),
            _ => "failed — retry now",
        };

        if let Err(db_err) =
            document_repo::update_status(&self.inner.db, &record.id, "error", Some(&detail))
        {
            log::error!(
                "Could not record failure for document {}: {}",
                record.id,
                db_err
            );
        }

        self.inner.registry.set(TrackedJob {
            document_id: record.id.clone(),
            status: DocumentStatus::Error,
            stage: JobStage::Failed,
            ticket: None,
            message: user_message.to_string(),
            attempt: 0,
        });
        self.inner
            .broadcaster
            .send(ProgressEvent::failed(&record.id, &detail));
        self.inner
            .hooks
            .run(
                &record.owner_id,
                &PipelineEvent::DocumentFailed {
                    document_id: record.id.clone(),
                    error: detail,
                },
            )
            .await;
    }

    fn update(
        &self,
        document_id: &str,
        stage: JobStage,
        message: &str,
        ticket: Option<&str>,
        attempt: u32,
    ) {
        let event = ProgressEvent::new(document_id, stage, message);
        self.inner.registry.set(TrackedJob {
            document_id: document_id.to_string(),
            status: event.status,
            stage,
            ticket: ticket.map(|t| t.to_string()),
            message: message.to_string(),
            attempt,
        });
        self.inner.broadcaster.send(event);
    }
}

/// Heuristic progress for a stage. Polling advances with attempts.
fn progress_for(stage: JobStage, attempt: u32, max_attempts: u32) -> u8 {
    match stage {
        JobStage::Queued => 5,
        JobStage::Submitting => 20,
        JobStage::Polling => {
            let span = 30 * attempt.min(max_attempts) / max_attempts.max(1);
            (40 + span) as u8
        }
        JobStage::Extracting => 80,
        JobStage::Merging => 90,
        JobStage::Completed | JobStage::Failed => 100,
    }
}

/// Derives the user-facing message from a persisted error when no registry
/// entry survives (e.g. after restart).
fn message_for_error(error: Option<&str>) -> String {
    match error {
        Some(e) if e.contains("Quota exceeded") => "quota exceeded — retry later".to_string(),
        Some(e) if e.contains("Rate limited") => "rate limited — retry later".to_string(),
        Some(_) | None => "failed — retry now".to_string(),
    }
}
