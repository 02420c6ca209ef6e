//! In-memory registry of background job progress.
//!
//! The registry is a cache keyed by document id, owned by the orchestrator.
//! It is explicitly not authoritative: the persisted document record is the
//! source of truth, and `reconcile` heals the record when the registry has
//! observed a completion the record missed (race or restart).

use std::collections::HashMap;
use std::sync::RwLock;

use serde::Serialize;

use crate::db::{document_repo, Database, DatabaseError};
use crate::jobs::progress::{DocumentStatus, JobStage};

/// Tracked state of one background job.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackedJob {
    pub document_id: String,
    pub status: DocumentStatus,
    pub stage: JobStage,
    /// External OCR job ticket, once submission succeeded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ticket: Option<String>,
    pub message: String,
    /// Poll attempts issued so far.
    pub attempt: u32,
}

impl TrackedJob {
    pub fn queued(document_id: &str) -> Self {
        Self {
            document_id: document_id.to_string(),
            status: DocumentStatus::Pending,
            stage: JobStage::Queued,
            ticket: None,
            message: "Queued for processing".to_string(),
            attempt: 0,
        }
    }
}

/// Process-wide job registry. A guarded map, nothing more — read and
/// written only by the orchestration components.
pub struct JobRegistry {
    jobs: RwLock<HashMap<String, TrackedJob>>,
}

impl JobRegistry {
    pub fn new() -> Self {
        Self {
            jobs: RwLock::new(HashMap::new()),
        }
    }

    pub fn get(&self, document_id: &str) -> Option<TrackedJob> {
        let guard = match self.jobs.read() {
            Ok(g) => g,
            Err(poisoned) => {
                log::warn!("Job registry lock was poisoned, recovering");
                poisoned.into_inner()
            }
        };
        guard.get(document_id).cloned()
    }

    pub fn set(&self, job: TrackedJob) {
        let mut guard = match self.jobs.write() {
            Ok(g) => g,
            Err(poisoned) => {
                log::warn!("Job registry lock was poisoned, recovering");
                poisoned.into_inner()
            }
        };
        guard.insert(job.document_id.clone(), job);
    }

    /// Heals the persisted record against the registry. If the registry has
    /// observed a completion the record missed, the record is updated; the
    /// corrected status string is returned. The record always wins in every
    /// other divergence.
    pub fn reconcile(
        &self,
        db: &Database,
        document_id: &str,
        record_status: &str,
    ) -> Result<String, DatabaseError> {
        let tracked = self.get(document_id);

        if let Some(job) = tracked {
            if job.status == DocumentStatus::Completed && record_status != "completed" {
                log::info!(
                    "Registry reports {} completed but record says '{}' — healing record",
                    document_id,
                    record_status
                );
                document_repo::update_status(db, document_id, "completed", None)?;
                return Ok("completed".to_string());
            }
        }

        Ok(record_status.to_string())
    }
}

impl Default for JobRegistry {
    fn default() -> Self {
        Self::new()
    }
}
