//! Tender source strategies.
//!
//! One concrete `TenderSource` is built from configuration at startup;
//! nothing downstream branches on live-vs-recorded-vs-synthetic.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::config::{SourceMode, TenderSourceConfig};
use crate::error::{ExternalServiceError, TenderMatchError};

use super::{HttpTenderSource, SourceParams, TenderSource};

/// Builds the configured tender source. Called once at startup.
pub fn build_tender_source(
    config: &TenderSourceConfig,
) -> Result<Arc<dyn TenderSource>, TenderMatchError> {
    match config.mode {
        SourceMode::Live => {
            let endpoint = config.endpoint.as_deref().ok_or_else(|| {
                TenderMatchError::Internal("live tender source requires an endpoint".to_string())
            })?;
            Ok(Arc::new(HttpTenderSource::new(endpoint)?))
        }
        SourceMode::Recorded => {
            let path = config.fixture_path.as_deref().ok_or_else(|| {
                TenderMatchError::Internal(
                    "recorded tender source requires a fixture path".to_string(),
                )
            })?;
            Ok(Arc::new(RecordedTenderSource::new(PathBuf::from(path))))
        }
        SourceMode::Synthetic => Ok(Arc::new(SyntheticTenderSource)),
    }
}

/// Replays raw records from a JSON fixture file (an array of objects).
/// The file is re-read per fetch so fixtures can change between calls.
pub struct RecordedTenderSource {
    path: PathBuf,
}

impl RecordedTenderSource {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

#[async_trait]
impl TenderSource for RecordedTenderSource {
    async fn fetch_page(
        &self,
        params: &SourceParams,
    ) -> Result<Vec<Value>, ExternalServiceError> {
        let content = tokio::fs::read_to_string(&self.path).await.map_err(|e| {
            ExternalServiceError::Unknown(format!(
                "failed to read fixture '{}': {}",
                self.path.display(),
                e
            ))
        })?;

        let records: Vec<Value> = serde_json::from_str(&content).map_err(|e| {
            ExternalServiceError::MalformedResponse(format!(
                "fixture '{}' is not a JSON array: {}",
                self.path.display(),
                e
            ))
        })?;

        let page_size = if params.page_size == 0 {
            records.len()
        } else {
            params.page_size as usize
        };
        let start = (params.page as usize).saturating_mul(page_size);
        Ok(records.into_iter().skip(start).take(page_size).collect())
    }
}

/// Deterministic generated records for demos and tests. Page 0 yields a
/// small fixed batch; later pages are empty.
pub struct SyntheticTenderSource;

#[async_trait]
impl TenderSource for SyntheticTenderSource {
    async fn fetch_page(
        &self,
        params: &SourceParams,
    ) -> Result<Vec<Value>, ExternalServiceError> {
        if params.page > 0 {
            return Ok(vec![]);
        }

        let category = params.category.as_deref().unwrap_or("general");
        Ok(vec![
            json!({
                "externalId": "SYN-001",
                "bidNumber": "T-SYN-001",
                "title": "Office IT infrastructure refresh",
                "agency": "Department of Administration",
                "category": category,
                "valueMin": 25000.0,
                "valueMax": 120000.0,
                "deadline": "2026-10-01T00:00:00Z",
            }),
            json!({
                "externalId": "SYN-002",
                "bidNumber": "T-SYN-002",
                "title": "Managed network services",
                "agency": "Regional Health Authority",
                "category": category,
                "valueMin": 50000.0,
                "valueMax": 300000.0,
                "deadline": "2026-11-15T00:00:00Z",
            }),
            json!({
                "externalId": "SYN-003",
                "bidNumber": "T-SYN-003",
                "title": "Legacy application modernization",
                "agency": "Ministry of Finance",
                "category": category,
            }),
        ])
    }
}
