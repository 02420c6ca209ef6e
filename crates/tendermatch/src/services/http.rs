//! Live HTTP implementations of the external collaborators.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::Value;

use crate::error::ExternalServiceError;

use super::{
    ExtractionService, OcrService, SearchCandidate, SemanticSearch, SourceParams, TenderSource,
    TicketStatus,
};

/// Maximum length for sanitized error bodies to prevent log flooding.
const MAX_ERROR_BODY_LENGTH: usize = 200;

/// Default connect timeout for HTTP requests (10 seconds).
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Default request timeout for HTTP requests (30 seconds).
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Truncates an error response body to a reasonable length before it is
/// recorded or logged.
fn sanitize_error_body(body: &str) -> String {
    if body.len() <= MAX_ERROR_BODY_LENGTH {
        return body.to_string();
    }
    // Walk back to a char boundary so a multi-byte character straddling
    // the cutoff cannot panic the slice.
    let mut end = MAX_ERROR_BODY_LENGTH;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}... (truncated)", &body[..end])
}

/// Maps an HTTP status + body into the external-failure taxonomy.
fn classify_status(status: StatusCode, body: &str) -> ExternalServiceError {
    let detail = format!("{}: {}", status, sanitize_error_body(body));
    match status.as_u16() {
        429 => ExternalServiceError::RateLimited(detail),
        402 | 403 => ExternalServiceError::QuotaExceeded(detail),
        500..=599 => ExternalServiceError::Transient(detail),
        _ => ExternalServiceError::Unknown(detail),
    }
}

/// Maps a transport-level reqwest error into the failure taxonomy.
fn classify_request_error(e: reqwest::Error) -> ExternalServiceError {
    if e.is_timeout() {
        ExternalServiceError::Timeout(e.to_string())
    } else if e.is_connect() {
        ExternalServiceError::Transient(e.to_string())
    } else {
        ExternalServiceError::Unknown(e.to_string())
    }
}

/// Creates an HTTP client with appropriate timeouts.
fn create_http_client() -> Result<Client, ExternalServiceError> {
    Client::builder()
        .connect_timeout(DEFAULT_CONNECT_TIMEOUT)
        .timeout(DEFAULT_REQUEST_TIMEOUT)
        .build()
        .map_err(|e| ExternalServiceError::Unknown(format!("Failed to create HTTP client: {}", e)))
}

async fn read_error(response: reqwest::Response) -> ExternalServiceError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    classify_status(status, &body)
}

// ─── OCR ────────────────────────────────────────────────────────────────────

/// OCR service over HTTP: `POST /submit`, `GET /status/{ticket}`,
/// `GET /text/{ticket}`.
pub struct HttpOcrService {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

#[derive(Deserialize)]
struct TicketResponse {
    ticket: String,
}

#[derive(Deserialize)]
struct TicketStatusResponse {
    status: TicketStatus,
}

#[derive(Deserialize)]
struct TextResponse {
    text: String,
}

impl HttpOcrService {
    pub fn new(base_url: &str, api_key: Option<&str>) -> Result<Self, ExternalServiceError> {
        Ok(Self {
            client: create_http_client()?,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.map(|s| s.to_string()),
        })
    }

    fn authorize(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.api_key {
            Some(key) => req.bearer_auth(key),
            None => req,
        }
    }
}

#[async_trait]
impl OcrService for HttpOcrService {
    async fn submit(&self, bytes: &[u8]) -> Result<String, ExternalServiceError> {
        let req = self
            .client
            .post(format!("{}/submit", self.base_url))
            .header("Content-Type", "application/octet-stream")
            .body(bytes.to_vec());
        let response = self
            .authorize(req)
            .send()
            .await
            .map_err(classify_request_error)?;

        if !response.status().is_success() {
            return Err(read_error(response).await);
        }

        let ticket: TicketResponse = response.json().await.map_err(|e| {
            ExternalServiceError::MalformedResponse(format!("OCR submit response: {}", e))
        })?;
        Ok(ticket.ticket)
    }

    async fn poll(&self, ticket: &str) -> Result<TicketStatus, ExternalServiceError> {
        let req = self
            .client
            .get(format!("{}/status/{}", self.base_url, ticket));
        let response = self
            .authorize(req)
            .send()
            .await
            .map_err(classify_request_error)?;

        if !response.status().is_success() {
            return Err(read_error(response).await);
        }

        let status: TicketStatusResponse = response.json().await.map_err(|e| {
            ExternalServiceError::MalformedResponse(format!("OCR status response: {}", e))
        })?;
        Ok(status.status)
    }

    async fn retrieve(&self, ticket: &str) -> Result<String, ExternalServiceError> {
        let req = self.client.get(format!("{}/text/{}", self.base_url, ticket));
        let response = self
            .authorize(req)
            .send()
            .await
            .map_err(classify_request_error)?;

        if !response.status().is_success() {
            return Err(read_error(response).await);
        }

        let text: TextResponse = response.json().await.map_err(|e| {
            ExternalServiceError::MalformedResponse(format!("OCR text response: {}", e))
        })?;
        Ok(text.text)
    }
}

// ─── Extraction ─────────────────────────────────────────────────────────────

/// Structured-extraction service over HTTP: `POST /infer` with the document
/// text, returning a JSON object. The caller validates every field; this
/// impl only guarantees the body is JSON.
pub struct HttpExtractionService {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl HttpExtractionService {
    pub fn new(base_url: &str, api_key: Option<&str>) -> Result<Self, ExternalServiceError> {
        Ok(Self {
            client: create_http_client()?,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.map(|s| s.to_string()),
        })
    }
}

#[async_trait]
impl ExtractionService for HttpExtractionService {
    async fn infer(&self, text: &str) -> Result<Value, ExternalServiceError> {
        let mut req = self
            .client
            .post(format!("{}/infer", self.base_url))
            .json(&serde_json::json!({ "text": text }));
        if let Some(key) = &self.api_key {
            req = req.bearer_auth(key);
        }
        let response = req.send().await.map_err(classify_request_error)?;

        if !response.status().is_success() {
            return Err(read_error(response).await);
        }

        response.json().await.map_err(|e| {
            ExternalServiceError::MalformedResponse(format!("extraction response: {}", e))
        })
    }
}

// ─── Tender source ──────────────────────────────────────────────────────────

/// Tender source over HTTP: `GET /tenders?page=..&pageSize=..`.
/// Accepts either a bare JSON array or `{"records": [...]}`.
pub struct HttpTenderSource {
    client: Client,
    base_url: String,
}

impl HttpTenderSource {
    pub fn new(base_url: &str) -> Result<Self, ExternalServiceError> {
        Ok(Self {
            client: create_http_client()?,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl TenderSource for HttpTenderSource {
    async fn fetch_page(
        &self,
        params: &SourceParams,
    ) -> Result<Vec<Value>, ExternalServiceError> {
        let mut req = self
            .client
            .get(format!("{}/tenders", self.base_url))
            .query(&[("page", params.page), ("pageSize", params.page_size)]);
        if let Some(category) = &params.category {
            req = req.query(&[("category", category)]);
        }
        let response = req.send().await.map_err(classify_request_error)?;

        if !response.status().is_success() {
            return Err(read_error(response).await);
        }

        let body: Value = response.json().await.map_err(|e| {
            ExternalServiceError::MalformedResponse(format!("tender source response: {}", e))
        })?;

        match body {
            Value::Array(records) => Ok(records),
            Value::Object(mut map) => match map.remove("records") {
                Some(Value::Array(records)) => Ok(records),
                _ => Err(ExternalServiceError::MalformedResponse(
                    "tender source response has no records array".to_string(),
                )),
            },
            _ => Err(ExternalServiceError::MalformedResponse(
                "tender source response is not an array or object".to_string(),
            )),
        }
    }
}

// ─── Semantic search ────────────────────────────────────────────────────────

/// Semantic search over HTTP: `POST /search` with the built query.
pub struct HttpSemanticSearch {
    client: Client,
    base_url: String,
}

#[derive(Deserialize)]
struct SearchResponse {
    results: Vec<SearchCandidate>,
}

impl HttpSemanticSearch {
    pub fn new(base_url: &str) -> Result<Self, ExternalServiceError> {
        Ok(Self {
            client: create_http_client()?,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl SemanticSearch for HttpSemanticSearch {
    async fn query(
        &self,
        text: &str,
        limit: u32,
        active_only: bool,
    ) -> Result<Vec<SearchCandidate>, ExternalServiceError> {
        let response = self
            .client
            .post(format!("{}/search", self.base_url))
            .json(&serde_json::json!({
                "query": text,
                "limit": limit,
                "activeOnly": active_only,
            }))
            .send()
            .await
            .map_err(classify_request_error)?;

        if !response.status().is_success() {
            return Err(read_error(response).await);
        }

        let parsed: SearchResponse = response.json().await.map_err(|e| {
            ExternalServiceError::MalformedResponse(format!("search response: {}", e))
        })?;
        Ok(parsed.results)
    }
}
