use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TenderMatchError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("External service error: {0}")]
    External(#[from] ExternalServiceError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Database error: {0}")]
    Database(#[from] crate::db::DatabaseError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Bad input, user-correctable. Surfaced immediately at the boundary.
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("Unsupported document type: {0}")]
    UnsupportedType(String),

    #[error("File too large: {size} bytes (maximum {max})")]
    TooLarge { size: u64, max: u64 },

    #[error("Empty file: {0}")]
    EmptyFile(String),
}

/// Failure talking to an external collaborator (OCR, extraction, tender
/// source, semantic search). Background work records these into the owning
/// document instead of propagating past the job boundary.
#[derive(Error, Debug)]
pub enum ExternalServiceError {
    #[error("Transient service failure: {0}")]
    Transient(String),

    #[error("Rate limited: {0}")]
    RateLimited(String),

    #[error("Quota exceeded: {0}")]
    QuotaExceeded(String),

    #[error("Timed out: {0}")]
    Timeout(String),

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("External processing failed: {0}")]
    Processing(String),

    #[error("Unknown service failure: {0}")]
    Unknown(String),
}

impl ExternalServiceError {
    /// Short human-readable guidance shown through the status interface.
    pub fn user_message(&self) -> &'static str {
        match self {
            ExternalServiceError::RateLimited(_) => "rate limited — retry later",
            ExternalServiceError::QuotaExceeded(_) => "quota exceeded — retry later",
            ExternalServiceError::Transient(_)
            | ExternalServiceError::Timeout(_)
            | ExternalServiceError::MalformedResponse(_)
            | ExternalServiceError::Processing(_)
            | ExternalServiceError::Unknown(_) => "failed — retry now",
        }
    }
}

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Failed to create directory '{path}': {source}")]
    CreateDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write file '{path}': {source}")]
    WriteFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read file '{path}': {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to remove file '{path}': {source}")]
    RemoveFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("File already exists: {0}")]
    FileExists(PathBuf),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config JSON: {0}")]
    ParseJson(#[from] serde_json::Error),

    #[error("Config validation failed: {message}")]
    Validation { message: String },
}

pub type Result<T> = std::result::Result<T, TenderMatchError>;
