pub mod config;
pub mod db;
pub mod error;
pub mod hooks;
pub mod intake;
pub mod jobs;
pub mod logging;
pub mod ocr;
pub mod profile;
pub mod services;
pub mod tenders;

pub use config::{load_config, Config, SourceMode};
pub use db::Database;
pub use error::{
    ExternalServiceError, Result, TenderMatchError, ValidationError,
};
pub use hooks::PostCommitHooks;
pub use intake::{DocumentIntake, DocumentStore};
pub use jobs::{DocumentStatus, JobRegistry, ProgressBroadcaster};
pub use ocr::{DocumentProcessor, ProcessingPolicy, StatusResponse};
pub use profile::{CompanyProfile, ProfileExtractor, ProfileMerger};
pub use tenders::{RecommendationEngine, TenderSynchronizer};
