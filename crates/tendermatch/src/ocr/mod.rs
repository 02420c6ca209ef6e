pub mod orchestrator;

pub use orchestrator::{DocumentProcessor, ProcessingPolicy, StatusResponse};
