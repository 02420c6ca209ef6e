//! Service configuration schema.
//!
//! Every knob carries a serde default so a minimal config file (or `{}`)
//! yields a working test/demo setup.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Config {
    /// Root directory for stored documents and the SQLite database.
    pub data_dir: String,
    pub intake: IntakeConfig,
    pub ocr: OcrConfig,
    pub extraction: ExtractionConfig,
    pub tender_source: TenderSourceConfig,
    pub search: SearchConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct IntakeConfig {
    /// Maximum accepted upload size in bytes.
    pub max_file_size: u64,
    /// MIME types accepted at upload.
    pub allowed_types: Vec<String>,
}

impl Default for IntakeConfig {
    fn default() -> Self {
        Self {
            max_file_size: 10 * 1024 * 1024,
            allowed_types: vec!["application/pdf".to_string()],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OcrConfig {
    pub endpoint: String,
    pub api_key: Option<String>,
    /// Wall-clock ceiling for the submission call, in seconds.
    pub submit_timeout_secs: u64,
    /// Fixed interval between ticket polls, in seconds.
    pub poll_interval_secs: u64,
    /// Hard ceiling on poll attempts. Exceeding it is a terminal timeout.
    pub max_poll_attempts: u32,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            api_key: None,
            submit_timeout_secs: 180,
            poll_interval_secs: 10,
            max_poll_attempts: 20,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExtractionConfig {
    pub endpoint: String,
    pub api_key: Option<String>,
    /// Input text is truncated to this many characters before extraction.
    pub max_input_chars: usize,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            api_key: None,
            max_input_chars: 6000,
        }
    }
}

/// Which concrete tender source to construct at startup.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceMode {
    /// Live HTTP source at `endpoint`.
    Live,
    /// Replays raw records from a JSON fixture file at `fixture_path`.
    Recorded,
    /// Deterministic generated records, for demos and tests.
    #[default]
    Synthetic,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TenderSourceConfig {
    pub mode: SourceMode,
    pub endpoint: Option<String>,
    pub fixture_path: Option<String>,
    /// Source label written onto synchronized tenders.
    pub source_name: String,
}

impl Default for TenderSourceConfig {
    fn default() -> Self {
        Self {
            mode: SourceMode::Synthetic,
            endpoint: None,
            fixture_path: None,
            source_name: "external".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SearchConfig {
    pub endpoint: String,
    /// Default recommendation list size.
    pub default_limit: u32,
    /// Restrict search to tenders whose deadline has not passed.
    pub active_only: bool,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            default_limit: 20,
            active_only: true,
        }
    }
}
