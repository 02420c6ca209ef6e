use std::path::Path;

use crate::config::schema::{Config, SourceMode};
use crate::error::ConfigError;

pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
        path: path.to_path_buf(),
        source: e,
    })?;

    load_config_from_str(&content)
}

pub fn load_config_from_str(content: &str) -> Result<Config, ConfigError> {
    let config: Config = serde_json::from_str(content)?;

    validate_config(&config)?;

    Ok(config)
}

fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.intake.max_file_size == 0 {
        return Err(ConfigError::Validation {
            message: "intake.maxFileSize must be greater than zero".to_string(),
        });
    }
    if config.intake.allowed_types.is_empty() {
        return Err(ConfigError::Validation {
            message: "intake.allowedTypes must not be empty".to_string(),
        });
    }
    if config.ocr.max_poll_attempts == 0 {
        return Err(ConfigError::Validation {
            message: "ocr.maxPollAttempts must be greater than zero".to_string(),
        });
    }
    if config.ocr.poll_interval_secs == 0 {
        return Err(ConfigError::Validation {
            message: "ocr.pollIntervalSecs must be greater than zero".to_string(),
        });
    }
    if config.extraction.max_input_chars == 0 {
        return Err(ConfigError::Validation {
            message: "extraction.maxInputChars must be greater than zero".to_string(),
        });
    }

    match config.tender_source.mode {
        SourceMode::Live if config.tender_source.endpoint.is_none() => {
            Err(ConfigError::Validation {
                message: "tenderSource.endpoint is required in live mode".to_string(),
            })
        }
        SourceMode::Recorded if config.tender_source.fixture_path.is_none() => {
            Err(ConfigError::Validation {
                message: "tenderSource.fixturePath is required in recorded mode".to_string(),
            })
        }
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_object_yields_defaults() {
        let config = load_config_from_str("{}").unwrap();
        assert_eq!(config.intake.max_file_size, 10 * 1024 * 1024);
        assert_eq!(config.intake.allowed_types, vec!["application/pdf"]);
        assert_eq!(config.ocr.max_poll_attempts, 20);
        assert_eq!(config.ocr.poll_interval_secs, 10);
        assert_eq!(config.tender_source.mode, SourceMode::Synthetic);
    }

    #[test]
    fn test_partial_override() {
        let config = load_config_from_str(
            r#"{
                "ocr": { "pollIntervalSecs": 5, "maxPollAttempts": 40 },
                "tenderSource": { "mode": "recorded", "fixturePath": "/tmp/tenders.json" }
            }"#,
        )
        .unwrap();
        assert_eq!(config.ocr.poll_interval_secs, 5);
        assert_eq!(config.ocr.max_poll_attempts, 40);
        assert_eq!(config.tender_source.mode, SourceMode::Recorded);
        // Untouched sections keep their defaults.
        assert_eq!(config.intake.max_file_size, 10 * 1024 * 1024);
    }

    #[test]
    fn test_live_mode_requires_endpoint() {
        let err = load_config_from_str(r#"{"tenderSource": {"mode": "live"}}"#).unwrap_err();
        assert!(err.to_string().contains("endpoint"));
    }

    #[test]
    fn test_recorded_mode_requires_fixture() {
        let err = load_config_from_str(r#"{"tenderSource": {"mode": "recorded"}}"#).unwrap_err();
        assert!(err.to_string().contains("fixturePath"));
    }

    #[test]
    fn test_zero_poll_attempts_rejected() {
        let err = load_config_from_str(r#"{"ocr": {"maxPollAttempts": 0}}"#).unwrap_err();
        assert!(err.to_string().contains("maxPollAttempts"));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"dataDir": "/var/lib/tendermatch"}"#).unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.data_dir, "/var/lib/tendermatch");
    }

    #[test]
    fn test_missing_file_error() {
        let err = load_config("/nonexistent/config.json").unwrap_err();
        assert!(matches!(err, ConfigError::ReadFile { .. }));
    }
}
