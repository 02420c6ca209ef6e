//! Structured profile extraction from OCR text.
//!
//! The external model's response is never trusted as-is: each field is
//! validated independently, and any shape mismatch degrades to a default
//! instead of an error. Background processing must survive a malformed
//! third-party payload.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::services::ExtractionService;

/// Normalized extraction result. All fields default to empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedProfile {
    pub company_description: Option<String>,
    pub business_type: Option<String>,
    pub company_activities: Vec<String>,
    pub main_industries: Vec<String>,
    pub specializations: Vec<String>,
}

/// Orchestrates the extraction call and normalizes its result.
pub struct ProfileExtractor {
    service: Arc<dyn ExtractionService>,
    max_input_chars: usize,
}

impl ProfileExtractor {
    pub fn new(service: Arc<dyn ExtractionService>, max_input_chars: usize) -> Self {
        Self {
            service,
            max_input_chars,
        }
    }

    /// Extracts structured profile fields from recovered text. Never fails:
    /// service errors and malformed payloads both degrade to the all-default
    /// object.
    pub async fn extract(&self, text: &str) -> ExtractedProfile {
        let truncated: String = text.chars().take(self.max_input_chars).collect();

        let response = match self.service.infer(&truncated).await {
            Ok(value) => value,
            Err(e) => {
                log::warn!("Extraction service failed, using empty profile: {}", e);
                return ExtractedProfile::default();
            }
        };

        normalize(&response)
    }
}

/// Validates the raw model response field by field. Strings default to
/// None and arrays to empty on any mismatch; a non-object response yields
/// the all-default profile.
pub fn normalize(response: &Value) -> ExtractedProfile {
    // Models sometimes wrap the JSON in prose; a string response gets one
    // chance to reveal an embedded object.
    let parsed;
    let object = match response {
        Value::Object(_) => response,
        Value::String(s) => {
            parsed = serde_json::from_str::<Value>(&extract_json(s)).unwrap_or(Value::Null);
            match parsed {
                Value::Object(_) => &parsed,
                _ => {
                    log::warn!("Extraction response string held no JSON object");
                    return ExtractedProfile::default();
                }
            }
        }
        _ => {
            log::warn!("Extraction response is not a JSON object");
            return ExtractedProfile::default();
        }
    };

    ExtractedProfile {
        company_description: norm_string(object.get("companyDescription")),
        business_type: norm_string(object.get("businessType")),
        company_activities: norm_string_array(object.get("companyActivities")),
        main_industries: norm_string_array(object.get("mainIndustries")),
        specializations: norm_string_array(object.get("specializations")),
    }
}

fn norm_string(value: Option<&Value>) -> Option<String> {
    match value {
        Some(Value::String(s)) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_string())
            }
        }
        _ => None,
    }
}

fn norm_string_array(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|item| match item {
                Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    }
}

/// Extracts the first balanced JSON object from text, handling string
/// literals and escape sequences. Returns the input unchanged when no
/// object is found.
pub fn extract_json(response: &str) -> String {
    let start = match response.find('{') {
        Some(idx) => idx,
        None => return response.to_string(),
    };

    let mut depth = 0;
    let mut in_string = false;
    let mut escape_next = false;
    let mut end = response.len();

    for (i, c) in response[start..].char_indices() {
        if escape_next {
            escape_next = false;
            continue;
        }

        match c {
            '\\' if in_string => {
                escape_next = true;
            }
            '"' => {
                in_string = !in_string;
            }
            '{' if !in_string => {
                depth += 1;
            }
            '}' if !in_string => {
                depth -= 1;
                if depth == 0 {
                    end = start + i + 1;
                    break;
                }
            }
            _ => {}
        }
    }

    response[start..end].to_string()
}
