//! Company profile domain type and its derived fields.

pub mod extractor;
pub mod merger;

pub use extractor::{ExtractedProfile, ProfileExtractor};
pub use merger::ProfileMerger;

use serde::{Deserialize, Serialize};

use crate::db::profile_repo::ProfileRow;

/// Company profile accumulated from document extractions.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanyProfile {
    pub owner_id: String,
    pub company_description: Option<String>,
    pub business_type: Option<String>,
    pub company_activities: Vec<String>,
    pub main_industries: Vec<String>,
    pub specializations: Vec<String>,
    pub keywords: Vec<String>,
    /// Derived search string — always a deterministic function of the
    /// fields above (see `build_query_data`).
    pub query_data: String,
    /// Profile completeness, 0–100.
    pub completeness: u8,
}

fn parse_string_list(json: &str, owner_id: &str, field: &str) -> Vec<String> {
    serde_json::from_str(json).unwrap_or_else(|e| {
        log::warn!(
            "Profile {} has malformed {} column: {} — treating as empty",
            owner_id,
            field,
            e
        );
        Vec::new()
    })
}

impl CompanyProfile {
    pub fn empty(owner_id: &str) -> Self {
        Self {
            owner_id: owner_id.to_string(),
            ..Default::default()
        }
    }

    /// Converts a database row, tolerating malformed JSON columns.
    pub fn from_row(row: &ProfileRow) -> Self {
        Self {
            owner_id: row.owner_id.clone(),
            company_description: row.company_description.clone(),
            business_type: row.business_type.clone(),
            company_activities: parse_string_list(
                &row.company_activities,
                &row.owner_id,
                "company_activities",
            ),
            main_industries: parse_string_list(
                &row.main_industries,
                &row.owner_id,
                "main_industries",
            ),
            specializations: parse_string_list(
                &row.specializations,
                &row.owner_id,
                "specializations",
            ),
            keywords: parse_string_list(&row.keywords, &row.owner_id, "keywords"),
            query_data: row.query_data.clone(),
            completeness: row.completeness.clamp(0, 100) as u8,
        }
    }

    pub fn to_row(&self) -> ProfileRow {
        ProfileRow {
            owner_id: self.owner_id.clone(),
            company_description: self.company_description.clone(),
            business_type: self.business_type.clone(),
            company_activities: serde_json::to_string(&self.company_activities)
                .unwrap_or_else(|_| "[]".to_string()),
            main_industries: serde_json::to_string(&self.main_industries)
                .unwrap_or_else(|_| "[]".to_string()),
            specializations: serde_json::to_string(&self.specializations)
                .unwrap_or_else(|_| "[]".to_string()),
            keywords: serde_json::to_string(&self.keywords).unwrap_or_else(|_| "[]".to_string()),
            query_data: self.query_data.clone(),
            completeness: self.completeness as i64,
            updated_at: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Recomputes the derived query string: description + activities +
/// industries + specializations, space-joined and trimmed, in that order.
pub fn build_query_data(profile: &CompanyProfile) -> String {
    let mut parts: Vec<&str> = Vec::new();
    if let Some(description) = &profile.company_description {
        parts.push(description);
    }
    parts.extend(profile.company_activities.iter().map(String::as_str));
    parts.extend(profile.main_industries.iter().map(String::as_str));
    parts.extend(profile.specializations.iter().map(String::as_str));
    parts.join(" ").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_data_fixed_order() {
        let profile = CompanyProfile {
            owner_id: "o1".to_string(),
            company_description: Some("ACME Corp".to_string()),
            company_activities: vec!["IT consulting".to_string()],
            main_industries: vec!["Technology".to_string()],
            specializations: vec!["Cloud".to_string()],
            ..Default::default()
        };
        assert_eq!(
            build_query_data(&profile),
            "ACME Corp IT consulting Technology Cloud"
        );
    }

    #[test]
    fn test_query_data_empty_profile() {
        assert_eq!(build_query_data(&CompanyProfile::empty("o1")), "");
    }

    #[test]
    fn test_row_round_trip() {
        let profile = CompanyProfile {
            owner_id: "o1".to_string(),
            company_description: Some("desc".to_string()),
            business_type: Some("LLC".to_string()),
            company_activities: vec!["a".to_string(), "b".to_string()],
            completeness: 75,
            ..Default::default()
        };
        let round_tripped = CompanyProfile::from_row(&profile.to_row());
        assert_eq!(round_tripped.company_activities, vec!["a", "b"]);
        assert_eq!(round_tripped.business_type.as_deref(), Some("LLC"));
        assert_eq!(round_tripped.completeness, 75);
    }

    #[test]
    fn test_from_row_tolerates_malformed_json() {
        let mut row = CompanyProfile::empty("o1").to_row();
        row.company_activities = "not json".to_string();
        let profile = CompanyProfile::from_row(&row);
        assert!(profile.company_activities.is_empty());
    }
}
