//! Shape adapters for third-party tender payloads.
//!
//! External registries disagree on field names, and some wrap the whole
//! record in a JSON string. Each known shape is a named adapter returning
//! a normalized record or "no match"; normalization tries the adapters in
//! order and the first success wins.

use serde_json::Value;

/// A tender normalized out of a raw listing, before it gets an id and
/// timestamps.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewTender {
    pub external_id: Option<String>,
    pub bid_number: Option<String>,
    pub title: String,
    pub agency: Option<String>,
    pub category: Option<String>,
    pub value_min: Option<f64>,
    pub value_max: Option<f64>,
    pub deadline: Option<String>,
}

pub trait ShapeAdapter: Send + Sync {
    fn name(&self) -> &'static str;
    /// Returns the normalized record, or `None` when the payload does not
    /// match this adapter's shape.
    fn adapt(&self, raw: &Value) -> Option<NewTender>;
}

/// Ordered adapter chain: primary field names, alternate field names, then
/// the raw-string fallback.
pub fn default_adapters() -> Vec<Box<dyn ShapeAdapter>> {
    vec![
        Box::new(PrimaryFields),
        Box::new(AlternateFields),
        Box::new(RawStringFallback),
    ]
}

/// Runs the chain; first adapter that matches wins.
pub fn normalize(raw: &Value, adapters: &[Box<dyn ShapeAdapter>]) -> Option<NewTender> {
    for adapter in adapters {
        if let Some(tender) = adapter.adapt(raw) {
            log::trace!("Tender payload matched adapter {}", adapter.name());
            return Some(tender);
        }
    }
    None
}

/// Ids occasionally arrive as numbers.
fn field_string(object: &Value, key: &str) -> Option<String> {
    match object.get(key)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn field_number(object: &Value, key: &str) -> Option<f64> {
    match object.get(key)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Canonical camelCase shape.
pub struct PrimaryFields;

impl ShapeAdapter for PrimaryFields {
    fn name(&self) -> &'static str {
        "primary"
    }

    fn adapt(&self, raw: &Value) -> Option<NewTender> {
        if !raw.is_object() {
            return None;
        }
        let title = field_string(raw, "title")?;
        Some(NewTender {
            external_id: field_string(raw, "externalId"),
            bid_number: field_string(raw, "bidNumber"),
            title,
            agency: field_string(raw, "agency"),
            category: field_string(raw, "category"),
            value_min: field_number(raw, "valueMin"),
            value_max: field_number(raw, "valueMax"),
            deadline: field_string(raw, "deadline"),
        })
    }
}

/// Snake-case shape used by the older registry export.
pub struct AlternateFields;

impl ShapeAdapter for AlternateFields {
    fn name(&self) -> &'static str {
        "alternate"
    }

    fn adapt(&self, raw: &Value) -> Option<NewTender> {
        if !raw.is_object() {
            return None;
        }
        let title = field_string(raw, "name")?;
        Some(NewTender {
            external_id: field_string(raw, "tender_id"),
            bid_number: field_string(raw, "bid_no"),
            title,
            agency: field_string(raw, "organization"),
            category: field_string(raw, "category"),
            value_min: field_number(raw, "min_value"),
            value_max: field_number(raw, "max_value"),
            deadline: field_string(raw, "closing_date"),
        })
    }
}

/// Last resort: the record is a JSON string holding one of the known
/// object shapes.
pub struct RawStringFallback;

impl ShapeAdapter for RawStringFallback {
    fn name(&self) -> &'static str {
        "raw-string"
    }

    fn adapt(&self, raw: &Value) -> Option<NewTender> {
        let text = raw.as_str()?;
        let parsed: Value = serde_json::from_str(text).ok()?;
        PrimaryFields
            .adapt(&parsed)
            .or_else(|| AlternateFields.adapt(&parsed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_primary_shape() {
        let tender = normalize(
            &json!({
                "externalId": "E-1",
                "bidNumber": "T-100",
                "title": "Road maintenance",
                "agency": "Ministry of Works",
                "valueMin": 10000,
                "valueMax": "50000",
                "deadline": "2026-09-15T00:00:00Z"
            }),
            &default_adapters(),
        )
        .unwrap();
        assert_eq!(tender.bid_number.as_deref(), Some("T-100"));
        assert_eq!(tender.title, "Road maintenance");
        assert_eq!(tender.value_min, Some(10_000.0));
        assert_eq!(tender.value_max, Some(50_000.0));
    }

    #[test]
    fn test_alternate_shape() {
        let tender = normalize(
            &json!({
                "tender_id": 4711,
                "bid_no": "T-200",
                "name": "Data center cabling",
                "organization": "City of Bern",
                "closing_date": "2026-10-01"
            }),
            &default_adapters(),
        )
        .unwrap();
        assert_eq!(tender.external_id.as_deref(), Some("4711"));
        assert_eq!(tender.title, "Data center cabling");
        assert_eq!(tender.agency.as_deref(), Some("City of Bern"));
    }

    #[test]
    fn test_raw_string_fallback() {
        let tender = normalize(
            &json!("{\"bid_no\": \"T-300\", \"name\": \"Fiber rollout\"}"),
            &default_adapters(),
        )
        .unwrap();
        assert_eq!(tender.bid_number.as_deref(), Some("T-300"));
        assert_eq!(tender.title, "Fiber rollout");
    }

    #[test]
    fn test_first_success_wins() {
        // Both shapes present; the primary adapter runs first.
        let tender = normalize(
            &json!({"title": "Primary title", "name": "Alternate title"}),
            &default_adapters(),
        )
        .unwrap();
        assert_eq!(tender.title, "Primary title");
    }

    #[test]
    fn test_no_match() {
        let adapters = default_adapters();
        assert!(normalize(&json!({"unrelated": true}), &adapters).is_none());
        assert!(normalize(&json!("not json at all"), &adapters).is_none());
        assert!(normalize(&json!(42), &adapters).is_none());
    }

    #[test]
    fn test_blank_strings_are_absent() {
        let tender = normalize(
            &json!({"title": "T", "agency": "  ", "bidNumber": ""}),
            &default_adapters(),
        )
        .unwrap();
        assert!(tender.agency.is_none());
        assert!(tender.bid_number.is_none());
    }
}
