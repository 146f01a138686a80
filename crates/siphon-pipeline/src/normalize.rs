//! Record normalization
//!
//! Pure, total mapping from a raw [`Record`] to its normalized form. Never
//! fails: malformed input was already rejected at decode time.

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::json;

use crate::decode::Record;

/// Fixed version string stamped into every record's metadata.
pub const PROCESSOR_VERSION: &str = "1.0.0";

/// Reserved metadata key injected into every normalized record.
pub const METADATA_KEY: &str = "_metadata";

/// Per-invocation context stamped into each record's `_metadata`.
#[derive(Debug, Clone)]
pub struct RecordContext {
    pub processed_at: DateTime<Utc>,
    pub environment: String,
}

impl RecordContext {
    pub fn new(processed_at: DateTime<Utc>, environment: impl Into<String>) -> Self {
        Self {
            processed_at,
            environment: environment.into(),
        }
    }
}

/// Normalize one record:
///
/// 1. drop every field whose value is null or the empty string;
/// 2. rewrite remaining keys to lowercase with spaces replaced by
///    underscores — if two keys collide after rewriting, the later key in
///    iteration order wins;
/// 3. inject `_metadata` last, so source data can never overwrite it.
pub fn normalize(record: Record, ctx: &RecordContext) -> Record {
    let mut normalized = Record::new();

    for (key, value) in record {
        if value.is_null() || value.as_str() == Some("") {
            continue;
        }

        let key = key.to_lowercase().replace(' ', "_");
        normalized.insert(key, value);
    }

    normalized.insert(
        METADATA_KEY.to_string(),
        json!({
            "processed_at": ctx.processed_at.to_rfc3339_opts(SecondsFormat::Micros, true),
            "environment": ctx.environment,
            "processor_version": PROCESSOR_VERSION,
        }),
    );

    normalized
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::Value;

    fn ctx() -> RecordContext {
        RecordContext::new(
            Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap(),
            "test",
        )
    }

    fn record_from(raw: &str) -> Record {
        match serde_json::from_str::<Value>(raw).unwrap() {
            Value::Object(map) => map,
            _ => panic!("fixture must be a JSON object"),
        }
    }

    #[test]
    fn test_drops_empty_and_null_lowercases_keys() {
        let record = record_from(r#"{"name": "Alice Smith", "Age": "30", "Note": ""}"#);
        let normalized = normalize(record, &ctx());

        let keys: Vec<&String> = normalized.keys().collect();
        assert_eq!(keys, vec!["name", "age", METADATA_KEY]);
        assert_eq!(normalized["age"], "30");
    }

    #[test]
    fn test_drops_null_fields() {
        let record = record_from(r#"{"keep": 1, "gone": null}"#);
        let normalized = normalize(record, &ctx());
        assert!(!normalized.contains_key("gone"));
        assert!(normalized.contains_key("keep"));
    }

    #[test]
    fn test_spaces_become_underscores() {
        let record = record_from(r#"{"First Name": "Ada", "Last  Name": "L"}"#);
        let normalized = normalize(record, &ctx());
        assert!(normalized.contains_key("first_name"));
        assert!(normalized.contains_key("last__name"));
    }

    #[test]
    fn test_colliding_keys_later_wins() {
        let record = record_from(r#"{"Name": "first", "name": "second"}"#);
        let normalized = normalize(record, &ctx());
        assert_eq!(normalized["name"], "second");
    }

    #[test]
    fn test_metadata_present_exactly_once() {
        let record = record_from(r#"{"a": 1}"#);
        let normalized = normalize(record, &ctx());

        let metadata_keys = normalized
            .keys()
            .filter(|k| k.as_str() == METADATA_KEY)
            .count();
        assert_eq!(metadata_keys, 1);

        let metadata = normalized[METADATA_KEY].as_object().unwrap();
        assert_eq!(metadata["environment"], "test");
        assert_eq!(metadata["processor_version"], PROCESSOR_VERSION);
        assert_eq!(metadata["processed_at"], "2024-03-01T12:00:00.000000Z");
    }

    #[test]
    fn test_source_metadata_field_cannot_shadow_injected() {
        let record = record_from(r#"{"_metadata": "spoofed"}"#);
        let normalized = normalize(record, &ctx());
        assert!(normalized[METADATA_KEY].is_object());
    }

    #[test]
    fn test_idempotent_on_already_normalized_fields() {
        let record = record_from(r#"{"name": "bob", "score_total": 10}"#);
        let once = normalize(record, &ctx());

        let mut fields_only = once.clone();
        fields_only.remove(METADATA_KEY);
        let twice = normalize(fields_only.clone(), &ctx());

        let mut twice_fields = twice;
        twice_fields.remove(METADATA_KEY);
        assert_eq!(fields_only, twice_fields);
    }
}
