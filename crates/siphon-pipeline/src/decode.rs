//! Payload format inference and record decoding
//!
//! A raw file body is decoded into an ordered sequence of [`Record`]s based
//! on the format declared by its key suffix. Records are schema-less: any
//! subset of fields may be present or absent across records in the same
//! file, so they are represented as ordered JSON maps rather than a fixed
//! struct.

use serde_json::Value;
use siphon_common::{PipelineError, Result};

/// One raw record: an ordered mapping from field name to scalar value.
///
/// `serde_json` is built with `preserve_order`, so iteration follows
/// insertion order and the output payload keeps the input field order.
pub type Record = serde_json::Map<String, Value>;

/// Supported input file formats, inferred from the key suffix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    Json,
    Csv,
}

impl FileFormat {
    /// Infer the format from a key's extension (case-insensitive).
    /// Returns `None` for unrecognized or missing extensions.
    pub fn from_key(key: &str) -> Option<FileFormat> {
        let (_, ext) = key.rsplit_once('.')?;
        match ext.to_ascii_lowercase().as_str() {
            "json" => Some(FileFormat::Json),
            "csv" => Some(FileFormat::Csv),
            _ => None,
        }
    }
}

/// Decode a raw payload into an ordered sequence of records.
pub fn decode(format: FileFormat, payload: &[u8]) -> Result<Vec<Record>> {
    match format {
        FileFormat::Json => decode_json(payload),
        FileFormat::Csv => decode_csv(payload),
    }
}

/// JSON payloads decode to either a single object (treated as a one-element
/// sequence) or an array of objects.
fn decode_json(payload: &[u8]) -> Result<Vec<Record>> {
    let value: Value = serde_json::from_slice(payload)
        .map_err(|e| PipelineError::Decode(format!("malformed JSON payload: {e}")))?;

    match value {
        Value::Object(record) => Ok(vec![record]),
        Value::Array(items) => items
            .into_iter()
            .enumerate()
            .map(|(index, item)| match item {
                Value::Object(record) => Ok(record),
                other => Err(PipelineError::Decode(format!(
                    "element {index} is not an object (got {})",
                    json_type_name(&other)
                ))),
            })
            .collect(),
        other => Err(PipelineError::Decode(format!(
            "expected an object or array of objects, got {}",
            json_type_name(&other)
        ))),
    }
}

/// CSV payloads use the first line as a header row defining field names;
/// each subsequent row becomes one record keyed by header position.
///
/// Rows whose column count differs from the header are rejected: the whole
/// decode fails rather than padding with empty values.
fn decode_csv(payload: &[u8]) -> Result<Vec<Record>> {
    let mut reader = csv::Reader::from_reader(payload);

    let headers = reader
        .headers()
        .map_err(|e| PipelineError::Decode(format!("malformed CSV header: {e}")))?
        .clone();

    let mut records = Vec::new();
    for row in reader.records() {
        // strict mode: a row with an unequal column count errors out here
        let row = row.map_err(|e| PipelineError::Decode(format!("malformed CSV row: {e}")))?;

        let mut record = Record::new();
        for (name, value) in headers.iter().zip(row.iter()) {
            record.insert(name.to_string(), Value::String(value.to_string()));
        }
        records.push(record);
    }

    Ok(records)
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_from_key() {
        assert_eq!(
            FileFormat::from_key("incoming/orders.json"),
            Some(FileFormat::Json)
        );
        assert_eq!(
            FileFormat::from_key("incoming/orders.CSV"),
            Some(FileFormat::Csv)
        );
        assert_eq!(FileFormat::from_key("incoming/orders.xml"), None);
        assert_eq!(FileFormat::from_key("incoming/orders"), None);
    }

    #[test]
    fn test_decode_json_single_object() {
        let records = decode(FileFormat::Json, br#"{"name": "Alice", "age": 30}"#).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0]["name"], "Alice");
    }

    #[test]
    fn test_decode_json_array_preserves_order() {
        let records = decode(
            FileFormat::Json,
            br#"[{"id": 1}, {"id": 2}, {"id": 3}]"#,
        )
        .unwrap();
        assert_eq!(records.len(), 3);
        let ids: Vec<i64> = records
            .iter()
            .map(|r| r["id"].as_i64().unwrap())
            .collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn test_decode_json_field_order_preserved() {
        let records = decode(FileFormat::Json, br#"{"zeta": 1, "alpha": 2}"#).unwrap();
        let keys: Vec<&String> = records[0].keys().collect();
        assert_eq!(keys, vec!["zeta", "alpha"]);
    }

    #[test]
    fn test_decode_json_rejects_malformed() {
        let err = decode(FileFormat::Json, b"{not json").unwrap_err();
        assert!(err.to_string().starts_with("Decode error"));
    }

    #[test]
    fn test_decode_json_rejects_scalar() {
        assert!(decode(FileFormat::Json, b"42").is_err());
    }

    #[test]
    fn test_decode_json_rejects_non_object_element() {
        let err = decode(FileFormat::Json, br#"[{"id": 1}, "stray"]"#).unwrap_err();
        assert!(err.to_string().contains("element 1"));
    }

    #[test]
    fn test_decode_csv_keys_rows_by_header() {
        let records = decode(FileFormat::Csv, b"Name,Score\nBob,10\nCarol,7\n").unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0]["Name"], "Bob");
        assert_eq!(records[0]["Score"], "10");
        assert_eq!(records[1]["Name"], "Carol");
    }

    #[test]
    fn test_decode_csv_header_only_yields_no_records() {
        let records = decode(FileFormat::Csv, b"Name,Score\n").unwrap();
        assert!(records.is_empty());
    }

    #[test]
    fn test_decode_csv_rejects_unequal_column_counts() {
        let err = decode(FileFormat::Csv, b"Name,Score\nBob,10,extra\n").unwrap_err();
        assert!(err.to_string().contains("CSV"));
    }

    #[test]
    fn test_decode_csv_keeps_empty_values() {
        // empty fields survive decoding; the normalizer drops them later
        let records = decode(FileFormat::Csv, b"Name,Score\nCarol,\n").unwrap();
        assert_eq!(records[0]["Score"], "");
    }
}
