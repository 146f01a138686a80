//! Notification and report envelope types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use siphon_common::{PipelineError, Result};

/// One file-arrival notification: the bucket and key of a newly-uploaded
/// raw file. Owned transiently for the duration of one processing call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub bucket: String,
    pub key: String,
}

impl Notification {
    /// Parse a batch of notifications from raw JSON.
    ///
    /// Accepts either a bare list of `{bucket, key}` objects or the
    /// S3-style event envelope
    /// `{"Records": [{"s3": {"bucket": {"name": ...}, "object": {"key": ...}}}]}`.
    pub fn parse_batch(raw: &str) -> Result<Vec<Notification>> {
        if let Ok(batch) = serde_json::from_str::<Vec<Notification>>(raw) {
            return Ok(batch);
        }

        let event: StorageEvent = serde_json::from_str(raw).map_err(|e| {
            PipelineError::Decode(format!("notification batch is not valid JSON: {e}"))
        })?;

        Ok(event
            .records
            .into_iter()
            .map(|r| Notification {
                bucket: r.s3.bucket.name,
                key: r.s3.object.key,
            })
            .collect())
    }
}

#[derive(Debug, Deserialize)]
struct StorageEvent {
    #[serde(rename = "Records", default)]
    records: Vec<StorageEventRecord>,
}

#[derive(Debug, Deserialize)]
struct StorageEventRecord {
    s3: StorageEntity,
}

#[derive(Debug, Deserialize)]
struct StorageEntity {
    bucket: StorageEventBucket,
    object: StorageEventObject,
}

#[derive(Debug, Deserialize)]
struct StorageEventBucket {
    name: String,
}

#[derive(Debug, Deserialize)]
struct StorageEventObject {
    key: String,
}

/// Successful outcome for one input file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessedFile {
    pub source_key: String,
    pub destination_key: String,
    pub record_count: usize,
}

/// Failed outcome for one input file, with a stable human-readable error
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailedFile {
    pub source_key: String,
    pub error: String,
}

/// Aggregate result of one ingestion batch. Partition order within each
/// list follows input order; `processed.len() + failed.len()` always equals
/// the notification count.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchReport {
    pub processed: Vec<ProcessedFile>,
    pub failed: Vec<FailedFile>,
    pub timestamp: DateTime<Utc>,
}

/// Aggregate result of one retention sweep. Recomputed each run, never
/// persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SweepReport {
    pub archived_count: u64,
    pub failed_count: u64,
    pub total_size_bytes: i64,
    pub total_size_mb: f64,
    pub cutoff_date: DateTime<Utc>,
    pub timestamp: DateTime<Utc>,
}

/// Bytes to megabytes, rounded to two decimals for the report envelope.
pub(crate) fn bytes_to_mb(bytes: i64) -> f64 {
    (bytes as f64 / (1024.0 * 1024.0) * 100.0).round() / 100.0
}
