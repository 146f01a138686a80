//! Per-file transform pipeline and batch orchestration
//!
//! [`Processor::process_file`] runs the full transform for one raw file:
//! fetch, decode, normalize, write the transformed payload, then relocate
//! the original out of `incoming/`. [`Processor::handle_batch`] drives it
//! across a batch of notifications with per-file failure isolation: one
//! file's error becomes a failure-list entry and never aborts the rest of
//! the batch.

use chrono::{DateTime, SecondsFormat, Utc};
use siphon_common::{PipelineError, Result};
use tracing::{error, info, warn};

use crate::config::{PipelineConfig, PROCESSED_PREFIX};
use crate::decode::{self, FileFormat, Record};
use crate::models::{BatchReport, FailedFile, Notification, ProcessedFile};
use crate::normalize::{normalize, RecordContext};
use crate::storage::{ObjectMetadata, ObjectStore, StorageTier};

/// Sub-area of the raw bucket where new files arrive.
pub const INCOMING_PREFIX: &str = "incoming/";

/// Sub-area of the raw bucket where originals land after processing.
pub const COMPLETED_PREFIX: &str = "completed/";

/// Drives the transform pipeline against the storage capability.
pub struct Processor<S> {
    store: S,
    config: PipelineConfig,
}

impl<S: ObjectStore> Processor<S> {
    pub fn new(store: S, config: PipelineConfig) -> Self {
        Self { store, config }
    }

    /// Process a batch of file-arrival notifications, in input order.
    ///
    /// Never fails: each file's outcome is appended to the `processed` or
    /// `failed` list, and the caller's redelivery policy decides what to do
    /// with partial failures.
    pub async fn handle_batch(&self, notifications: Vec<Notification>) -> BatchReport {
        info!(batch_size = notifications.len(), "Received ingestion batch");

        let mut processed = Vec::new();
        let mut failed = Vec::new();

        for notification in notifications {
            match self
                .process_file(&notification.bucket, &notification.key)
                .await
            {
                Ok(outcome) => {
                    info!(
                        key = %notification.key,
                        destination = %outcome.destination_key,
                        records = outcome.record_count,
                        "Successfully processed file"
                    );
                    processed.push(outcome);
                },
                Err(e) => {
                    error!(key = %notification.key, error = %e, "Failed to process file");
                    failed.push(FailedFile {
                        source_key: notification.key,
                        error: e.to_string(),
                    });
                },
            }
        }

        BatchReport {
            processed,
            failed,
            timestamp: Utc::now(),
        }
    }

    /// Transform a single raw file into the processed bucket.
    ///
    /// Raises typed errors and catches none of them; `handle_batch` owns
    /// the failure isolation. Re-delivery of an already-processed
    /// notification re-processes under a new timestamp partition
    /// (at-least-once, not deduplicated).
    pub async fn process_file(&self, bucket: &str, key: &str) -> Result<ProcessedFile> {
        let body = self.store.get(bucket, key).await?;

        let format = FileFormat::from_key(key)
            .ok_or_else(|| PipelineError::UnsupportedFormat(key.to_string()))?;

        let records = decode::decode(format, &body)?;

        let now = Utc::now();
        let ctx = RecordContext::new(now, self.config.environment.clone());
        let normalized: Vec<Record> = records.into_iter().map(|r| normalize(r, &ctx)).collect();
        let record_count = normalized.len();

        let payload = serde_json::to_vec_pretty(&normalized)?;
        let destination_key = destination_key(key, now);

        let mut metadata = ObjectMetadata::new();
        metadata.insert("source_bucket".to_string(), bucket.to_string());
        metadata.insert("source_key".to_string(), key.to_string());
        metadata.insert(
            "processed_at".to_string(),
            now.to_rfc3339_opts(SecondsFormat::Micros, true),
        );
        metadata.insert("record_count".to_string(), record_count.to_string());

        let put = self
            .store
            .put(
                &self.config.processed_bucket,
                &destination_key,
                payload,
                metadata,
                "application/json",
            )
            .await?;

        info!(
            key = %destination_key,
            checksum = %put.checksum,
            size = put.size,
            "Wrote transformed payload"
        );

        // Runs only after the put above succeeded. A crash between the two
        // leaves the original in incoming/ and the destination written;
        // re-delivery then re-processes safely.
        self.relocate_original(bucket, key).await?;

        Ok(ProcessedFile {
            source_key: key.to_string(),
            destination_key,
            record_count,
        })
    }

    /// Move the original from `incoming/` to `completed/` within the same
    /// bucket. Keys without an `incoming/` segment are left in place: a
    /// move onto the object's own key would destroy it.
    async fn relocate_original(&self, bucket: &str, key: &str) -> Result<()> {
        let completed_key = key.replacen(INCOMING_PREFIX, COMPLETED_PREFIX, 1);
        if completed_key == key {
            warn!(key = %key, "Key has no incoming/ segment, leaving original in place");
            return Ok(());
        }

        self.store
            .move_object(
                bucket,
                key,
                bucket,
                &completed_key,
                ObjectMetadata::new(),
                StorageTier::Standard,
            )
            .await?;

        info!(from = %key, to = %completed_key, "Relocated original");
        Ok(())
    }
}

/// Destination key for a transformed payload: deterministic in the
/// invoking timestamp and original filename, partitioned by date and time
/// to keep listings bounded and time-sortable.
fn destination_key(source_key: &str, now: DateTime<Utc>) -> String {
    let filename = source_key.rsplit('/').next().unwrap_or(source_key);
    format!(
        "{}{}/{}",
        PROCESSED_PREFIX,
        now.format("%Y/%m/%d/%H%M%S"),
        filename
    )
}
