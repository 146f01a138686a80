//! Retention-driven archival sweep
//!
//! Scans the processed bucket page by page, archives every object strictly
//! older than the retention cutoff to the archive bucket, and aggregates
//! statistics across the whole listing. A single object's failure never
//! aborts the sweep; the copied-but-not-deleted window of a partial move is
//! surfaced through `failed_count` rather than silently lost.

use chrono::{DateTime, Duration, SecondsFormat, Utc};
use siphon_common::Result;
use tracing::{error, info};

use crate::config::{PipelineConfig, ARCHIVE_PREFIX, PROCESSED_PREFIX};
use crate::models::{bytes_to_mb, SweepReport};
use crate::storage::{ObjectInfo, ObjectMetadata, ObjectStore, StorageTier};

/// Drives the retention sweep against the storage capability.
pub struct Archiver<S> {
    store: S,
    config: PipelineConfig,
}

impl<S: ObjectStore> Archiver<S> {
    pub fn new(store: S, config: PipelineConfig) -> Self {
        Self { store, config }
    }

    /// Run one sweep: archive every processed object with
    /// `last_modified < now - retention_days`, leave everything else
    /// untouched, and return the aggregate statistics.
    ///
    /// `now` is passed in rather than read from the clock so the cutoff is
    /// fixed for the whole run. A listing-page failure aborts the sweep;
    /// per-object failures only increment `failed_count`.
    pub async fn sweep(&self, now: DateTime<Utc>) -> Result<SweepReport> {
        let cutoff = now - Duration::days(self.config.retention_days);

        info!(
            retention_days = self.config.retention_days,
            cutoff = %cutoff.to_rfc3339(),
            "Starting archival sweep"
        );

        let mut archived_count: u64 = 0;
        let mut failed_count: u64 = 0;
        let mut total_size_bytes: i64 = 0;

        let mut token = None;
        loop {
            let page = self
                .store
                .list_page(&self.config.processed_bucket, PROCESSED_PREFIX, token)
                .await?;

            for object in &page.objects {
                if object.last_modified >= cutoff {
                    continue;
                }

                match self.archive_object(object).await {
                    Ok(()) => {
                        archived_count += 1;
                        // size comes from the listing metadata, not a re-fetch
                        total_size_bytes += object.size;
                        info!(key = %object.key, size = object.size, "Archived object");
                    },
                    Err(e) => {
                        failed_count += 1;
                        error!(
                            key = %object.key,
                            error = %e,
                            duplicated = e.is_partial_move(),
                            "Failed to archive object"
                        );
                    },
                }
            }

            match page.next_token {
                Some(t) => token = Some(t),
                None => break,
            }
        }

        let report = SweepReport {
            archived_count,
            failed_count,
            total_size_bytes,
            total_size_mb: bytes_to_mb(total_size_bytes),
            cutoff_date: cutoff,
            timestamp: Utc::now(),
        };

        info!(
            archived = report.archived_count,
            failed = report.failed_count,
            total_size_mb = report.total_size_mb,
            "Archival sweep complete"
        );

        Ok(report)
    }

    /// Move one object to the archive bucket under a date-partitioned key
    /// derived from the object's original last-modified time.
    async fn archive_object(&self, object: &ObjectInfo) -> Result<()> {
        let archive_key = archive_key(&object.key, object.last_modified);

        let mut metadata = ObjectMetadata::new();
        metadata.insert("original_key".to_string(), object.key.clone());
        metadata.insert(
            "original_bucket".to_string(),
            self.config.processed_bucket.clone(),
        );
        metadata.insert(
            "archived_at".to_string(),
            Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true),
        );
        metadata.insert(
            "original_last_modified".to_string(),
            object
                .last_modified
                .to_rfc3339_opts(SecondsFormat::Micros, true),
        );

        self.store
            .move_object(
                &self.config.processed_bucket,
                &object.key,
                &self.config.archive_bucket,
                &archive_key,
                metadata,
                StorageTier::InfrequentAccess,
            )
            .await
    }
}

/// Archive key: year/month partition from the object's original
/// last-modified time (not the sweep time) plus the original filename.
fn archive_key(key: &str, last_modified: DateTime<Utc>) -> String {
    let filename = key.rsplit('/').next().unwrap_or(key);
    format!(
        "{}{}/{}",
        ARCHIVE_PREFIX,
        last_modified.format("%Y/%m"),
        filename
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_archive_key_uses_original_last_modified() {
        let last_modified = Utc.with_ymd_and_hms(2024, 1, 15, 8, 0, 0).unwrap();
        assert_eq!(
            archive_key("processed/2024/01/15/080000/orders.json", last_modified),
            "archive/2024/01/orders.json"
        );
    }
}
