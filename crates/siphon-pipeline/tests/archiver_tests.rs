//! Retention sweep tests
//!
//! These run the archival sweep against the in-memory object store,
//! covering:
//! - Cutoff-based eligibility over mixed-age listings
//! - Pagination across the full listing
//! - Partial-move fault handling (copy succeeded, delete failed)
//! - Aggregate counters and archive key layout

use chrono::{DateTime, Duration, TimeZone, Utc};
use siphon_pipeline::archiver::Archiver;
use siphon_pipeline::config::PipelineConfig;
use siphon_pipeline::storage::memory::MemoryStore;
use siphon_pipeline::storage::StorageTier;

const PROCESSED: &str = "processed-data";
const ARCHIVE: &str = "archive-data";

fn test_config() -> PipelineConfig {
    PipelineConfig {
        raw_bucket: "raw-data".to_string(),
        processed_bucket: PROCESSED.to_string(),
        archive_bucket: ARCHIVE.to_string(),
        retention_days: 30,
        environment: "test".to_string(),
    }
}

fn sweep_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap()
}

#[tokio::test]
async fn test_sweep_archives_only_objects_older_than_cutoff() {
    let store = MemoryStore::new();

    // 45 days old: eligible
    let old_modified = Utc.with_ymd_and_hms(2024, 1, 15, 8, 0, 0).unwrap();
    store.seed_object(
        PROCESSED,
        "processed/2024/01/15/080000/old.json",
        b"old-payload".to_vec(),
        old_modified,
    );

    // 10 days old: skipped
    let recent_modified = Utc.with_ymd_and_hms(2024, 2, 20, 8, 0, 0).unwrap();
    store.seed_object(
        PROCESSED,
        "processed/2024/02/20/080000/recent.json",
        b"recent-payload".to_vec(),
        recent_modified,
    );

    let archiver = Archiver::new(store.clone(), test_config());
    let report = archiver.sweep(sweep_now()).await.unwrap();

    assert_eq!(report.archived_count, 1);
    assert_eq!(report.failed_count, 0);
    assert_eq!(report.total_size_bytes, b"old-payload".len() as i64);
    assert_eq!(report.cutoff_date, sweep_now() - Duration::days(30));

    // archived under year/month of the ORIGINAL last-modified
    let archived = store.object(ARCHIVE, "archive/2024/01/old.json").unwrap();
    assert_eq!(archived.body, b"old-payload");
    assert!(!store.contains(PROCESSED, "processed/2024/01/15/080000/old.json"));

    // the recent object is untouched: same bucket, same key, same content
    let recent = store
        .object(PROCESSED, "processed/2024/02/20/080000/recent.json")
        .unwrap();
    assert_eq!(recent.body, b"recent-payload");
    assert!(!store.contains(ARCHIVE, "archive/2024/02/recent.json"));
}

#[tokio::test]
async fn test_object_exactly_at_cutoff_is_skipped() {
    let store = MemoryStore::new();
    let cutoff = sweep_now() - Duration::days(30);
    store.seed_object(PROCESSED, "processed/at-cutoff.json", b"x".to_vec(), cutoff);

    let archiver = Archiver::new(store.clone(), test_config());
    let report = archiver.sweep(sweep_now()).await.unwrap();

    // eligibility is strictly older than the cutoff
    assert_eq!(report.archived_count, 0);
    assert!(store.contains(PROCESSED, "processed/at-cutoff.json"));
}

#[tokio::test]
async fn test_copy_success_delete_failure_counts_as_failed() {
    let store = MemoryStore::new();
    let old_modified = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    store.seed_object(
        PROCESSED,
        "processed/stuck.json",
        b"payload".to_vec(),
        old_modified,
    );
    store.fail_deletes_of(PROCESSED, "processed/stuck.json");

    let archiver = Archiver::new(store.clone(), test_config());
    let report = archiver.sweep(sweep_now()).await.unwrap();

    assert_eq!(report.archived_count, 0);
    assert_eq!(report.failed_count, 1);
    assert_eq!(report.total_size_bytes, 0);

    // the object now exists in both buckets; surfaced, not silently lost
    assert!(store.contains(PROCESSED, "processed/stuck.json"));
    assert!(store.contains(ARCHIVE, "archive/2024/01/stuck.json"));
}

#[tokio::test]
async fn test_copy_failure_leaves_source_untouched() {
    let store = MemoryStore::new();
    let old_modified = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    store.seed_object(
        PROCESSED,
        "processed/unreadable.json",
        b"payload".to_vec(),
        old_modified,
    );
    store.fail_copies_from(PROCESSED, "processed/unreadable.json");

    let archiver = Archiver::new(store.clone(), test_config());
    let report = archiver.sweep(sweep_now()).await.unwrap();

    assert_eq!(report.archived_count, 0);
    assert_eq!(report.failed_count, 1);
    assert!(store.contains(PROCESSED, "processed/unreadable.json"));
    assert!(!store.contains(ARCHIVE, "archive/2024/01/unreadable.json"));
}

#[tokio::test]
async fn test_one_failure_does_not_abort_the_sweep() {
    let store = MemoryStore::new();
    let old_modified = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    store.seed_object(PROCESSED, "processed/a.json", b"a".to_vec(), old_modified);
    store.seed_object(PROCESSED, "processed/b.json", b"b".to_vec(), old_modified);
    store.seed_object(PROCESSED, "processed/c.json", b"c".to_vec(), old_modified);
    store.fail_deletes_of(PROCESSED, "processed/b.json");

    let archiver = Archiver::new(store.clone(), test_config());
    let report = archiver.sweep(sweep_now()).await.unwrap();

    assert_eq!(report.archived_count, 2);
    assert_eq!(report.failed_count, 1);
    assert!(store.contains(ARCHIVE, "archive/2024/01/a.json"));
    assert!(store.contains(ARCHIVE, "archive/2024/01/c.json"));
}

#[tokio::test]
async fn test_sweep_spans_all_listing_pages() {
    let store = MemoryStore::with_page_size(2);
    let old_modified = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    for i in 0..5 {
        store.seed_object(
            PROCESSED,
            &format!("processed/file-{i}.json"),
            vec![0u8; 10],
            old_modified,
        );
    }

    let archiver = Archiver::new(store.clone(), test_config());
    let report = archiver.sweep(sweep_now()).await.unwrap();

    assert_eq!(report.archived_count, 5);
    assert_eq!(report.total_size_bytes, 50);
    assert!(store.keys_in(PROCESSED).is_empty());
}

#[tokio::test]
async fn test_sweep_ignores_objects_outside_processed_prefix() {
    let store = MemoryStore::new();
    let old_modified = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    store.seed_object(PROCESSED, "tmp/scratch.json", b"x".to_vec(), old_modified);

    let archiver = Archiver::new(store.clone(), test_config());
    let report = archiver.sweep(sweep_now()).await.unwrap();

    assert_eq!(report.archived_count, 0);
    assert!(store.contains(PROCESSED, "tmp/scratch.json"));
}

#[tokio::test]
async fn test_archived_object_carries_provenance_metadata() {
    let store = MemoryStore::new();
    let old_modified = Utc.with_ymd_and_hms(2024, 1, 15, 8, 0, 0).unwrap();
    store.seed_object(
        PROCESSED,
        "processed/traced.json",
        b"payload".to_vec(),
        old_modified,
    );

    let archiver = Archiver::new(store.clone(), test_config());
    archiver.sweep(sweep_now()).await.unwrap();

    let archived = store.object(ARCHIVE, "archive/2024/01/traced.json").unwrap();
    assert_eq!(archived.metadata["original_key"], "processed/traced.json");
    assert_eq!(archived.metadata["original_bucket"], PROCESSED);
    assert_eq!(
        archived.metadata["original_last_modified"],
        "2024-01-15T08:00:00.000000Z"
    );
    assert!(archived.metadata.contains_key("archived_at"));
    assert_eq!(archived.tier, StorageTier::InfrequentAccess);
}

#[tokio::test]
async fn test_report_mb_rounding() {
    let store = MemoryStore::new();
    let old_modified = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    store.seed_object(
        PROCESSED,
        "processed/big.json",
        vec![0u8; 1_572_864],
        old_modified,
    );

    let archiver = Archiver::new(store.clone(), test_config());
    let report = archiver.sweep(sweep_now()).await.unwrap();

    assert_eq!(report.total_size_bytes, 1_572_864);
    assert_eq!(report.total_size_mb, 1.5);
}
