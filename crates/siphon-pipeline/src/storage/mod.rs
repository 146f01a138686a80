//! Object-store capability
//!
//! [`ObjectStore`] is the seam between the pipeline and the storage
//! service: get, put, copy, delete, and paginated listing. [`S3Store`] is
//! the production implementation; [`memory::MemoryStore`] backs tests and
//! local runs.
//!
//! The store exposes "move" as a single named operation because
//! copy-then-delete has no atomicity guarantee from the service. Every
//! caller sees the same documented partial-failure shape instead of
//! re-deriving it.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use siphon_common::{MoveStage, PipelineError, Result};

pub mod config;
pub mod memory;
pub mod s3;

pub use config::StorageConfig;
pub use s3::S3Store;

/// User-defined metadata attached to an object on put/copy.
pub type ObjectMetadata = HashMap<String, String>;

/// Storage-class hint for writes. `InfrequentAccess` maps to the cheaper
/// cold tier on backends that support one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StorageTier {
    #[default]
    Standard,
    InfrequentAccess,
}

/// Result of a successful put
#[derive(Debug, Clone)]
pub struct PutResult {
    pub key: String,
    pub checksum: String,
    pub size: i64,
}

/// One object as reported by a listing page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectInfo {
    pub key: String,
    pub last_modified: DateTime<Utc>,
    pub size: i64,
}

/// One page of a paginated listing. `next_token` is `None` on the final
/// page.
#[derive(Debug, Clone, Default)]
pub struct ListPage {
    pub objects: Vec<ObjectInfo>,
    pub next_token: Option<String>,
}

/// Object-store operations the pipeline depends on.
///
/// Every call is a point-to-point request/response with no partial
/// results; callers sequence them and own any cross-call invariants.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Fetch an object's full body.
    async fn get(&self, bucket: &str, key: &str) -> Result<Vec<u8>>;

    /// Write an object with user metadata and a content type.
    async fn put(
        &self,
        bucket: &str,
        key: &str,
        body: Vec<u8>,
        metadata: ObjectMetadata,
        content_type: &str,
    ) -> Result<PutResult>;

    /// Server-side copy, replacing metadata on the destination.
    async fn copy(
        &self,
        src_bucket: &str,
        src_key: &str,
        dst_bucket: &str,
        dst_key: &str,
        metadata: ObjectMetadata,
        tier: StorageTier,
    ) -> Result<()>;

    /// Delete an object.
    async fn delete(&self, bucket: &str, key: &str) -> Result<()>;

    /// Fetch one page of a listing under `prefix`, resuming from `token`.
    async fn list_page(
        &self,
        bucket: &str,
        prefix: &str,
        token: Option<String>,
    ) -> Result<ListPage>;

    /// Move an object: copy to the destination, then delete the original.
    ///
    /// Not atomic. Failure at [`MoveStage::Copy`] leaves everything
    /// unchanged; failure at [`MoveStage::Delete`] leaves the object
    /// present at both locations, and the caller must surface that rather
    /// than silently lose it.
    async fn move_object(
        &self,
        src_bucket: &str,
        src_key: &str,
        dst_bucket: &str,
        dst_key: &str,
        metadata: ObjectMetadata,
        tier: StorageTier,
    ) -> Result<()> {
        self.copy(src_bucket, src_key, dst_bucket, dst_key, metadata, tier)
            .await
            .map_err(|e| PipelineError::Move {
                key: src_key.to_string(),
                stage: MoveStage::Copy,
                reason: e.to_string(),
            })?;

        self.delete(src_bucket, src_key)
            .await
            .map_err(|e| PipelineError::Move {
                key: src_key.to_string(),
                stage: MoveStage::Delete,
                reason: e.to_string(),
            })?;

        Ok(())
    }
}
