//! In-memory object store for tests and local runs
//!
//! Behaves like a tiny S3: per-bucket key ordering, continuation-token
//! pagination with a configurable page size, and metadata replacement on
//! copy. Per-key fault injection simulates copy and delete failures so the
//! partial-move window can be exercised deterministically.

use std::collections::{BTreeMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use siphon_common::{PipelineError, Result};

use super::{ListPage, ObjectInfo, ObjectMetadata, ObjectStore, PutResult, StorageTier};

/// One stored object with everything a test may want to assert on.
#[derive(Debug, Clone)]
pub struct StoredObject {
    pub body: Vec<u8>,
    pub metadata: ObjectMetadata,
    pub content_type: String,
    pub last_modified: DateTime<Utc>,
    pub tier: StorageTier,
}

#[derive(Debug, Default)]
struct Inner {
    // BTreeMap keeps (bucket, key) sorted, which gives deterministic
    // listing order like S3's lexicographic key order
    objects: BTreeMap<(String, String), StoredObject>,
    fail_copies: HashSet<(String, String)>,
    fail_deletes: HashSet<(String, String)>,
}

/// In-memory [`ObjectStore`] implementation.
#[derive(Debug, Clone)]
pub struct MemoryStore {
    inner: Arc<Mutex<Inner>>,
    page_size: usize,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner::default())),
            page_size: 1000,
        }
    }

    /// Store with a small page size, to exercise pagination in tests.
    pub fn with_page_size(page_size: usize) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner::default())),
            page_size,
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Seed an object directly, with an explicit last-modified timestamp.
    pub fn seed_object(
        &self,
        bucket: &str,
        key: &str,
        body: Vec<u8>,
        last_modified: DateTime<Utc>,
    ) {
        self.lock().objects.insert(
            (bucket.to_string(), key.to_string()),
            StoredObject {
                body,
                metadata: ObjectMetadata::new(),
                content_type: "application/octet-stream".to_string(),
                last_modified,
                tier: StorageTier::Standard,
            },
        );
    }

    /// Every future copy with this source will fail.
    pub fn fail_copies_from(&self, bucket: &str, key: &str) {
        self.lock()
            .fail_copies
            .insert((bucket.to_string(), key.to_string()));
    }

    /// Every future delete of this key will fail.
    pub fn fail_deletes_of(&self, bucket: &str, key: &str) {
        self.lock()
            .fail_deletes
            .insert((bucket.to_string(), key.to_string()));
    }

    /// Fetch a stored object for assertions.
    pub fn object(&self, bucket: &str, key: &str) -> Option<StoredObject> {
        self.lock()
            .objects
            .get(&(bucket.to_string(), key.to_string()))
            .cloned()
    }

    pub fn contains(&self, bucket: &str, key: &str) -> bool {
        self.object(bucket, key).is_some()
    }

    /// All keys in a bucket, in listing order.
    pub fn keys_in(&self, bucket: &str) -> Vec<String> {
        self.lock()
            .objects
            .keys()
            .filter(|(b, _)| b.as_str() == bucket)
            .map(|(_, k)| k.clone())
            .collect()
    }
}

#[async_trait::async_trait]
impl ObjectStore for MemoryStore {
    async fn get(&self, bucket: &str, key: &str) -> Result<Vec<u8>> {
        self.object(bucket, key)
            .map(|obj| obj.body)
            .ok_or_else(|| PipelineError::StorageRead {
                bucket: bucket.to_string(),
                key: key.to_string(),
                reason: "no such key".to_string(),
            })
    }

    async fn put(
        &self,
        bucket: &str,
        key: &str,
        body: Vec<u8>,
        metadata: ObjectMetadata,
        content_type: &str,
    ) -> Result<PutResult> {
        let checksum = siphon_common::checksum::sha256_hex(&body);
        let size = body.len() as i64;

        self.lock().objects.insert(
            (bucket.to_string(), key.to_string()),
            StoredObject {
                body,
                metadata,
                content_type: content_type.to_string(),
                last_modified: Utc::now(),
                tier: StorageTier::Standard,
            },
        );

        Ok(PutResult {
            key: key.to_string(),
            checksum,
            size,
        })
    }

    async fn copy(
        &self,
        src_bucket: &str,
        src_key: &str,
        dst_bucket: &str,
        dst_key: &str,
        metadata: ObjectMetadata,
        tier: StorageTier,
    ) -> Result<()> {
        let mut inner = self.lock();

        if inner
            .fail_copies
            .contains(&(src_bucket.to_string(), src_key.to_string()))
        {
            return Err(PipelineError::StorageWrite {
                bucket: dst_bucket.to_string(),
                key: dst_key.to_string(),
                reason: "injected copy failure".to_string(),
            });
        }

        let source = inner
            .objects
            .get(&(src_bucket.to_string(), src_key.to_string()))
            .cloned()
            .ok_or_else(|| PipelineError::StorageRead {
                bucket: src_bucket.to_string(),
                key: src_key.to_string(),
                reason: "no such key".to_string(),
            })?;

        inner.objects.insert(
            (dst_bucket.to_string(), dst_key.to_string()),
            StoredObject {
                body: source.body,
                metadata,
                content_type: source.content_type,
                last_modified: Utc::now(),
                tier,
            },
        );

        Ok(())
    }

    async fn delete(&self, bucket: &str, key: &str) -> Result<()> {
        let mut inner = self.lock();

        if inner
            .fail_deletes
            .contains(&(bucket.to_string(), key.to_string()))
        {
            return Err(PipelineError::StorageWrite {
                bucket: bucket.to_string(),
                key: key.to_string(),
                reason: "injected delete failure".to_string(),
            });
        }

        // deleting a missing key succeeds, matching S3
        inner
            .objects
            .remove(&(bucket.to_string(), key.to_string()));

        Ok(())
    }

    async fn list_page(
        &self,
        bucket: &str,
        prefix: &str,
        token: Option<String>,
    ) -> Result<ListPage> {
        let inner = self.lock();

        let mut remaining: Vec<ObjectInfo> = inner
            .objects
            .iter()
            .filter(|((b, k), _)| {
                b.as_str() == bucket
                    && k.starts_with(prefix)
                    && token.as_deref().is_none_or(|t| k.as_str() > t)
            })
            .map(|((_, k), obj)| ObjectInfo {
                key: k.clone(),
                last_modified: obj.last_modified,
                size: obj.body.len() as i64,
            })
            .collect();

        let next_token = if remaining.len() > self.page_size {
            remaining.truncate(self.page_size);
            remaining.last().map(|obj| obj.key.clone())
        } else {
            None
        };

        Ok(ListPage {
            objects: remaining,
            next_token,
        })
    }
}
