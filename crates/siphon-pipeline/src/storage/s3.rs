//! S3-backed object store

use aws_sdk_s3::{
    config::{Credentials, Region},
    primitives::ByteStream,
    types::{MetadataDirective, StorageClass},
    Client,
};
use chrono::{DateTime, Utc};
use siphon_common::{checksum, PipelineError, Result};
use tracing::{debug, info};

use super::{
    config::StorageConfig, ListPage, ObjectInfo, ObjectMetadata, ObjectStore, PutResult,
    StorageTier,
};

/// Object store backed by S3 or any S3-compatible service (MinIO etc.).
///
/// Adapted for multi-bucket use: the bucket is an argument to every call
/// rather than fixed at construction, since the pipeline reads, writes, and
/// archives across three buckets.
#[derive(Clone)]
pub struct S3Store {
    client: Client,
}

impl S3Store {
    pub fn new(config: StorageConfig) -> Self {
        debug!("Initializing S3 store with config: {:?}", config);

        let credentials = Credentials::new(
            &config.access_key,
            &config.secret_key,
            None,
            None,
            "siphon-storage",
        );

        let mut s3_config_builder = aws_sdk_s3::Config::builder()
            .credentials_provider(credentials)
            .region(Region::new(config.region.clone()))
            .force_path_style(config.path_style);

        if let Some(endpoint) = &config.endpoint {
            s3_config_builder = s3_config_builder.endpoint_url(endpoint);
        }

        let client = Client::from_conf(s3_config_builder.build());

        info!("S3 store initialized for region {}", config.region);

        Self { client }
    }

    /// Build a store from the ambient AWS environment (credential chain,
    /// region, profile), for deployments that don't pass explicit keys.
    pub async fn from_aws_env() -> Self {
        let sdk_config = aws_config::load_from_env().await;
        Self {
            client: Client::new(&sdk_config),
        }
    }

    /// Wrap an existing SDK client.
    pub fn from_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait::async_trait]
impl ObjectStore for S3Store {
    async fn get(&self, bucket: &str, key: &str) -> Result<Vec<u8>> {
        debug!("Downloading from s3://{}/{}", bucket, key);

        let response = self
            .client
            .get_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| PipelineError::StorageRead {
                bucket: bucket.to_string(),
                key: key.to_string(),
                reason: e.to_string(),
            })?;

        let data = response
            .body
            .collect()
            .await
            .map_err(|e| PipelineError::StorageRead {
                bucket: bucket.to_string(),
                key: key.to_string(),
                reason: format!("failed to read response body: {e}"),
            })?
            .into_bytes()
            .to_vec();

        debug!("Downloaded {} bytes from s3://{}/{}", data.len(), bucket, key);

        Ok(data)
    }

    async fn put(
        &self,
        bucket: &str,
        key: &str,
        body: Vec<u8>,
        metadata: ObjectMetadata,
        content_type: &str,
    ) -> Result<PutResult> {
        let checksum = checksum::sha256_hex(&body);
        let size = body.len() as i64;

        debug!("Uploading {} bytes to s3://{}/{}", size, bucket, key);

        self.client
            .put_object()
            .bucket(bucket)
            .key(key)
            .body(ByteStream::from(body))
            .content_type(content_type)
            .set_metadata(Some(metadata))
            .send()
            .await
            .map_err(|e| PipelineError::StorageWrite {
                bucket: bucket.to_string(),
                key: key.to_string(),
                reason: e.to_string(),
            })?;

        info!("Successfully uploaded to s3://{}/{}", bucket, key);

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
        debug!(
            "Copying s3://{}/{} to s3://{}/{}",
            src_bucket, src_key, dst_bucket, dst_key
        );

        let copy_source = format!("{}/{}", src_bucket, src_key);

        let mut request = self
            .client
            .copy_object()
            .bucket(dst_bucket)
            .copy_source(&copy_source)
            .key(dst_key)
            .set_metadata(Some(metadata))
            .metadata_directive(MetadataDirective::Replace);

        if tier == StorageTier::InfrequentAccess {
            request = request.storage_class(StorageClass::StandardIa);
        }

        request.send().await.map_err(|e| PipelineError::StorageWrite {
            bucket: dst_bucket.to_string(),
            key: dst_key.to_string(),
            reason: e.to_string(),
        })?;

        info!(
            "Successfully copied s3://{}/{} to s3://{}/{}",
            src_bucket, src_key, dst_bucket, dst_key
        );

        Ok(())
    }

    async fn delete(&self, bucket: &str, key: &str) -> Result<()> {
        debug!("Deleting s3://{}/{}", bucket, key);

        self.client
            .delete_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| PipelineError::StorageWrite {
                bucket: bucket.to_string(),
                key: key.to_string(),
                reason: e.to_string(),
            })?;

        info!("Successfully deleted s3://{}/{}", bucket, key);

        Ok(())
    }

    async fn list_page(
        &self,
        bucket: &str,
        prefix: &str,
        token: Option<String>,
    ) -> Result<ListPage> {
        debug!(
            "Listing objects in s3://{}/{} (token: {:?})",
            bucket, prefix, token
        );

        let response = self
            .client
            .list_objects_v2()
            .bucket(bucket)
            .prefix(prefix)
            .set_continuation_token(token)
            .send()
            .await
            .map_err(|e| PipelineError::StorageRead {
                bucket: bucket.to_string(),
                key: prefix.to_string(),
                reason: e.to_string(),
            })?;

        let objects = response
            .contents()
            .iter()
            .filter_map(|obj| {
                let key = obj.key()?.to_string();
                let last_modified = obj
                    .last_modified()
                    .and_then(|dt| parse_smithy_timestamp(&dt.to_string()))?;
                Some(ObjectInfo {
                    key,
                    last_modified,
                    size: obj.size().unwrap_or(0),
                })
            })
            .collect();

        Ok(ListPage {
            objects,
            next_token: response.next_continuation_token().map(|t| t.to_string()),
        })
    }
}

fn parse_smithy_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}
