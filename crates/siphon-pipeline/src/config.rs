//! Configuration management

use serde::{Deserialize, Serialize};

// ============================================================================
// Pipeline Configuration Constants
// ============================================================================

/// Default bucket receiving raw incoming files.
pub const DEFAULT_RAW_BUCKET: &str = "siphon-raw";

/// Default bucket receiving transformed output.
pub const DEFAULT_PROCESSED_BUCKET: &str = "siphon-processed";

/// Default bucket receiving archived output.
pub const DEFAULT_ARCHIVE_BUCKET: &str = "siphon-archive";

/// Default retention period before processed output is archived.
pub const DEFAULT_RETENTION_DAYS: i64 = 30;

/// Default environment tag stamped into record metadata.
pub const DEFAULT_ENVIRONMENT: &str = "dev";

/// Prefix under which transformed output is written.
pub const PROCESSED_PREFIX: &str = "processed/";

/// Prefix under which archived output is written.
pub const ARCHIVE_PREFIX: &str = "archive/";

/// Pipeline configuration, resolved once at startup and passed into each
/// component. Components never read ambient environment state themselves.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Bucket raw files arrive in (`incoming/` prefix)
    pub raw_bucket: String,

    /// Bucket transformed output is written to
    pub processed_bucket: String,

    /// Bucket aged output is archived to
    pub archive_bucket: String,

    /// Age in days after which processed output becomes archivable
    pub retention_days: i64,

    /// Environment tag stamped into each record's `_metadata`
    pub environment: String,
}

impl PipelineConfig {
    /// Load configuration from environment and defaults
    pub fn load() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let config = PipelineConfig {
            raw_bucket: std::env::var("RAW_BUCKET")
                .unwrap_or_else(|_| DEFAULT_RAW_BUCKET.to_string()),
            processed_bucket: std::env::var("PROCESSED_BUCKET")
                .unwrap_or_else(|_| DEFAULT_PROCESSED_BUCKET.to_string()),
            archive_bucket: std::env::var("ARCHIVE_BUCKET")
                .unwrap_or_else(|_| DEFAULT_ARCHIVE_BUCKET.to_string()),
            retention_days: std::env::var("RETENTION_DAYS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_RETENTION_DAYS),
            environment: std::env::var("ENVIRONMENT")
                .unwrap_or_else(|_| DEFAULT_ENVIRONMENT.to_string()),
        };

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.raw_bucket.is_empty() {
            anyhow::bail!("Raw bucket name cannot be empty");
        }

        if self.processed_bucket.is_empty() {
            anyhow::bail!("Processed bucket name cannot be empty");
        }

        if self.archive_bucket.is_empty() {
            anyhow::bail!("Archive bucket name cannot be empty");
        }

        if self.retention_days <= 0 {
            anyhow::bail!(
                "Retention days must be greater than 0, got {}",
                self.retention_days
            );
        }

        if self.environment.is_empty() {
            anyhow::bail!("Environment tag cannot be empty");
        }

        Ok(())
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            raw_bucket: DEFAULT_RAW_BUCKET.to_string(),
            processed_bucket: DEFAULT_PROCESSED_BUCKET.to_string(),
            archive_bucket: DEFAULT_ARCHIVE_BUCKET.to_string(),
            retention_days: DEFAULT_RETENTION_DAYS,
            environment: DEFAULT_ENVIRONMENT.to_string(),
        }
    }
}
