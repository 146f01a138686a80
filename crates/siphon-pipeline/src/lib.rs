//! Siphon Pipeline Library
//!
//! Ingests newly-arrived data files from an object store, normalizes their
//! records into a common schema, writes the transformed output to a
//! processed store, and later migrates aged output to a cold-storage tier
//! under a retention policy.
//!
//! # Components
//!
//! - [`decode`]: payload format inference and record decoding (JSON, CSV)
//! - [`normalize`]: pure per-record validation and enrichment
//! - [`processor`]: per-file transform pipeline and batch orchestration
//! - [`archiver`]: retention-driven archival sweep
//! - [`storage`]: object-store capability (S3 and in-memory backends)
//!
//! # Example
//!
//! ```no_run
//! use siphon_pipeline::config::PipelineConfig;
//! use siphon_pipeline::models::Notification;
//! use siphon_pipeline::processor::Processor;
//! use siphon_pipeline::storage::memory::MemoryStore;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = PipelineConfig::load()?;
//!     let processor = Processor::new(MemoryStore::new(), config);
//!     let report = processor
//!         .handle_batch(vec![Notification {
//!             bucket: "raw-data".to_string(),
//!             key: "incoming/orders.json".to_string(),
//!         }])
//!         .await;
//!     println!("{}", serde_json::to_string_pretty(&report)?);
//!     Ok(())
//! }
//! ```

pub mod archiver;
pub mod config;
pub mod decode;
pub mod models;
pub mod normalize;
pub mod processor;
pub mod storage;

// Re-export commonly used types
pub use archiver::Archiver;
pub use models::{BatchReport, Notification, SweepReport};
pub use processor::Processor;
pub use storage::ObjectStore;
