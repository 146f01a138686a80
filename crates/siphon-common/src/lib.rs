//! Siphon Common Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Shared types, utilities, and error handling for the siphon workspace.
//!
//! # Overview
//!
//! This crate provides common functionality used across all siphon workspace
//! members:
//!
//! - **Error Handling**: The pipeline error taxonomy and result type
//! - **Logging**: Centralized tracing subscriber setup
//! - **Checksums**: Payload integrity digests
//!
//! # Example
//!
//! ```no_run
//! use siphon_common::{PipelineError, Result};
//!
//! fn parse_retention(raw: &str) -> Result<i64> {
//!     raw.parse()
//!         .map_err(|_| PipelineError::Config(format!("invalid retention: {raw}")))
//! }
//! ```

pub mod checksum;
pub mod error;
pub mod logging;

// Re-export commonly used types
pub use error::{MoveStage, PipelineError, Result};
