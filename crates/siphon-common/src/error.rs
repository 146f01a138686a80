//! Error types for the siphon pipeline

use thiserror::Error;

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Which half of a copy-then-delete move failed.
///
/// A move has no atomicity guarantee from the object store, so every caller
/// sees the same two partial-failure shapes: `Copy` means nothing changed,
/// `Delete` means the object now exists at both locations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveStage {
    Copy,
    Delete,
}

impl std::fmt::Display for MoveStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MoveStage::Copy => write!(f, "copy"),
            MoveStage::Delete => write!(f, "delete"),
        }
    }
}

/// Main error type for the siphon pipeline
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Unsupported file format: {0}")]
    UnsupportedFormat(String),

    #[error("Storage read failed for {bucket}/{key}: {reason}")]
    StorageRead {
        bucket: String,
        key: String,
        reason: String,
    },

    #[error("Storage write failed for {bucket}/{key}: {reason}")]
    StorageWrite {
        bucket: String,
        key: String,
        reason: String,
    },

    #[error("Move failed at {stage} step for {key}: {reason}")]
    Move {
        key: String,
        stage: MoveStage,
        reason: String,
    },

    #[error("Configuration error: {0}")]
    Config(String),
}

impl PipelineError {
    /// True when a move copied the object but failed to delete the original,
    /// leaving it present in both locations.
    pub fn is_partial_move(&self) -> bool {
        matches!(
            self,
            PipelineError::Move {
                stage: MoveStage::Delete,
                ..
            }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_is_stable() {
        let err = PipelineError::UnsupportedFormat("data/incoming/report.xml".to_string());
        assert_eq!(
            err.to_string(),
            "Unsupported file format: data/incoming/report.xml"
        );

        let err = PipelineError::StorageRead {
            bucket: "raw".to_string(),
            key: "incoming/a.json".to_string(),
            reason: "NoSuchKey".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Storage read failed for raw/incoming/a.json: NoSuchKey"
        );
    }

    #[test]
    fn test_partial_move_detection() {
        let copy_failed = PipelineError::Move {
            key: "k".to_string(),
            stage: MoveStage::Copy,
            reason: "timeout".to_string(),
        };
        let delete_failed = PipelineError::Move {
            key: "k".to_string(),
            stage: MoveStage::Delete,
            reason: "denied".to_string(),
        };

        assert!(!copy_failed.is_partial_move());
        assert!(delete_failed.is_partial_move());
    }
}
