//! Error types for scene operations.

use thiserror::Error;

/// Result type for scene operations.
pub type StageResult<T> = Result<T, StageError>;

/// Errors that can occur in scene operations.
#[derive(Debug, Error)]
pub enum StageError {
    /// Entity not found in the tree.
    #[error("Entity not found: {0}")]
    EntityNotFound(String),

    /// Invalid operation on an entity.
    #[error("Invalid operation on entity: {0}")]
    InvalidOperation(String),

    /// JSON could not be parsed or produced.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// JSON parsed but does not describe a scene node.
    #[error("Invalid scene document: {0}")]
    InvalidDocument(String),

    /// Reading or writing a scene file failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
