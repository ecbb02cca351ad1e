//! Error types for the editing core and its collaborators.
use crate::document::NodeKey;
use std::fmt;
use thiserror::Error;

/// Top-level error type for document, command and persistence failures.
#[derive(Error, Debug)]
pub enum EditorError {
    /// Malformed command input; absorbed as a no-op by the command layer.
    #[error("Validation error: {0}")]
    Validation(String),

    /// A serialized node carried a type tag with no registered codec.
    #[error("Unknown node type: {0}")]
    UnknownNodeType(String),

    #[error("Invalid document: {0}")]
    InvalidDocument(String),

    #[error("Node not found: {0}")]
    NodeNotFound(NodeKey),

    #[error("Persistence failure: {0}")]
    Persistence(#[from] PersistenceError),

    #[error("Render failure: {0}")]
    Render(#[from] RenderError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl EditorError {
    /// Shorthand for [`EditorError::Validation`].
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Shorthand for [`EditorError::InvalidDocument`].
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidDocument(message.into())
    }
}

/// Uniform failure shape reported by the persistence and summary collaborators.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub struct PersistenceError {
    pub message: String,
    pub status: Option<u16>,
}

impl PersistenceError {
    /// Build an error with a message and optional HTTP-like status.
    pub fn new(message: impl Into<String>, status: Option<u16>) -> Self {
        Self {
            message: message.into(),
            status,
        }
    }

    /// The requested record does not exist.
    pub fn not_found(id: &str) -> Self {
        Self::new(format!("Post '{}' not found", id), Some(404))
    }

    /// The collaborator could not be reached at all.
    pub fn unavailable() -> Self {
        Self::new("Unable to connect to the server", None)
    }
}

impl fmt::Display for PersistenceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.status {
            Some(status) => write!(f, "{} (status {})", self.message, status),
            None => f.write_str(&self.message),
        }
    }
}

/// Failure reported by the typesetting collaborator.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct RenderError {
    pub message: String,
}

impl RenderError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Convenience alias used throughout the core.
pub type Result<T> = std::result::Result<T, EditorError>;
