//! Error types for state tree operations.

use thiserror::Error;

use super::path::PathError;

/// Structured error types for reads and writes on the state tree.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum TreeError {
    /// Key not found in a node
    #[error("Key not found: {path}")]
    KeyNotFound { path: String },

    /// Malformed arguments passed to a tree operation
    #[error("Invalid argument to {operation}: {reason}")]
    InvalidArgument { operation: String, reason: String },

    /// A path or key could not be used to address the tree
    #[error("Invalid path '{path}': {reason}")]
    InvalidPath { path: String, reason: String },

    /// A write needed a container but found a different kind of value
    #[error("Type mismatch at {path}: expected {expected}, found {actual}")]
    TypeMismatch {
        path: String,
        expected: String,
        actual: String,
    },

    /// A list index past the end of the list
    #[error("Index {index} out of range for list at {path} (length {len})")]
    IndexOutOfRange {
        path: String,
        index: usize,
        len: usize,
    },
}

impl TreeError {
    /// Check if this error indicates a missing key
    pub fn is_not_found(&self) -> bool {
        matches!(self, TreeError::KeyNotFound { .. })
    }

    /// Check if this error was caused by malformed arguments
    pub fn is_invalid_argument(&self) -> bool {
        matches!(
            self,
            TreeError::InvalidArgument { .. } | TreeError::InvalidPath { .. }
        )
    }

    /// Check if this error is related to type mismatches
    pub fn is_type_error(&self) -> bool {
        matches!(self, TreeError::TypeMismatch { .. })
    }

    /// Get the path if this error refers to a location in the tree
    pub fn path(&self) -> Option<&str> {
        match self {
            TreeError::KeyNotFound { path }
            | TreeError::InvalidPath { path, .. }
            | TreeError::TypeMismatch { path, .. }
            | TreeError::IndexOutOfRange { path, .. } => Some(path),
            TreeError::InvalidArgument { .. } => None,
        }
    }
}

impl From<PathError> for TreeError {
    fn from(err: PathError) -> Self {
        match err {
            PathError::InvalidComponent { component, reason } => TreeError::InvalidPath {
                path: component,
                reason,
            },
        }
    }
}

impl From<TreeError> for crate::Error {
    fn from(err: TreeError) -> Self {
        crate::Error::Tree(err)
    }
}

impl From<PathError> for crate::Error {
    fn from(err: PathError) -> Self {
        crate::Error::Tree(err.into())
    }
}
