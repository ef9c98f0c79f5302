//! Error types for the persistence layer.

use thiserror::Error;

/// Errors raised while loading or saving tree snapshots.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum PersistError {
    /// Reading or writing the snapshot file failed
    #[error("File I/O error on {path}: {source}")]
    FileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The snapshot could not be serialized
    #[error("Serialization failed: {source}")]
    SerializationFailed {
        #[source]
        source: serde_json::Error,
    },

    /// The snapshot file exists but does not hold a valid snapshot
    #[error("Deserialization of {path} failed: {source}")]
    DeserializationFailed {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    /// The stored snapshot is not a map
    #[error("Snapshot under '{key}' must be a map, found {actual}")]
    InvalidSnapshot { key: String, actual: String },

    /// Operation on a store after it was closed
    #[error("Store {store} is closed")]
    StoreClosed { store: String },

    /// Flush requested while no store is attached to the tree
    #[error("Tree is not attached to a store")]
    NotPersisting,
}

impl PersistError {
    /// Check if this error is I/O related.
    pub fn is_io_error(&self) -> bool {
        matches!(self, PersistError::FileIo { .. })
    }

    /// Check if this error indicates a corrupt or malformed snapshot.
    pub fn is_format_error(&self) -> bool {
        matches!(
            self,
            PersistError::DeserializationFailed { .. } | PersistError::InvalidSnapshot { .. }
        )
    }
}

impl From<PersistError> for crate::Error {
    fn from(err: PersistError) -> Self {
        crate::Error::Persist(err)
    }
}
