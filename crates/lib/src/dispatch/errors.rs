//! Error types for handler dispatch.

use thiserror::Error;

/// Errors raised while delivering notifications to handlers.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum DispatchError {
    /// An asynchronous handler or delayed flush was scheduled outside of any
    /// async runtime
    #[error("No async context available to schedule {what}: no tokio runtime is running")]
    NoAsyncContext { what: String },

    /// The executor requires a supplied task group and none was set
    #[error("Cannot schedule {what}: executor requires a task group but none was supplied")]
    MissingTaskGroup { what: String },

    /// A synchronous handler reported a failure
    #[error("Handler '{handler}' failed: {reason}")]
    HandlerFailed { handler: String, reason: String },
}

impl DispatchError {
    /// Check if this error is a fatal execution-context configuration error.
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            DispatchError::NoAsyncContext { .. } | DispatchError::MissingTaskGroup { .. }
        )
    }

    /// Check if this error was reported by a handler.
    pub fn is_handler_error(&self) -> bool {
        matches!(self, DispatchError::HandlerFailed { .. })
    }
}

impl From<DispatchError> for crate::Error {
    fn from(err: DispatchError) -> Self {
        crate::Error::Dispatch(err)
    }
}
