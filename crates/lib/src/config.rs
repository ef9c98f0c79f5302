//! Tree configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{
    Result, constants,
    dispatch::executor::ExecutorMode,
    tree::{Component, TreeError},
};

/// Configuration for a [`crate::StateTree`].
///
/// All fields have defaults, so a partial JSON document deserializes into a
/// complete config.
///
/// ```
/// # use appstate::{ExecutorMode, TreeConfig};
/// let config = TreeConfig {
///     executor: ExecutorMode::Supplied,
///     ..Default::default()
/// };
/// assert_eq!(config.root, "state");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TreeConfig {
    /// Name of the root segment of every absolute path.
    pub root: String,

    /// Store key that holds the snapshot of the whole tree.
    pub snapshot_key: String,

    /// Attribute names with this prefix are private to a node and never
    /// persisted.
    pub private_prefix: String,

    /// Debounce used by [`crate::StateTree::persist_to`], in milliseconds.
    pub debounce_ms: u64,

    /// Where asynchronous handlers and delayed flushes are spawned.
    pub executor: ExecutorMode,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            root: constants::ROOT.to_string(),
            snapshot_key: constants::SNAPSHOT_KEY.to_string(),
            private_prefix: constants::PRIVATE_PREFIX.to_string(),
            debounce_ms: constants::DEFAULT_DEBOUNCE_MS,
            executor: ExecutorMode::default(),
        }
    }
}

impl TreeConfig {
    pub fn with_root(mut self, root: impl Into<String>) -> Self {
        self.root = root.into();
        self
    }

    pub fn with_snapshot_key(mut self, key: impl Into<String>) -> Self {
        self.snapshot_key = key.into();
        self
    }

    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce_ms = debounce.as_millis() as u64;
        self
    }

    pub fn with_executor(mut self, executor: ExecutorMode) -> Self {
        self.executor = executor;
        self
    }

    /// The configured persistence debounce.
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    /// Check that the config describes a usable tree.
    pub fn validate(&self) -> Result<()> {
        Component::new(self.root.as_str()).map_err(|e| invalid(e.to_string()))?;
        if self.snapshot_key.is_empty() {
            return Err(invalid("snapshot key must not be empty".to_string()));
        }
        if self.private_prefix.is_empty() {
            return Err(invalid("private prefix must not be empty".to_string()));
        }
        Ok(())
    }
}

fn invalid(reason: String) -> crate::Error {
    TreeError::InvalidArgument {
        operation: "config".to_string(),
        reason,
    }
    .into()
}
