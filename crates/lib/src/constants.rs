//! Constants used throughout the appstate library.
//!
//! This module provides central definitions for reserved names and limits
//! shared by the tree, the persistence layer and the command line tool.

/// Name of the root node; every absolute path starts with it.
pub const ROOT: &str = "state";

/// Store key under which the whole tree snapshot is saved.
pub const SNAPSHOT_KEY: &str = "state";

/// Attribute names starting with this prefix are private to a node.
pub const PRIVATE_PREFIX: &str = "_";

/// Default delay between the first change and the snapshot write.
pub const DEFAULT_DEBOUNCE_MS: u64 = 3000;

/// Width that logged value previews are shortened to.
pub const PREVIEW_WIDTH: usize = 60;

/// Handler name used for the persistence subscription.
pub const PERSIST_HANDLER: &str = "persist";
