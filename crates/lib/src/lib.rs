//!
//! appstate: an observable, path-addressed hierarchical state tree.
//!
//! Applications keep their shared state in one [`StateTree`], read and write
//! it through map-like [`Node`] views, and react to changes by subscribing
//! handlers to dotted path patterns.
//!
//! ## Core Concepts
//!
//! * **Tree (`tree::StateTree`)**: The root handle. Cheap to clone; every clone
//!   addresses the same tree.
//! * **Nodes (`tree::Node`, `tree::NodeList`)**: Views of a map or list at an
//!   absolute path such as `state.countries.AU`. Missing nodes are created
//!   silently on first write.
//! * **Subscriptions (`subscription::Registry`)**: Pattern to handler
//!   registrations. A mutation at path `P` notifies every pattern that is an
//!   ancestor or a descendant of `P`.
//! * **Dispatch (`dispatch::Handler`)**: Free functions or per-type methods,
//!   synchronous or asynchronous. Method handlers fan out over the live
//!   instances of their type.
//! * **Persistence (`persist`)**: Debounced snapshots of the whole tree into a
//!   key/value [`persist::Store`].
//! * **Binding (`binding::Binding`)**: Register callbacks on a single property
//!   and release them all together.

pub mod binding;
pub mod config;
pub mod constants;
pub mod dispatch;
pub mod persist;
pub mod subscription;
pub mod tree;

pub use binding::Binding;
pub use config::TreeConfig;
pub use dispatch::{Handler, executor::ExecutorMode};
pub use persist::{JsonFileStore, MemoryStore, Store};
pub use subscription::HandlerToken;
/// Re-export the tree types for easier access.
pub use tree::{Item, Map, Node, NodeList, Path, PathBuf, StateTree, Value};

/// Result type used throughout the appstate library.
pub type Result<T> = std::result::Result<T, Error>;

/// Common error type for the appstate library.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    /// Structured tree errors from the tree module
    #[error(transparent)]
    Tree(tree::TreeError),

    /// Structured dispatch errors from the dispatch module
    #[error(transparent)]
    Dispatch(dispatch::DispatchError),

    /// Structured persistence errors from the persist module
    #[error(transparent)]
    Persist(persist::PersistError),
}

impl Error {
    /// Get the originating module for this error.
    pub fn module(&self) -> &'static str {
        match self {
            Error::Tree(_) => "tree",
            Error::Dispatch(_) => "dispatch",
            Error::Persist(_) => "persist",
            Error::Io(_) => "io",
            Error::Serialize(_) => "serialize",
        }
    }

    /// Check if this error indicates a key was not found.
    pub fn is_not_found(&self) -> bool {
        match self {
            Error::Tree(tree_err) => tree_err.is_not_found(),
            _ => false,
        }
    }

    /// Check if this error was caused by malformed arguments.
    pub fn is_invalid_argument(&self) -> bool {
        match self {
            Error::Tree(tree_err) => tree_err.is_invalid_argument(),
            _ => false,
        }
    }

    /// Check if this error is type-related.
    pub fn is_type_error(&self) -> bool {
        match self {
            Error::Tree(tree_err) => tree_err.is_type_error(),
            _ => false,
        }
    }

    /// Check if this error is a fatal configuration problem with the
    /// execution context (no runtime, no task group).
    pub fn is_config_error(&self) -> bool {
        match self {
            Error::Dispatch(dispatch_err) => dispatch_err.is_config_error(),
            Error::Tree(tree_err) => matches!(
                tree_err,
                tree::TreeError::InvalidArgument { operation, .. } if operation == "config"
            ),
            _ => false,
        }
    }

    /// Check if this error was raised by a subscribed handler.
    pub fn is_handler_error(&self) -> bool {
        match self {
            Error::Dispatch(dispatch_err) => dispatch_err.is_handler_error(),
            _ => false,
        }
    }

    /// Check if this error is persistence-related.
    pub fn is_persist_error(&self) -> bool {
        matches!(self, Error::Persist(_))
    }

    /// Check if this error is I/O related.
    pub fn is_io_error(&self) -> bool {
        match self {
            Error::Io(_) => true,
            Error::Persist(persist_err) => persist_err.is_io_error(),
            _ => false,
        }
    }
}
