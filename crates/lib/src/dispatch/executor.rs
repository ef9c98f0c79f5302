//! Where asynchronous work is spawned.

use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use tokio::runtime::Handle;

use super::errors::DispatchError;
use crate::Result;

/// How the executor finds a runtime to spawn onto.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutorMode {
    /// Spawn onto the tokio runtime the caller is running in.
    #[default]
    Ambient,
    /// Spawn onto a runtime handle supplied with
    /// [`crate::StateTree::set_task_group`].
    Supplied,
}

/// Spawns asynchronous handlers and delayed flushes.
#[derive(Debug)]
pub struct Executor {
    mode: ExecutorMode,
    task_group: Mutex<Option<Handle>>,
}

impl Executor {
    pub fn new(mode: ExecutorMode) -> Self {
        Self {
            mode,
            task_group: Mutex::new(None),
        }
    }

    pub fn set_task_group(&self, handle: Handle) {
        *self.task_group.lock().unwrap() = Some(handle);
    }

    pub fn clear_task_group(&self) -> Option<Handle> {
        self.task_group.lock().unwrap().take()
    }

    /// Returns `true` when the caller runs inside a tokio runtime.
    pub fn in_async_context() -> bool {
        Handle::try_current().is_ok()
    }

    /// Spawn `future` without waiting for it.
    ///
    /// `what` names the work in the error returned when no runtime is
    /// available.
    ///
    /// # Errors
    /// [`DispatchError::NoAsyncContext`] in ambient mode outside a runtime,
    /// [`DispatchError::MissingTaskGroup`] in supplied mode before a task
    /// group was set.
    pub fn spawn<F>(&self, what: &str, future: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let handle = match self.mode {
            ExecutorMode::Ambient => {
                Handle::try_current().map_err(|_| DispatchError::NoAsyncContext {
                    what: what.to_string(),
                })?
            }
            ExecutorMode::Supplied => self.task_group.lock().unwrap().clone().ok_or_else(|| {
                DispatchError::MissingTaskGroup {
                    what: what.to_string(),
                }
            })?,
        };
        handle.spawn(future);
        Ok(())
    }
}
