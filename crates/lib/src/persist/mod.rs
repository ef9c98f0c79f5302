//! Debounced persistence of the whole tree.
//!
//! [`StateTree::autopersist`] attaches a [`Store`] to the tree: the stored
//! snapshot (if any) is merged into the tree silently, subscribers of the
//! root are notified once, and a handler on the root path is installed that
//! writes the tree back after every change.
//!
//! With a non-zero debounce and a running tokio runtime, a change schedules
//! one delayed flush; further changes before it fires are coalesced into it,
//! and it snapshots the tree as it is when it fires. Outside a runtime, or
//! with a zero debounce, every change flushes immediately.

use std::{
    fmt,
    path::Path as FsPath,
    sync::{
        Mutex,
        atomic::{AtomicBool, Ordering},
    },
    time::Duration,
};

use handle_trait::Handle;

use crate::{
    Result, StateTree, constants,
    dispatch::{Handler, executor::Executor},
    subscription::HandlerToken,
    tree::Value,
};

pub mod errors;
pub mod store;

pub use errors::PersistError;
pub use store::{JsonFileStore, MemoryStore, Store};

#[derive(Default)]
struct PersistState {
    store: Option<Box<dyn Store>>,
    handler: Option<HandlerToken>,
    debounce: Duration,
}

/// Persistence state of one tree.
#[derive(Default)]
pub(crate) struct Persistence {
    state: Mutex<PersistState>,
    /// Set while a delayed flush is scheduled and has not fired yet
    flush_pending: AtomicBool,
}

impl fmt::Debug for Persistence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock().unwrap();
        f.debug_struct("Persistence")
            .field("store", &state.store.as_ref().map(|s| s.describe()))
            .field("handler", &state.handler)
            .field("debounce", &state.debounce)
            .field("flush_pending", &self.flush_pending.load(Ordering::Acquire))
            .finish()
    }
}

impl Persistence {
    pub(crate) fn new() -> Self {
        Self::default()
    }
}

impl StateTree {
    /// Persist the tree to the JSON file at `path`.
    ///
    /// Loads the file's snapshot into the tree silently, notifies root
    /// subscribers once, then flushes after every change, debounced by
    /// `debounce`. Calling it again replaces the previous store and handler.
    pub fn autopersist(&self, path: impl AsRef<FsPath>, debounce: Duration) -> Result<()> {
        self.close_store()?;
        let store = JsonFileStore::open(path.as_ref())?;
        self.autopersist_with(Box::new(store), debounce)
    }

    /// Like [`StateTree::autopersist`], with the debounce from the tree's
    /// configuration.
    pub fn persist_to(&self, path: impl AsRef<FsPath>) -> Result<()> {
        let debounce = self.config().debounce();
        self.autopersist(path, debounce)
    }

    /// Like [`StateTree::autopersist`], for any store.
    pub fn autopersist_with(&self, store: Box<dyn Store>, debounce: Duration) -> Result<()> {
        self.stop_autopersist();
        self.attach_store(store, debounce)?;
        self.notify(self.root_path())?;

        let token = self.subscribe(
            [self.root_path().as_str()],
            Handler::function(constants::PERSIST_HANDLER, |tree: &StateTree| {
                tree.persist_changes()
            }),
        );
        self.inner.persistence.state.lock().unwrap().handler = Some(token);
        tracing::debug!(?debounce, "Autopersist enabled");
        Ok(())
    }

    /// Close the attached store, reopen the JSON file at `path` and load it
    /// like [`StateTree::autopersist`] does, notifying root subscribers once.
    ///
    /// The persistence handler, if any, stays installed.
    pub fn reload(&self, path: impl AsRef<FsPath>) -> Result<()> {
        self.close_store()?;
        let store = JsonFileStore::open(path.as_ref())?;
        self.reload_with(Box::new(store))
    }

    /// Like [`StateTree::reload`], for any store.
    pub fn reload_with(&self, store: Box<dyn Store>) -> Result<()> {
        let debounce = self.inner.persistence.state.lock().unwrap().debounce;
        self.attach_store(store, debounce)?;
        self.notify(self.root_path())
    }

    /// Write the current snapshot to the attached store and sync it.
    ///
    /// # Errors
    /// [`PersistError::NotPersisting`] if no store is attached.
    pub fn flush(&self) -> Result<()> {
        if self.flush_if_attached()? {
            Ok(())
        } else {
            Err(PersistError::NotPersisting.into())
        }
    }

    /// Remove the persistence handler. The store stays attached.
    ///
    /// Returns `false` if autopersist was not enabled.
    pub fn stop_autopersist(&self) -> bool {
        let token = self.inner.persistence.state.lock().unwrap().handler.take();
        match token {
            Some(token) => {
                self.unsubscribe(token);
                tracing::debug!("Autopersist disabled");
                true
            }
            None => false,
        }
    }

    /// Returns `true` while the persistence handler is installed.
    pub fn is_persisting(&self) -> bool {
        self.inner.persistence.state.lock().unwrap().handler.is_some()
    }

    /// Shut down persistence: remove the handler, flush and close the store.
    pub fn teardown(&self) -> Result<()> {
        self.stop_autopersist();
        self.flush_if_attached()?;
        self.close_store()?;
        tracing::info!(root = %self.root_path(), "State tree torn down");
        Ok(())
    }

    /// Merge the snapshot held by `store` into the tree silently and make it
    /// the attached store.
    fn attach_store(&self, mut store: Box<dyn Store>, debounce: Duration) -> Result<()> {
        self.close_store()?;

        let key = self.config().snapshot_key.clone();
        let snapshot = match store.get(&key)? {
            None => Default::default(),
            Some(Value::Map(map)) => map,
            Some(other) => {
                return Err(PersistError::InvalidSnapshot {
                    key,
                    actual: other.type_name().to_string(),
                }
                .into());
            }
        };

        let count = snapshot.len();
        let root = self.root();
        for (k, v) in snapshot {
            root.set_silent(&k, v)?;
        }
        tracing::info!(store = %store.describe(), keys = count, "Loaded state snapshot");

        let mut state = self.inner.persistence.state.lock().unwrap();
        state.store = Some(store);
        state.debounce = debounce;
        Ok(())
    }

    /// Close and detach the store, if any.
    fn close_store(&self) -> Result<()> {
        let store = self.inner.persistence.state.lock().unwrap().store.take();
        if let Some(mut store) = store {
            store.close()?;
            tracing::debug!(store = %store.describe(), "Closed state store");
        }
        Ok(())
    }

    /// Body of the persistence handler.
    fn persist_changes(&self) -> Result<()> {
        let debounce = self.inner.persistence.state.lock().unwrap().debounce;
        if debounce.is_zero() || !Executor::in_async_context() {
            self.flush_if_attached()?;
            return Ok(());
        }

        let pending = &self.inner.persistence.flush_pending;
        if pending
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            tracing::debug!("Flush already scheduled, coalescing");
            return Ok(());
        }

        // Dropping the guard clears the flag, also when the task never runs
        // or is cancelled while it sleeps.
        let guard = PendingFlush {
            tree: self.handle(),
        };
        self.executor().spawn("delayed flush", async move {
            tokio::time::sleep(debounce).await;
            let tree = guard.tree.handle();
            drop(guard);
            if let Err(e) = tree.flush_if_attached() {
                tracing::error!("Delayed state flush failed: {e}");
            }
        })
    }

    /// Flush to the attached store. Returns `false` when none is attached.
    fn flush_if_attached(&self) -> Result<bool> {
        let snapshot = Value::Map(self.snapshot());
        let key = self.config().snapshot_key.clone();

        let mut state = self.inner.persistence.state.lock().unwrap();
        let Some(store) = state.store.as_mut() else {
            return Ok(false);
        };
        if tracing::enabled!(tracing::Level::DEBUG) {
            let preview = preview_entries(&snapshot);
            tracing::debug!(store = %store.describe(), "Saving state:\n{preview}");
        }
        store.set(&key, snapshot)?;
        store.sync()?;
        Ok(true)
    }
}

/// Marks a scheduled flush of `tree` until dropped.
struct PendingFlush {
    tree: StateTree,
}

impl Drop for PendingFlush {
    fn drop(&mut self) {
        self.tree
            .inner
            .persistence
            .flush_pending
            .store(false, Ordering::Release);
    }
}

/// One line per top-level key, each shortened for logging.
fn preview_entries(snapshot: &Value) -> String {
    match snapshot {
        Value::Map(map) => map
            .iter()
            .map(|(k, v)| shorten(&format!("{k}: {v}"), constants::PREVIEW_WIDTH))
            .collect::<Vec<_>>()
            .join("\n"),
        other => shorten(&other.to_string(), constants::PREVIEW_WIDTH),
    }
}

/// Collapse whitespace and cut `text` to at most `width` characters.
fn shorten(text: &str, width: usize) -> String {
    const PLACEHOLDER: &str = " [...]";
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.chars().count() <= width {
        return collapsed;
    }
    let keep = width.saturating_sub(PLACEHOLDER.len());
    let mut cut: String = collapsed.chars().take(keep).collect();
    cut.push_str(PLACEHOLDER);
    cut
}
