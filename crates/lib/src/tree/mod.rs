//! The observable state tree.
//!
//! [`StateTree`] owns the root of the tree, the subscription registry, the
//! live-instance registry used by method handlers, the executor used for
//! asynchronous work, and the persistence adapter. It is a cheap-to-clone
//! handle around `Arc<StateTreeInternal>`.
//!
//! Nested fields are reached through [`Node`] and [`NodeList`] views, which
//! know their own dotted path. Every write computes the fully-qualified path
//! of the mutated field and notifies the registry, which delivers to every
//! handler whose pattern is an ancestor or descendant of that path.
//!
//! ```
//! # use appstate::{StateTree, Value};
//! # fn main() -> appstate::Result<()> {
//! let tree = StateTree::new();
//! tree.on(&["state.countries"], |tree| {
//!     println!("countries changed to: {}", tree.root().child("countries"));
//!     Ok(())
//! });
//!
//! let countries = tree.root().child("countries");
//! countries.set("AU", Value::from_iter([("code", "AU")]))?;
//! countries.child("AU").set("population", 4_500_000)?;
//! # Ok(())
//! # }
//! ```

use std::{
    collections::HashMap,
    fmt,
    sync::{Arc, Mutex, RwLock},
};

use handle_trait::Handle;
use tokio::runtime::Handle as RuntimeHandle;

use crate::{
    Result,
    config::TreeConfig,
    dispatch::{Handler, HandlerFuture, InstanceRegistry, InstanceSet, executor::Executor},
    persist::Persistence,
    subscription::{HandlerToken, Registry},
};

pub mod errors;
pub mod item;
pub mod list;
pub mod node;
pub mod path;
pub mod value;

pub use errors::TreeError;
pub use item::Item;
pub use list::NodeList;
pub use node::Node;
pub use path::{Component, Path, PathBuf, PathError};
pub use value::{Map, Value};

/// Internal state for StateTree.
///
/// StateTree itself is just a cheap-to-clone handle wrapping
/// `Arc<StateTreeInternal>`.
pub(crate) struct StateTreeInternal {
    config: TreeConfig,
    /// Absolute path of the root node (the root sentinel segment)
    root_path: PathBuf,
    /// Tree content, always a `Value::Map`
    data: RwLock<Value>,
    /// Private attributes keyed by the path of the node they were set on
    private: Mutex<HashMap<PathBuf, Map>>,
    registry: Registry,
    instances: InstanceRegistry,
    executor: Executor,
    pub(crate) persistence: Persistence,
}

impl fmt::Debug for StateTreeInternal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateTreeInternal")
            .field("config", &self.config)
            .field("root_path", &self.root_path)
            .field("registry", &format!("<{} subscriptions>", self.registry.len()))
            .field("executor", &self.executor)
            .finish()
    }
}

/// An observable, path-addressed state tree.
///
/// Construct one at process start, pass clones (or [`Handle::handle`]) to the
/// components that need it, and call [`StateTree::teardown`] at shutdown to
/// flush and close the snapshot store.
#[derive(Clone, Debug, Handle)]
pub struct StateTree {
    pub(crate) inner: Arc<StateTreeInternal>,
}

impl Default for StateTree {
    fn default() -> Self {
        Self::new()
    }
}

impl StateTree {
    /// Create an empty tree with the default configuration.
    pub fn new() -> Self {
        Self::build(TreeConfig::default())
    }

    /// Create an empty tree with a custom configuration.
    ///
    /// # Errors
    /// Fails if the configured root name is not a single valid path component
    /// or the private prefix is empty.
    pub fn with_config(config: TreeConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::build(config))
    }

    fn build(config: TreeConfig) -> Self {
        let root_path = PathBuf::normalize(&config.root);
        let executor = Executor::new(config.executor);
        Self {
            inner: Arc::new(StateTreeInternal {
                config,
                root_path,
                data: RwLock::new(Value::map()),
                private: Mutex::new(HashMap::new()),
                registry: Registry::new(),
                instances: InstanceRegistry::new(),
                executor,
                persistence: Persistence::new(),
            }),
        }
    }

    /// The configuration this tree was built with.
    pub fn config(&self) -> &TreeConfig {
        &self.inner.config
    }

    /// Absolute path of the root node, e.g. `state`.
    pub fn root_path(&self) -> &Path {
        &self.inner.root_path
    }

    /// The root node.
    pub fn root(&self) -> Node {
        Node::new(self.handle(), self.inner.root_path.clone())
    }

    /// A node view at `path`, relative to the root.
    ///
    /// The node does not need to exist; it is created on first write.
    pub fn node(&self, path: impl AsRef<str>) -> Node {
        Node::new(self.handle(), self.absolute(path.as_ref()))
    }

    /// Returns `true` if both handles refer to the same tree.
    pub fn ptr_eq(&self, other: &StateTree) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    // === Path-addressed access ===

    /// Read the item at `path`, relative to the root.
    ///
    /// Missing paths yield an empty, auto-vivified node.
    pub fn get(&self, path: impl AsRef<str>) -> Item {
        let path = self.absolute(path.as_ref());
        self.item_at(path)
    }

    /// Write `value` at `path` (relative to the root) and notify subscribers.
    pub fn set(&self, path: impl AsRef<str>, value: impl Into<Value>) -> Result<()> {
        let (parent, key) = self.split_leaf(path.as_ref(), "set")?;
        self.write_key(&parent, &key, value.into(), true)
    }

    /// Write `value` at `path` (relative to the root) without notifying.
    pub fn set_silent(&self, path: impl AsRef<str>, value: impl Into<Value>) -> Result<()> {
        let (parent, key) = self.split_leaf(path.as_ref(), "set_silent")?;
        self.write_key(&parent, &key, value.into(), false)
    }

    /// Delete the value at `path` (relative to the root) and notify subscribers.
    pub fn delete(&self, path: impl AsRef<str>) -> Result<Value> {
        let (parent, key) = self.split_leaf(path.as_ref(), "delete")?;
        self.delete_key(&parent, &key)
    }

    /// The fully materialized root content.
    pub fn snapshot(&self) -> Map {
        match &*self.inner.data.read().unwrap() {
            Value::Map(map) => map.clone(),
            _ => Map::new(),
        }
    }

    /// Clear all content and private attributes without notifying anyone.
    ///
    /// Subscriptions and persistence settings are left untouched.
    pub fn reset(&self) {
        *self.inner.data.write().unwrap() = Value::map();
        self.inner.private.lock().unwrap().clear();
        tracing::debug!(root = %self.inner.root_path, "State tree reset");
    }

    // === Subscriptions ===

    /// Register `handler` under each of `patterns` (absolute dotted paths).
    pub fn subscribe<I, P>(&self, patterns: I, handler: Handler) -> HandlerToken
    where
        I: IntoIterator<Item = P>,
        P: AsRef<str>,
    {
        self.inner.registry.subscribe(patterns, handler)
    }

    /// Remove a handler from every pattern it was registered under.
    pub fn unsubscribe(&self, token: HandlerToken) -> bool {
        self.inner.registry.unsubscribe(token)
    }

    /// Register a synchronous function handler.
    pub fn on<F>(&self, patterns: &[&str], f: F) -> HandlerToken
    where
        F: Fn(&StateTree) -> Result<()> + Send + Sync + 'static,
    {
        let name = std::any::type_name::<F>();
        self.subscribe(patterns.iter().copied(), Handler::function(name, f))
    }

    /// Register an asynchronous function handler.
    ///
    /// The handler is spawned on the executor and never awaited by the
    /// mutation that triggered it.
    pub fn on_async<F, Fut>(&self, patterns: &[&str], f: F) -> HandlerToken
    where
        F: Fn(StateTree) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        let name = std::any::type_name::<F>();
        self.subscribe(patterns.iter().copied(), Handler::function_async(name, f))
    }

    /// Register a method handler for every live instance of `T`.
    ///
    /// The instance set for `T` is created here if it does not exist yet, so
    /// the handler can be declared before any instance is registered.
    pub fn on_method<T, F>(&self, patterns: &[&str], f: F) -> HandlerToken
    where
        T: Send + Sync + 'static,
        F: Fn(&T, &StateTree) -> Result<()> + Send + Sync + 'static,
    {
        let instances = self.instances::<T>();
        let name = std::any::type_name::<F>();
        self.subscribe(patterns.iter().copied(), Handler::method(name, instances, f))
    }

    /// Register an asynchronous method handler for every live instance of `T`.
    pub fn on_method_async<T, F>(&self, patterns: &[&str], f: F) -> HandlerToken
    where
        T: Send + Sync + 'static,
        F: Fn(Arc<T>, StateTree) -> HandlerFuture + Send + Sync + 'static,
    {
        let instances = self.instances::<T>();
        let name = std::any::type_name::<F>();
        self.subscribe(
            patterns.iter().copied(),
            Handler::method_async(name, instances, f),
        )
    }

    /// Notify every handler whose pattern overlaps `path` (absolute).
    ///
    /// Handlers are delivered from a snapshot of the registry, so they may
    /// mutate the tree or the registry re-entrantly. The first error returned
    /// by a synchronous handler aborts the remaining fan-out.
    pub fn notify(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let handlers = self.inner.registry.matching(path);
        tracing::debug!(path = %path, handlers = handlers.len(), "Notifying subscribers");
        for handler in handlers {
            handler.deliver(self)?;
        }
        Ok(())
    }

    // === Instances and execution context ===

    /// The live-instance set for `T`, created on first use.
    pub fn instances<T: Send + Sync + 'static>(&self) -> Arc<InstanceSet<T>> {
        self.inner.instances.set_for::<T>()
    }

    /// Start delivering method handlers of `T` to `instance`.
    ///
    /// The tree keeps only a weak reference; dropping the instance removes it.
    pub fn register_instance<T: Send + Sync + 'static>(&self, instance: &Arc<T>) -> bool {
        self.instances::<T>().register(instance)
    }

    /// Stop delivering method handlers of `T` to `instance`.
    pub fn deregister_instance<T: Send + Sync + 'static>(&self, instance: &Arc<T>) -> bool {
        self.instances::<T>().deregister(instance)
    }

    /// Supply the runtime that asynchronous handlers and delayed flushes are
    /// spawned onto when the executor runs in `Supplied` mode.
    pub fn set_task_group(&self, handle: RuntimeHandle) {
        self.inner.executor.set_task_group(handle);
    }

    /// Remove a previously supplied task group.
    pub fn clear_task_group(&self) -> Option<RuntimeHandle> {
        self.inner.executor.clear_task_group()
    }

    pub(crate) fn executor(&self) -> &Executor {
        &self.inner.executor
    }

    // === Internal read/write primitives used by Node and NodeList ===

    /// Resolve a root-relative path string into an absolute path.
    ///
    /// A leading root segment is not stripped: `countries` and
    /// `state.countries` address different places.
    fn absolute(&self, relative: &str) -> PathBuf {
        self.inner.root_path.clone().push(relative)
    }

    fn split_leaf(&self, relative: &str, operation: &str) -> Result<(PathBuf, String)> {
        let path = self.absolute(relative);
        match (path.parent(), path.last()) {
            (Some(parent), Some(key)) => Ok((parent.to_path_buf(), key.to_string())),
            _ => Err(TreeError::InvalidArgument {
                operation: operation.to_string(),
                reason: "the root itself cannot be addressed as a field".to_string(),
            }
            .into()),
        }
    }

    /// The path below the root, or an error if `path` is not inside this tree.
    fn relative<'p>(&self, path: &'p Path) -> Result<&'p Path> {
        if path.first() != self.inner.root_path.first() {
            return Err(TreeError::InvalidPath {
                path: path.to_string(),
                reason: format!("paths must start with '{}'", self.inner.root_path),
            }
            .into());
        }
        Ok(path.strip_first())
    }

    /// Run `f` against the value at `path`, if present.
    pub(crate) fn inspect<R>(&self, path: &Path, f: impl FnOnce(Option<&Value>) -> R) -> R {
        let data = self.inner.data.read().unwrap();
        let found = match self.relative(path) {
            Ok(relative) => descend(&data, relative),
            Err(_) => None,
        };
        f(found)
    }

    /// Wrap the value at `path` into an [`Item`].
    pub(crate) fn item_at(&self, path: PathBuf) -> Item {
        let kind = self.inspect(&path, |found| match found {
            Some(Value::Map(_)) | None => None,
            Some(Value::List(_)) => Some(None),
            Some(scalar) => Some(Some(scalar.clone())),
        });
        match kind {
            None => Item::Node(Node::new(self.handle(), path)),
            Some(None) => Item::List(NodeList::new(self.handle(), path)),
            Some(Some(scalar)) => Item::Value(scalar),
        }
    }

    /// Store `value` under `key` in the container at `container`.
    ///
    /// Missing containers along the way are synthesized silently; only the
    /// leaf write signals (when `signal` is set).
    pub(crate) fn write_key(
        &self,
        container: &Path,
        key: &str,
        value: Value,
        signal: bool,
    ) -> Result<()> {
        Component::new(key)?;
        let relative = self.relative(container)?;
        {
            let mut data = self.inner.data.write().unwrap();
            let target = descend_mut(&mut data, container, relative)?;
            store_child(target, container, key, value)?;
        }
        let path = container.child(key);
        self.forget_private_under(&path);
        if signal {
            self.notify(&path)?;
        }
        Ok(())
    }

    /// Merge `entries` into the container at `container`, signalling the
    /// container once if anything changed.
    pub(crate) fn merge_keys(&self, container: &Path, entries: Vec<(String, Value)>) -> Result<bool> {
        for (key, _) in &entries {
            Component::new(key.as_str()).map_err(|e| TreeError::InvalidArgument {
                operation: "update".to_string(),
                reason: e.to_string(),
            })?;
        }

        let changed: Vec<(String, Value)> = self.inspect(container, |found| {
            entries
                .into_iter()
                .filter(|(key, value)| {
                    found.and_then(|current| current.child(key)) != Some(value)
                })
                .collect()
        });

        if changed.is_empty() {
            tracing::trace!(path = %container, "Update left container unchanged");
            return Ok(false);
        }

        let relative = self.relative(container)?;
        let keys: Vec<PathBuf> = changed.iter().map(|(key, _)| container.child(key)).collect();
        {
            let mut data = self.inner.data.write().unwrap();
            let target = descend_mut(&mut data, container, relative)?;
            for (key, _) in &changed {
                child_index(target, container, key)?;
            }
            for (key, value) in changed {
                store_child(target, container, &key, value)?;
            }
        }
        for key in &keys {
            self.forget_private_under(key);
        }
        self.notify(container)?;
        Ok(true)
    }

    /// Remove `key` from the container at `container` and signal its path.
    ///
    /// Removing from a list shifts the later elements, so the whole list is
    /// signalled instead.
    pub(crate) fn delete_key(&self, container: &Path, key: &str) -> Result<Value> {
        let path = container.child(key);
        let relative = self.relative(container)?;
        let (removed, shifted_from) = {
            let mut data = self.inner.data.write().unwrap();
            let target = descend_existing_mut(&mut data, relative);
            match target {
                Some(Value::Map(map)) => (map.remove(key), None),
                Some(Value::List(list)) => match key.parse::<usize>() {
                    Ok(index) if index < list.len() => {
                        let len = list.len();
                        (Some(list.remove(index)), Some(index..len))
                    }
                    _ => (None, None),
                },
                _ => (None, None),
            }
        };
        let removed = removed.ok_or_else(|| TreeError::KeyNotFound {
            path: path.to_string(),
        })?;
        match shifted_from {
            Some(moved) => {
                for index in moved {
                    self.forget_private_under(&container.child(index.to_string()));
                }
                self.notify(container)?;
            }
            None => {
                self.forget_private_under(&path);
                self.notify(&path)?;
            }
        }
        Ok(removed)
    }

    /// Append `value` to the list at `path` and signal the list.
    pub(crate) fn push_item(&self, path: &Path, value: Value) -> Result<usize> {
        let relative = self.relative(path)?;
        let len = {
            let mut data = self.inner.data.write().unwrap();
            match descend_existing_mut(&mut data, relative) {
                Some(Value::List(list)) => {
                    list.push(value);
                    list.len()
                }
                Some(other) => {
                    return Err(TreeError::TypeMismatch {
                        path: path.to_string(),
                        expected: "list".to_string(),
                        actual: other.type_name().to_string(),
                    }
                    .into());
                }
                None => {
                    return Err(TreeError::KeyNotFound {
                        path: path.to_string(),
                    }
                    .into());
                }
            }
        };
        self.notify(path)?;
        Ok(len)
    }

    // === Private attributes ===

    pub(crate) fn private_get(&self, node: &Path, name: &str) -> Option<Value> {
        self.inner
            .private
            .lock()
            .unwrap()
            .get(node)
            .and_then(|attrs| attrs.get(name))
            .cloned()
    }

    pub(crate) fn private_set(&self, node: &Path, name: &str, value: Value) -> Result<()> {
        self.inner
            .private
            .lock()
            .unwrap()
            .entry(node.to_path_buf())
            .or_default()
            .insert(name.to_string(), value);
        self.notify(node.child(name))
    }

    /// Private attributes on `node` and its descendants, keyed by node path.
    pub(crate) fn private_under(&self, node: &Path) -> Vec<(PathBuf, Map)> {
        self.inner
            .private
            .lock()
            .unwrap()
            .iter()
            .filter(|(path, _)| node.is_ancestor_of(path))
            .map(|(path, attrs)| (path.clone(), attrs.clone()))
            .collect()
    }

    /// Drop private attributes of a subtree that was replaced or removed.
    fn forget_private_under(&self, path: &Path) {
        let mut private = self.inner.private.lock().unwrap();
        if !private.is_empty() {
            private.retain(|owner, _| !path.is_ancestor_of(owner));
        }
    }
}

/// Follow `relative` down from `root` without modifying anything.
fn descend<'a>(root: &'a Value, relative: &Path) -> Option<&'a Value> {
    relative
        .components()
        .try_fold(root, |current, segment| current.child(segment))
}

fn descend_existing_mut<'a>(root: &'a mut Value, relative: &Path) -> Option<&'a mut Value> {
    let mut current = root;
    for segment in relative.components() {
        current = current.child_mut(segment)?;
    }
    Some(current)
}

/// Follow `relative` down from `root`, synthesizing empty maps for missing
/// or non-container steps.
fn descend_mut<'a>(root: &'a mut Value, full: &Path, relative: &Path) -> Result<&'a mut Value> {
    let mut current = root;
    let mut synthesized = 0usize;
    for (depth, segment) in relative.components().enumerate() {
        current = match current {
            Value::Map(map) => {
                let slot = map.entry(segment.to_string()).or_insert(Value::Null);
                if !slot.is_branch() {
                    *slot = Value::map();
                    synthesized += 1;
                }
                slot
            }
            Value::List(list) => {
                let len = list.len();
                let index = segment.parse::<usize>().map_err(|_| TreeError::TypeMismatch {
                    path: prefix(full, depth + 1),
                    expected: "list index".to_string(),
                    actual: segment.to_string(),
                })?;
                let slot = list.get_mut(index).ok_or_else(|| TreeError::IndexOutOfRange {
                    path: prefix(full, depth + 1),
                    index,
                    len,
                })?;
                if !slot.is_branch() {
                    *slot = Value::map();
                    synthesized += 1;
                }
                slot
            }
            other => {
                return Err(TreeError::TypeMismatch {
                    path: prefix(full, depth + 1),
                    expected: "map or list".to_string(),
                    actual: other.type_name().to_string(),
                }
                .into());
            }
        };
    }
    if synthesized > 0 {
        tracing::debug!(path = %full, synthesized, "Created intermediate nodes silently");
    }
    Ok(current)
}

/// Check that `target` can take child `key`. Returns the element index for
/// lists and `None` for maps.
fn child_index(target: &Value, container: &Path, key: &str) -> Result<Option<usize>> {
    match target {
        Value::Map(_) => Ok(None),
        Value::List(list) => {
            let index = key.parse::<usize>().map_err(|_| TreeError::TypeMismatch {
                path: container.to_string(),
                expected: "map".to_string(),
                actual: "list".to_string(),
            })?;
            if index >= list.len() {
                return Err(TreeError::IndexOutOfRange {
                    path: container.to_string(),
                    index,
                    len: list.len(),
                }
                .into());
            }
            Ok(Some(index))
        }
        other => Err(TreeError::TypeMismatch {
            path: container.to_string(),
            expected: "map".to_string(),
            actual: other.type_name().to_string(),
        }
        .into()),
    }
}

/// Store `value` as child `key` of `target`, which must be a container.
fn store_child(target: &mut Value, container: &Path, key: &str, value: Value) -> Result<()> {
    let index = child_index(target, container, key)?;
    match (target, index) {
        (Value::Map(map), _) => {
            map.insert(key.to_string(), value);
        }
        (Value::List(list), Some(index)) => list[index] = value,
        // anything else was rejected by child_index
        _ => {}
    }
    Ok(())
}

/// The first `depth` components below the root of `full`, as a display string.
fn prefix(full: &Path, depth: usize) -> String {
    full.components()
        .take(depth + 1)
        .collect::<Vec<_>>()
        .join(".")
}
