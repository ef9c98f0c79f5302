//! Map-like views into the state tree.

use std::{cmp::Ordering, fmt};

use handle_trait::Handle;

use crate::{Result, tree::TreeError};

use super::{Item, Map, Path, PathBuf, StateTree, Value};

/// A map-like view of one location in a [`StateTree`].
///
/// A `Node` is only a handle plus a path: reading through it always sees the
/// current tree content, and writing through it mutates the tree and notifies
/// subscribers of the mutated path. Nodes at paths that hold nothing yet act
/// as empty maps and spring into existence on first write.
#[derive(Clone)]
pub struct Node {
    tree: StateTree,
    path: PathBuf,
}

impl Node {
    pub(crate) fn new(tree: StateTree, path: PathBuf) -> Self {
        Self { tree, path }
    }

    /// Absolute dotted path of this node, e.g. `state.countries.AU`.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The last segment of this node's path.
    pub fn key(&self) -> Option<&str> {
        self.path.last()
    }

    /// The tree this node belongs to.
    pub fn tree(&self) -> &StateTree {
        &self.tree
    }

    /// Identity comparison: same tree and same path.
    ///
    /// Unlike `==`, which compares content, this tells whether two views
    /// address the same location.
    pub fn is_same(&self, other: &Node) -> bool {
        self.tree.ptr_eq(&other.tree) && self.path == other.path
    }

    /// Returns `true` if a map is currently stored at this path.
    pub fn exists(&self) -> bool {
        self.tree
            .inspect(&self.path, |found| matches!(found, Some(Value::Map(_))))
    }

    /// A node view of child `key`, regardless of what is stored there.
    pub fn child(&self, key: impl AsRef<str>) -> Node {
        Node::new(self.tree.handle(), self.path.child(key))
    }

    /// Read child `key`.
    ///
    /// Maps come back as [`Item::Node`], lists as [`Item::List`] and scalars
    /// as [`Item::Value`]. A missing key yields an empty node at
    /// `self.path.key`; nothing is stored until it is written to.
    pub fn get(&self, key: impl AsRef<str>) -> Item {
        self.tree.item_at(self.path.child(key))
    }

    /// Materialized copy of child `key`, or `None` if it is missing.
    pub fn get_value(&self, key: impl AsRef<str>) -> Option<Value> {
        let key = key.as_ref();
        self.tree
            .inspect(&self.path, |found| found.and_then(|v| v.child(key)).cloned())
    }

    /// Materialized copy of child `key`, or `default` if it is missing.
    pub fn get_or(&self, key: impl AsRef<str>, default: impl Into<Value>) -> Value {
        self.get_value(key).unwrap_or_else(|| default.into())
    }

    /// Returns `true` if child `key` is stored.
    pub fn contains_key(&self, key: impl AsRef<str>) -> bool {
        let key = key.as_ref();
        self.tree.inspect(&self.path, |found| {
            matches!(found, Some(Value::Map(map)) if map.contains_key(key))
        })
    }

    /// Stored keys, in sorted order.
    pub fn keys(&self) -> Vec<String> {
        self.tree.inspect(&self.path, |found| match found {
            Some(Value::Map(map)) => map.keys().cloned().collect(),
            _ => Vec::new(),
        })
    }

    /// Children wrapped as items, in key order.
    pub fn values(&self) -> Vec<Item> {
        self.keys().into_iter().map(|key| self.get(key)).collect()
    }

    /// `(key, item)` pairs in key order.
    pub fn items(&self) -> Vec<(String, Item)> {
        self.keys()
            .into_iter()
            .map(|key| {
                let item = self.get(&key);
                (key, item)
            })
            .collect()
    }

    /// Number of stored children.
    pub fn len(&self) -> usize {
        self.tree.inspect(&self.path, |found| match found {
            Some(Value::Map(map)) => map.len(),
            _ => 0,
        })
    }

    /// Returns `true` if nothing is stored below this node.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Store `value` under `key` and notify subscribers of `self.path.key`.
    ///
    /// Missing ancestors are created silently. Storing a [`Node`] stores a
    /// copy of its content.
    pub fn set(&self, key: impl AsRef<str>, value: impl Into<Value>) -> Result<()> {
        self.tree
            .write_key(&self.path, key.as_ref(), value.into(), true)
    }

    /// Store `value` under `key` without notifying anyone.
    pub fn set_silent(&self, key: impl AsRef<str>, value: impl Into<Value>) -> Result<()> {
        self.tree
            .write_key(&self.path, key.as_ref(), value.into(), false)
    }

    /// Remove `key`, returning its last value, and notify `self.path.key`.
    ///
    /// # Errors
    /// Returns [`TreeError::KeyNotFound`] if the key is not stored.
    pub fn delete(&self, key: impl AsRef<str>) -> Result<Value> {
        self.tree.delete_key(&self.path, key.as_ref())
    }

    /// Merge a map, or a list of `[key, value]` pairs, into this node.
    ///
    /// Only entries that differ from the current content are written, all
    /// silently. If at least one entry changed, subscribers of this node's
    /// own path are notified exactly once. Returns whether anything changed.
    ///
    /// # Errors
    /// Anything other than a map or a list of two-element pairs with text
    /// keys is rejected with [`TreeError::InvalidArgument`] before any
    /// mutation happens.
    pub fn update(&self, other: impl Into<Value>) -> Result<bool> {
        let entries = match other.into() {
            Value::Map(map) => map.into_iter().collect(),
            Value::List(pairs) => pairs
                .into_iter()
                .map(pair_entry)
                .collect::<Result<Vec<_>>>()?,
            other => {
                return Err(TreeError::InvalidArgument {
                    operation: "update".to_string(),
                    reason: format!(
                        "expected a map or a list of key/value pairs, got {}",
                        other.type_name()
                    ),
                }
                .into());
            }
        };
        self.tree.merge_keys(&self.path, entries)
    }

    /// Typed form of [`Node::update`] for key/value pairs.
    pub fn update_pairs<I, K, V>(&self, pairs: I) -> Result<bool>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        let entries = pairs
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        self.tree.merge_keys(&self.path, entries)
    }

    /// Store `default` under `key` unless the key is already present, then
    /// return the current item at `key`.
    pub fn setdefault(&self, key: impl AsRef<str>, default: impl Into<Value>) -> Result<Item> {
        let key = key.as_ref();
        if !self.contains_key(key) {
            self.set(key, default)?;
        }
        Ok(self.get(key))
    }

    /// Attribute-style read.
    ///
    /// Names starting with the private prefix read per-node private
    /// attributes, which are never part of [`Node::as_dict`] or snapshots
    /// (missing ones read as null). Any other name behaves like
    /// [`Node::get`].
    pub fn attr(&self, name: impl AsRef<str>) -> Item {
        let name = name.as_ref();
        if self.is_private(name) {
            Item::Value(self.tree.private_get(&self.path, name).unwrap_or_default())
        } else {
            self.get(name)
        }
    }

    /// Attribute-style write.
    ///
    /// Private names are stored on the node itself and notify
    /// `self.path.name`; other names behave like [`Node::set`].
    pub fn set_attr(&self, name: impl AsRef<str>, value: impl Into<Value>) -> Result<()> {
        let name = name.as_ref();
        if self.is_private(name) {
            self.tree.private_set(&self.path, name, value.into())
        } else {
            self.set(name, value)
        }
    }

    fn is_private(&self, name: &str) -> bool {
        name.starts_with(self.tree.config().private_prefix.as_str())
    }

    /// Materialize this node's stored content into plain data.
    pub fn as_dict(&self) -> Map {
        self.tree.inspect(&self.path, |found| match found {
            Some(Value::Map(map)) => map.clone(),
            _ => Map::new(),
        })
    }

    /// Like [`Node::as_dict`], but also includes private attributes of this
    /// node and its stored descendants.
    pub fn as_dict_full(&self) -> Map {
        let mut full = Value::Map(self.as_dict());
        let depth = self.path.len();
        for (owner, attrs) in self.tree.private_under(&self.path) {
            let mut target = Some(&mut full);
            for segment in owner.components().skip(depth) {
                target = target.and_then(|value| value.child_mut(segment));
            }
            if let Some(Value::Map(map)) = target {
                map.extend(attrs);
            }
        }
        match full {
            Value::Map(map) => map,
            _ => Map::new(),
        }
    }

    /// Notify subscribers of this node's path without changing anything.
    pub fn notify(&self) -> Result<()> {
        self.tree.notify(&self.path)
    }
}

/// Convert one `[key, value]` element of an update list.
fn pair_entry(pair: Value) -> Result<(String, Value)> {
    let invalid = |reason: String| -> crate::Error {
        TreeError::InvalidArgument {
            operation: "update".to_string(),
            reason,
        }
        .into()
    };
    let mut items = match pair {
        Value::List(items) => items,
        other => {
            return Err(invalid(format!(
                "expected a [key, value] pair, got {}",
                other.type_name()
            )));
        }
    };
    if items.len() != 2 {
        return Err(invalid(format!(
            "expected a [key, value] pair, got {} elements",
            items.len()
        )));
    }
    let value = items.pop().unwrap_or_default();
    match items.pop() {
        Some(Value::Text(key)) => Ok((key, value)),
        Some(other) => Err(invalid(format!(
            "pair keys must be text, got {}",
            other.type_name()
        ))),
        None => Err(invalid("empty pair".to_string())),
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("path", &self.path)
            .field("content", &self.as_dict_full())
            .finish()
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", Value::Map(self.as_dict_full()))
    }
}

/// Content equality: two nodes are equal when their stored content is.
impl PartialEq for Node {
    fn eq(&self, other: &Node) -> bool {
        self.as_dict() == other.as_dict()
    }
}

impl PartialEq<Value> for Node {
    fn eq(&self, other: &Value) -> bool {
        matches!(other, Value::Map(map) if *map == self.as_dict())
    }
}

impl PartialEq<Map> for Node {
    fn eq(&self, other: &Map) -> bool {
        self.as_dict() == *other
    }
}

/// Nodes carry no meaningful order; every pair compares as equal so that
/// sorting collections containing nodes never fails.
impl PartialOrd for Node {
    fn partial_cmp(&self, _other: &Node) -> Option<Ordering> {
        Some(Ordering::Equal)
    }
}

impl From<&Node> for Value {
    fn from(node: &Node) -> Self {
        Value::Map(node.as_dict())
    }
}

impl From<Node> for Value {
    fn from(node: Node) -> Self {
        Value::from(&node)
    }
}
