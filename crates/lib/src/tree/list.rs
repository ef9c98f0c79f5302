//! List views into the state tree.

use std::fmt;

use crate::Result;

use super::{Item, Path, PathBuf, StateTree, Value};

/// A view of a list stored in a [`StateTree`].
///
/// Elements are addressed by their index, so a map element of the list at
/// `state.countries` is the node `state.countries.0`. Writes through element
/// nodes mutate the stored list in place and notify the element path, which
/// overlaps the list's own path.
#[derive(Clone)]
pub struct NodeList {
    tree: StateTree,
    path: PathBuf,
}

impl NodeList {
    pub(crate) fn new(tree: StateTree, path: PathBuf) -> Self {
        Self { tree, path }
    }

    /// Absolute dotted path of the list.
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.tree.inspect(&self.path, |found| match found {
            Some(Value::List(list)) => list.len(),
            _ => 0,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The element at `index`, wrapped like [`super::Node::get`] wraps
    /// children. `None` if the index is past the end.
    pub fn get(&self, index: usize) -> Option<Item> {
        (index < self.len()).then(|| self.tree.item_at(self.path.child(index.to_string())))
    }

    /// All elements as items, in order.
    ///
    /// The length is read once; elements are wrapped from the content
    /// current at the time of the call.
    pub fn iter(&self) -> std::vec::IntoIter<Item> {
        (0..self.len())
            .map(|index| self.tree.item_at(self.path.child(index.to_string())))
            .collect::<Vec<_>>()
            .into_iter()
    }

    /// Replace the element at `index` and notify its path.
    ///
    /// # Errors
    /// Returns [`super::TreeError::IndexOutOfRange`] past the end.
    pub fn set(&self, index: usize, value: impl Into<Value>) -> Result<()> {
        self.tree
            .write_key(&self.path, &index.to_string(), value.into(), true)
    }

    /// Append `value` and notify the list path. Returns the new length.
    pub fn push(&self, value: impl Into<Value>) -> Result<usize> {
        self.tree.push_item(&self.path, value.into())
    }

    /// Remove the element at `index` and notify the list path, since every
    /// later element moves down.
    pub fn remove(&self, index: usize) -> Result<Value> {
        self.tree.delete_key(&self.path, &index.to_string())
    }

    /// Materialized copy of the list.
    pub fn as_list(&self) -> Vec<Value> {
        self.tree.inspect(&self.path, |found| match found {
            Some(Value::List(list)) => list.clone(),
            _ => Vec::new(),
        })
    }
}

impl IntoIterator for &NodeList {
    type Item = Item;
    type IntoIter = std::vec::IntoIter<Item>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl fmt::Debug for NodeList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeList")
            .field("path", &self.path)
            .field("content", &self.as_list())
            .finish()
    }
}

impl fmt::Display for NodeList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", Value::List(self.as_list()))
    }
}

impl PartialEq for NodeList {
    fn eq(&self, other: &NodeList) -> bool {
        self.as_list() == other.as_list()
    }
}

impl PartialEq<Value> for NodeList {
    fn eq(&self, other: &Value) -> bool {
        matches!(other, Value::List(list) if *list == self.as_list())
    }
}

impl PartialEq<Vec<Value>> for NodeList {
    fn eq(&self, other: &Vec<Value>) -> bool {
        self.as_list() == *other
    }
}

impl From<&NodeList> for Value {
    fn from(list: &NodeList) -> Self {
        Value::List(list.as_list())
    }
}

impl From<NodeList> for Value {
    fn from(list: NodeList) -> Self {
        Value::from(&list)
    }
}
