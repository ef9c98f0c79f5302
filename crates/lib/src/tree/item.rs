//! The result of reading a field.

use std::fmt;

use super::{Node, NodeList, Value};

/// What a read through a [`Node`] or [`super::StateTree`] returns.
///
/// Maps are wrapped as [`Node`] views and lists as [`NodeList`] views so
/// that writes through them reach the tree. Scalars are returned by value.
#[derive(Debug, Clone, PartialEq)]
pub enum Item {
    Value(Value),
    Node(Node),
    List(NodeList),
}

impl Item {
    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Item::Value(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_node(&self) -> Option<&Node> {
        match self {
            Item::Node(node) => Some(node),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&NodeList> {
        match self {
            Item::List(list) => Some(list),
            _ => None,
        }
    }

    pub fn is_node(&self) -> bool {
        matches!(self, Item::Node(_))
    }

    pub fn is_list(&self) -> bool {
        matches!(self, Item::List(_))
    }

    /// Materialize into plain data.
    pub fn to_value(&self) -> Value {
        match self {
            Item::Value(value) => value.clone(),
            Item::Node(node) => Value::from(node),
            Item::List(list) => Value::from(list),
        }
    }

    /// Materialize into plain data, consuming the item.
    pub fn into_value(self) -> Value {
        match self {
            Item::Value(value) => value,
            other => other.to_value(),
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        self.as_value().and_then(Value::as_int)
    }

    pub fn as_text(&self) -> Option<&str> {
        self.as_value().and_then(Value::as_text)
    }

    pub fn as_bool(&self) -> Option<bool> {
        self.as_value().and_then(Value::as_bool)
    }
}

impl fmt::Display for Item {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Item::Value(value) => write!(f, "{value}"),
            Item::Node(node) => write!(f, "{node}"),
            Item::List(list) => write!(f, "{list}"),
        }
    }
}

impl From<Item> for Value {
    fn from(item: Item) -> Self {
        item.into_value()
    }
}

impl From<&Item> for Value {
    fn from(item: &Item) -> Self {
        item.to_value()
    }
}

impl PartialEq<Value> for Item {
    fn eq(&self, other: &Value) -> bool {
        match self {
            Item::Value(value) => value == other,
            Item::Node(node) => node == other,
            Item::List(list) => list == other,
        }
    }
}

impl PartialEq<i64> for Item {
    fn eq(&self, other: &i64) -> bool {
        self.as_int() == Some(*other)
    }
}

impl PartialEq<i32> for Item {
    fn eq(&self, other: &i32) -> bool {
        self.as_int() == Some(*other as i64)
    }
}

impl PartialEq<bool> for Item {
    fn eq(&self, other: &bool) -> bool {
        self.as_bool() == Some(*other)
    }
}

impl PartialEq<&str> for Item {
    fn eq(&self, other: &&str) -> bool {
        self.as_text() == Some(*other)
    }
}
