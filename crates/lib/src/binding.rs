//! Property binding for UI layers.
//!
//! A [`Binding`] groups the callbacks a view registers on individual node
//! properties so they can be released together when the view goes away.

use std::sync::Mutex;

use handle_trait::Handle;

use crate::{Handler, HandlerToken, Node, Result, StateTree};

/// A set of property callbacks registered on one tree.
///
/// Dropping the binding unsubscribes every callback it registered.
#[derive(Debug)]
pub struct Binding {
    tree: StateTree,
    tokens: Mutex<Vec<HandlerToken>>,
}

impl Binding {
    pub fn new(tree: &StateTree) -> Self {
        Self {
            tree: tree.handle(),
            tokens: Mutex::new(Vec::new()),
        }
    }

    /// Call `callback` whenever property `name` of `node` changes, or any
    /// ancestor or descendant of it does.
    pub fn fbind<F>(&self, node: &Node, name: &str, callback: F) -> HandlerToken
    where
        F: Fn(&StateTree) -> Result<()> + Send + Sync + 'static,
    {
        let path = node.path().child(name);
        let token = self.tree.subscribe(
            [path.as_str()],
            Handler::function(format!("bind:{path}"), callback),
        );
        tracing::debug!(path = %path, %token, "Bound property");
        self.tokens.lock().unwrap().push(token);
        token
    }

    /// Release one callback registered with [`Binding::fbind`].
    pub fn funbind(&self, token: HandlerToken) -> bool {
        let mut tokens = self.tokens.lock().unwrap();
        let Some(position) = tokens.iter().position(|t| *t == token) else {
            return false;
        };
        tokens.remove(position);
        self.tree.unsubscribe(token)
    }

    /// Release every callback. Returns how many were released.
    pub fn unbind_all(&self) -> usize {
        let tokens = std::mem::take(&mut *self.tokens.lock().unwrap());
        tokens
            .into_iter()
            .filter(|token| self.tree.unsubscribe(*token))
            .count()
    }

    pub fn len(&self) -> usize {
        self.tokens.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Drop for Binding {
    fn drop(&mut self) {
        let released = self.unbind_all();
        if released > 0 {
            tracing::debug!(released, "Binding dropped");
        }
    }
}
