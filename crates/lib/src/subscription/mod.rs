//! Subscription registry.
//!
//! Maps dotted path patterns to the handlers subscribed under them. A
//! mutation at path `P` matches pattern `Q` when one of them is an ancestor
//! of (or equal to) the other at a segment boundary, so watching
//! `state.countries` reacts to `state.countries.AU.population`, and watching
//! `state.countries.AU.population` reacts to `state.countries` being replaced.

use std::{
    collections::BTreeMap,
    fmt,
    sync::{
        Arc, Mutex,
        atomic::{AtomicU64, Ordering},
    },
};

use crate::{
    dispatch::Handler,
    tree::{Path, PathBuf},
};

/// Identifies one `subscribe` call, for later removal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HandlerToken(u64);

impl fmt::Display for HandlerToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

struct Subscription {
    token: HandlerToken,
    handler: Arc<Handler>,
}

/// Pattern to handler registrations.
#[derive(Default)]
pub struct Registry {
    next_token: AtomicU64,
    patterns: Mutex<BTreeMap<PathBuf, Vec<Subscription>>>,
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("patterns", &self.patterns())
            .field("subscriptions", &self.len())
            .finish()
    }
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `handler` to the handler list of every pattern.
    ///
    /// Registration order within a pattern is delivery order. Subscribing
    /// the same handler twice under one pattern makes it fire twice.
    pub fn subscribe<I, P>(&self, patterns: I, handler: Handler) -> HandlerToken
    where
        I: IntoIterator<Item = P>,
        P: AsRef<str>,
    {
        let token = HandlerToken(self.next_token.fetch_add(1, Ordering::Relaxed));
        let handler = Arc::new(handler);
        let mut registered = self.patterns.lock().unwrap();
        for pattern in patterns {
            let pattern = PathBuf::normalize(pattern.as_ref());
            tracing::debug!(pattern = %pattern, handler = handler.name(), %token, "Subscribed");
            registered.entry(pattern).or_default().push(Subscription {
                token,
                handler: Arc::clone(&handler),
            });
        }
        token
    }

    /// Remove every registration made with `token`.
    ///
    /// Returns `false` if nothing was registered under it.
    pub fn unsubscribe(&self, token: HandlerToken) -> bool {
        let mut registered = self.patterns.lock().unwrap();
        let mut removed = false;
        registered.retain(|_, subscriptions| {
            let before = subscriptions.len();
            subscriptions.retain(|subscription| subscription.token != token);
            removed |= subscriptions.len() < before;
            !subscriptions.is_empty()
        });
        if removed {
            tracing::debug!(%token, "Unsubscribed");
        }
        removed
    }

    /// Snapshot of the handlers to deliver for a mutation at `path`.
    ///
    /// Patterns are visited in sorted order, handlers within a pattern in
    /// registration order. No deduplication happens across patterns.
    pub fn matching(&self, path: &Path) -> Vec<Arc<Handler>> {
        self.patterns
            .lock()
            .unwrap()
            .iter()
            .filter(|(pattern, _)| pattern.overlaps(path))
            .flat_map(|(_, subscriptions)| {
                subscriptions
                    .iter()
                    .map(|subscription| Arc::clone(&subscription.handler))
            })
            .collect()
    }

    pub fn contains(&self, token: HandlerToken) -> bool {
        self.patterns
            .lock()
            .unwrap()
            .values()
            .flatten()
            .any(|subscription| subscription.token == token)
    }

    /// Every pattern with at least one handler.
    pub fn patterns(&self) -> Vec<PathBuf> {
        self.patterns.lock().unwrap().keys().cloned().collect()
    }

    /// Number of (pattern, handler) registrations.
    pub fn len(&self) -> usize {
        self.patterns.lock().unwrap().values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
