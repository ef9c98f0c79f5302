use std::sync::{Arc, Mutex};

use appstate::{HandlerToken, StateTree, Value};

/// Records every notification a handler receives, together with the value
/// it observed at the watched path.
#[derive(Clone, Default)]
pub struct Recorder {
    seen: Arc<Mutex<Vec<Value>>>,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe to `pattern` (absolute) and record the value at `read`
    /// (relative to the root) on each notification.
    pub fn watch(&self, tree: &StateTree, pattern: &str, read: &str) -> HandlerToken {
        let seen = Arc::clone(&self.seen);
        let read = read.to_string();
        tree.on(&[pattern], move |tree| {
            seen.lock().unwrap().push(tree.get(&read).into_value());
            Ok(())
        })
    }

    pub fn record(&self, value: Value) {
        self.seen.lock().unwrap().push(value);
    }

    pub fn count(&self) -> usize {
        self.seen.lock().unwrap().len()
    }

    pub fn values(&self) -> Vec<Value> {
        self.seen.lock().unwrap().clone()
    }

    pub fn clear(&self) {
        self.seen.lock().unwrap().clear();
    }
}

/// Count notifications on `pattern`.
pub fn counter(tree: &StateTree, pattern: &str) -> Recorder {
    let recorder = Recorder::new();
    recorder.watch(tree, pattern, "");
    recorder
}

/// The JSON document most tests build on.
pub fn countries_fixture() -> Value {
    serde_json::json!([
        {"id": "AU", "questions": [{"id": 1}]},
        {"id": "RU", "questions": []}
    ])
    .into()
}

/// Parse a JSON literal into a [`Value`].
pub fn json(text: &str) -> Value {
    serde_json::from_str(text).unwrap()
}
