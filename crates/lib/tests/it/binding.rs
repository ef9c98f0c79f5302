use appstate::{Binding, StateTree};

use crate::helpers::*;

#[test]
fn test_fbind_watches_one_property() {
    let tree = StateTree::new();
    let binding = Binding::new(&tree);
    let recorder = Recorder::new();
    let seen = recorder.clone();
    let user = tree.node("user");

    binding.fbind(&user, "name", move |tree| {
        seen.record(tree.get("user.name").into_value());
        Ok(())
    });

    user.set("name", "alice").unwrap();
    user.set("email", "a@example.com").unwrap();
    // Replacing the parent reaches the bound property as well.
    tree.set("user", json(r#"{"name": "bob"}"#)).unwrap();

    assert_eq!(recorder.values(), vec![json(r#""alice""#), json(r#""bob""#)]);
}

#[test]
fn test_unbind_all() {
    let tree = StateTree::new();
    let binding = Binding::new(&tree);
    let recorder = Recorder::new();
    for name in ["a", "b", "c"] {
        let seen = recorder.clone();
        binding.fbind(&tree.root(), name, move |_| {
            seen.record(appstate::Value::Null);
            Ok(())
        });
    }

    assert_eq!(binding.unbind_all(), 3);
    assert!(binding.is_empty());
    tree.set("a", 1).unwrap();
    assert_eq!(recorder.count(), 0);
}
