use appstate::{StateTree, Value};

use crate::helpers::*;

#[test]
fn test_update_notifies_container_once() {
    let tree = StateTree::new();
    tree.set("population.RU", 5).unwrap();
    let container = counter(&tree, "state.population");
    let leaf = counter(&tree, "state.population.US");

    let changed = tree
        .node("population")
        .update(json(r#"{"RU": 6, "US": 8}"#))
        .unwrap();

    assert!(changed);
    assert_eq!(container.count(), 1);
    // The container path overlaps the leaf pattern as its ancestor.
    assert_eq!(leaf.count(), 1);
    assert_eq!(tree.get("population"), json(r#"{"RU": 6, "US": 8}"#));
}

#[test]
fn test_update_without_changes_is_silent() {
    let tree = StateTree::new();
    tree.set("population", json(r#"{"RU": 5}"#)).unwrap();
    let container = counter(&tree, "state.population");

    let changed = tree.node("population").update(json(r#"{"RU": 5}"#)).unwrap();
    assert!(!changed);
    assert_eq!(container.count(), 0);
}

#[test]
fn test_update_accepts_pairs() {
    let tree = StateTree::new();
    let node = tree.node("pairs");
    assert!(node.update(json(r#"[["a", 1], ["b", {"c": 2}]]"#)).unwrap());
    assert_eq!(tree.get("pairs.b.c"), 2);

    assert!(node.update_pairs([("a", 3)]).unwrap());
    assert_eq!(tree.get("pairs.a"), 3);
}

#[test]
fn test_malformed_update_mutates_nothing() {
    let tree = StateTree::new();
    let watcher = counter(&tree, "state");
    let node = tree.node("target");

    for bad in [
        Value::from(3),
        Value::from("text"),
        json(r#"[["a", 1], ["b"]]"#),
        json(r#"[[1, 2]]"#),
        json(r#"[["ok", 1], "loose"]"#),
    ] {
        let err = node.update(bad).unwrap_err();
        assert!(err.is_invalid_argument(), "{err}");
    }

    let err = node.update_pairs([("bad.key", 1)]).unwrap_err();
    assert!(err.is_invalid_argument());

    assert!(tree.snapshot().is_empty());
    assert_eq!(watcher.count(), 0);
}

#[test]
fn test_update_creates_missing_container_silently() {
    let tree = StateTree::new();
    let watcher = counter(&tree, "state.a");
    tree.node("a.b").update(json(r#"{"c": 1}"#)).unwrap();
    assert_eq!(watcher.count(), 1);
    assert_eq!(tree.get("a.b.c"), 1);
}

#[test]
fn test_update_on_list_with_bad_index_writes_nothing() {
    let tree = StateTree::new();
    tree.set("items", vec![1, 2]).unwrap();
    let watcher = counter(&tree, "state.items");
    let node = tree.node("items");

    let err = node.update(json(r#"{"0": 5, "9": 1}"#)).unwrap_err();
    assert!(matches!(
        err,
        appstate::Error::Tree(appstate::tree::TreeError::IndexOutOfRange { index: 9, .. })
    ));
    let err = node.update(json(r#"{"0": 5, "x": 1}"#)).unwrap_err();
    assert!(err.is_type_error(), "{err}");

    assert_eq!(tree.get("items"), Value::from(vec![1, 2]));
    assert_eq!(watcher.count(), 0);

    assert!(node.update(json(r#"{"1": 7}"#)).unwrap());
    assert_eq!(tree.get("items"), Value::from(vec![1, 7]));
    assert_eq!(watcher.count(), 1);
}

#[test]
fn test_update_treats_equal_numbers_as_unchanged() {
    let tree = StateTree::new();
    tree.set("stats", json(r#"{"x": 1, "y": 2.5}"#)).unwrap();
    let watcher = counter(&tree, "state.stats");

    let changed = tree.node("stats").update(json(r#"{"x": 1.0, "y": 2.5}"#)).unwrap();
    assert!(!changed);
    assert_eq!(watcher.count(), 0);
}
