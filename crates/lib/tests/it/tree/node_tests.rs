use appstate::{Item, StateTree, TreeConfig, Value};

use crate::helpers::*;

#[test]
fn test_get_after_set_is_structurally_equal() {
    let tree = StateTree::new();
    let value = json(r#"{"AU": {"population": 26, "tags": ["a", "b"]}}"#);
    tree.set("countries", value.clone()).unwrap();

    assert_eq!(tree.get("countries"), value);
    assert_eq!(tree.get("countries.AU.population"), 26);
}

#[test]
fn test_deep_write_on_empty_tree_synthesizes_silently() {
    let tree = StateTree::new();
    let root = counter(&tree, "state");
    let countries = counter(&tree, "state.countries");
    let leaf = Recorder::new();
    leaf.watch(&tree, "state.countries.RU.data", "countries.RU.data");

    tree.root()
        .child("countries")
        .child("RU")
        .set("data", 3)
        .unwrap();

    assert_eq!(
        Value::Map(tree.snapshot()),
        json(r#"{"countries": {"RU": {"data": 3}}}"#)
    );
    // One notification each: only the leaf write signals.
    assert_eq!(root.count(), 1);
    assert_eq!(countries.count(), 1);
    assert_eq!(leaf.values(), vec![Value::Int(3)]);
}

#[test]
fn test_missing_key_yields_empty_unstored_node() {
    let tree = StateTree::new();
    let item = tree.get("nothing.here");
    let node = item.as_node().expect("missing paths read as nodes");
    assert!(node.is_empty());
    assert_eq!(node.path().as_str(), "state.nothing.here");
    assert!(tree.snapshot().is_empty());
}

#[test]
fn test_promotion_is_idempotent() {
    let tree = StateTree::new();
    tree.set("a.b", 1).unwrap();
    let first = tree.root().get("a");
    let second = tree.root().get("a");
    let (Item::Node(first), Item::Node(second)) = (first, second) else {
        panic!("maps read as nodes");
    };
    assert!(first.is_same(&second));
}

#[test]
fn test_none_then_map_fires_once_each() {
    let tree = StateTree::new();
    let watcher = Recorder::new();
    watcher.watch(&tree, "state.countries", "countries");

    tree.set("countries", Value::Null).unwrap();
    tree.set("countries", json(r#"{"AU": 4}"#)).unwrap();

    assert_eq!(watcher.values(), vec![Value::Null, json(r#"{"AU": 4}"#)]);
}

#[test]
fn test_scalar_in_the_way_is_replaced() {
    let tree = StateTree::new();
    tree.set("a", 1).unwrap();
    tree.set("a.b", 2).unwrap();
    assert_eq!(tree.get("a"), json(r#"{"b": 2}"#));
}

#[test]
fn test_storing_a_node_copies_it() {
    let tree = StateTree::new();
    tree.set("src.x", 1).unwrap();
    let src = tree.node("src");
    tree.set("dst", &src).unwrap();

    tree.set("src.x", 2).unwrap();
    assert_eq!(tree.get("dst.x"), 1);
    assert_eq!(tree.get("src.x"), 2);
}

#[test]
fn test_delete() {
    let tree = StateTree::new();
    tree.set("a.b", 1).unwrap();
    let watcher = counter(&tree, "state.a.b");

    assert_eq!(tree.delete("a.b").unwrap(), Value::Int(1));
    assert_eq!(watcher.count(), 1);
    assert!(!tree.node("a").contains_key("b"));

    let err = tree.delete("a.b").unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(watcher.count(), 1);
}

#[test]
fn test_set_silent_does_not_notify() {
    let tree = StateTree::new();
    let watcher = counter(&tree, "state");
    tree.set_silent("quiet", true).unwrap();
    assert_eq!(watcher.count(), 0);
    assert_eq!(tree.get("quiet"), true);
}

#[test]
fn test_setdefault() {
    let tree = StateTree::new();
    let watcher = counter(&tree, "state.prefs");
    let prefs = tree.node("prefs");

    assert_eq!(prefs.setdefault("theme", "dark").unwrap(), "dark");
    assert_eq!(prefs.setdefault("theme", "light").unwrap(), "dark");
    assert_eq!(watcher.count(), 1);
}

#[test]
fn test_read_helpers() {
    let tree = StateTree::new();
    tree.set("c", json(r#"{"b": 2, "a": {"x": 1}}"#)).unwrap();
    let node = tree.node("c");

    assert_eq!(node.keys(), vec!["a", "b"]);
    assert_eq!(node.len(), 2);
    assert!(node.contains_key("a"));
    assert_eq!(node.get_value("b"), Some(Value::Int(2)));
    assert_eq!(node.get_value("zzz"), None);
    assert_eq!(node.get_or("zzz", 9), Value::Int(9));

    let items = node.items();
    assert!(items[0].1.is_node());
    assert_eq!(items[1].1, 2);
    assert_eq!(node.values().len(), 2);
}

#[test]
fn test_private_attributes() {
    let tree = StateTree::new();
    let node = tree.node("screen");
    node.set("title", "Home").unwrap();
    let watcher = counter(&tree, "state.screen._cursor");

    node.set_attr("_cursor", 4).unwrap();
    assert_eq!(watcher.count(), 1);
    assert_eq!(node.attr("_cursor"), 4);
    assert_eq!(node.attr("title"), "Home");
    assert_eq!(node.attr("_missing"), Value::Null);

    assert!(!node.as_dict().contains_key("_cursor"));
    let full = tree.root().as_dict_full();
    let screen = full.get("screen").unwrap();
    assert_eq!(screen.child("_cursor"), Some(&Value::Int(4)));

    let snapshot = tree.snapshot();
    let stored = snapshot.get("screen").unwrap();
    assert!(stored.child("_cursor").is_none());
}

#[test]
fn test_replacing_a_subtree_drops_its_private_attributes() {
    let tree = StateTree::new();
    tree.set("screen.title", "Home").unwrap();
    tree.node("screen").set_attr("_cursor", 4).unwrap();

    tree.set("screen", json(r#"{"title": "Away"}"#)).unwrap();
    assert_eq!(tree.node("screen").attr("_cursor"), Value::Null);
}

#[test]
fn test_equality_and_ordering() {
    let tree = StateTree::new();
    tree.set("a", json(r#"{"x": 1}"#)).unwrap();
    tree.set("b", json(r#"{"x": 1}"#)).unwrap();
    tree.set("c", json(r#"{"x": 2}"#)).unwrap();

    assert_eq!(tree.node("a"), tree.node("b"));
    assert_ne!(tree.node("a"), tree.node("c"));
    assert_eq!(tree.node("a"), json(r#"{"x": 1}"#));
    assert!(!(tree.node("a") < tree.node("c")));
    assert!(tree.node("a") <= tree.node("c"));
}

#[test]
fn test_display_renders_json() {
    let tree = StateTree::new();
    tree.set("a.x", 1).unwrap();
    tree.node("a").set_attr("_p", "q").unwrap();
    assert_eq!(tree.node("a").to_string(), r#"{"_p":"q","x":1}"#);
}

#[test]
fn test_reset_clears_without_notifying() {
    let tree = StateTree::new();
    tree.set("a", 1).unwrap();
    let watcher = counter(&tree, "state");
    tree.reset();
    assert!(tree.snapshot().is_empty());
    assert_eq!(watcher.count(), 0);
}

#[test]
fn test_custom_root() {
    let tree = StateTree::with_config(TreeConfig::default().with_root("app")).unwrap();
    let watcher = counter(&tree, "app.user");
    tree.set("user.name", "x").unwrap();
    assert_eq!(watcher.count(), 1);
    assert_eq!(tree.root().path().as_str(), "app");
}

#[test]
fn test_invalid_keys_are_rejected() {
    let tree = StateTree::new();
    let err = tree.root().set("a.b", 1).unwrap_err();
    assert!(err.is_invalid_argument());
    let err = tree.root().set("", 1).unwrap_err();
    assert!(err.is_invalid_argument());
    assert!(tree.set("", 1).unwrap_err().is_invalid_argument());
}
