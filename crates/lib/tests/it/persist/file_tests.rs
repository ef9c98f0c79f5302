use std::time::Duration;

use appstate::{MemoryStore, StateTree, Store, Value};

use crate::helpers::*;

#[test]
fn test_autopersist_then_reload_reproduces_structure() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("state.json");

    let tree = StateTree::new();
    tree.autopersist(&path, Duration::ZERO).unwrap();
    tree.set("countries", countries_fixture()).unwrap();

    tree.reset();
    assert!(tree.snapshot().is_empty());

    tree.reload(&path).unwrap();
    assert_eq!(tree.get("countries"), countries_fixture());
    assert_eq!(tree.get("countries.0.questions.0.id"), 1);
}

#[test]
fn test_snapshot_survives_a_new_tree() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("state.json");

    let writer = StateTree::new();
    writer.autopersist(&path, Duration::ZERO).unwrap();
    writer.set("user.name", "alice").unwrap();
    writer.teardown().unwrap();

    let reader = StateTree::new();
    let root = counter(&reader, "state");
    let name = counter(&reader, "state.user.name");
    reader.autopersist(&path, Duration::ZERO).unwrap();

    assert_eq!(reader.get("user.name"), "alice");
    // Loading is silent apart from one root notification.
    assert_eq!(root.count(), 1);
    assert_eq!(name.count(), 1);
}

#[test]
fn test_loading_merges_into_existing_content() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("state.json");
    std::fs::write(&path, r#"{"entries": {"state": {"saved": 1}}}"#).unwrap();

    let tree = StateTree::new();
    tree.set("local", 2).unwrap();
    tree.autopersist(&path, Duration::ZERO).unwrap();

    assert_eq!(tree.get("saved"), 1);
    assert_eq!(tree.get("local"), 2);
}

#[test]
fn test_sync_caller_flushes_immediately_despite_debounce() {
    let store = MemoryStore::new();
    let tree = StateTree::new();
    tree.autopersist_with(Box::new(store.reopen()), Duration::from_secs(3))
        .unwrap();

    tree.set("a", 1).unwrap();
    tree.set("b", 2).unwrap();

    assert_eq!(store.sync_count(), 2);
    let saved = store.contents().remove("state").unwrap();
    assert_eq!(saved, json(r#"{"a": 1, "b": 2}"#));
}

#[test]
fn test_private_attributes_are_not_persisted() {
    let store = MemoryStore::new();
    let tree = StateTree::new();
    tree.autopersist_with(Box::new(store.reopen()), Duration::ZERO)
        .unwrap();

    tree.set("screen.title", "Home").unwrap();
    tree.node("screen").set_attr("_scroll", 10).unwrap();

    let saved = store.contents().remove("state").unwrap();
    assert_eq!(saved, json(r#"{"screen": {"title": "Home"}}"#));
}

#[test]
fn test_stop_autopersist_and_teardown() {
    let store = MemoryStore::new();
    let tree = StateTree::new();
    tree.autopersist_with(Box::new(store.reopen()), Duration::ZERO)
        .unwrap();
    assert!(tree.is_persisting());

    tree.set("a", 1).unwrap();
    assert_eq!(store.sync_count(), 1);

    assert!(tree.stop_autopersist());
    tree.set("a", 2).unwrap();
    assert_eq!(store.sync_count(), 1);

    tree.teardown().unwrap();
    assert_eq!(store.sync_count(), 2);
    assert_eq!(
        store.contents().get("state"),
        Some(&json(r#"{"a": 2}"#))
    );

    let err = tree.flush().unwrap_err();
    assert!(err.is_persist_error());
}

#[test]
fn test_autopersist_again_replaces_the_handler() {
    let first = MemoryStore::new();
    let second = MemoryStore::new();
    let tree = StateTree::new();
    tree.autopersist_with(Box::new(first.reopen()), Duration::ZERO)
        .unwrap();
    tree.autopersist_with(Box::new(second.reopen()), Duration::ZERO)
        .unwrap();

    tree.set("a", 1).unwrap();
    assert_eq!(first.sync_count(), 0);
    assert_eq!(second.sync_count(), 1);
}

#[test]
fn test_reload_with_memory_store() {
    let store = MemoryStore::new();
    let tree = StateTree::new();
    tree.autopersist_with(Box::new(store.reopen()), Duration::ZERO)
        .unwrap();
    tree.set("kept", true).unwrap();

    tree.reset();
    let root = counter(&tree, "state");
    tree.reload_with(Box::new(store.reopen())).unwrap();

    assert_eq!(tree.get("kept"), true);
    assert_eq!(root.count(), 1);
}

#[test]
fn test_non_map_snapshot_is_rejected() {
    let mut store = MemoryStore::new();
    store.set("state", Value::from(3)).unwrap();

    let tree = StateTree::new();
    let err = tree
        .autopersist_with(Box::new(store.reopen()), Duration::ZERO)
        .unwrap_err();
    assert!(matches!(
        err,
        appstate::Error::Persist(appstate::persist::PersistError::InvalidSnapshot { .. })
    ));
}

#[test]
fn test_corrupt_file_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("state.json");
    std::fs::write(&path, "{not json").unwrap();

    let tree = StateTree::new();
    let err = tree.autopersist(&path, Duration::ZERO).unwrap_err();
    assert!(err.is_persist_error());
    assert!(!tree.is_persisting());
}
