use appstate::{Item, StateTree, Value};

use crate::helpers::*;

#[test]
fn test_lists_read_as_node_lists() {
    let tree = StateTree::new();
    tree.set("countries", countries_fixture()).unwrap();

    let countries = tree.get("countries");
    let list = countries.as_list().expect("sequences read as lists");
    assert_eq!(list.len(), 2);
    assert_eq!(list.path().as_str(), "state.countries");

    let ids: Vec<Value> = list
        .iter()
        .map(|item| item.as_node().unwrap().get_or("id", Value::Null))
        .collect();
    assert_eq!(ids, vec![Value::from("AU"), Value::from("RU")]);
}

#[test]
fn test_writes_through_iterated_elements_reach_the_tree() {
    let tree = StateTree::new();
    tree.set("countries", countries_fixture()).unwrap();
    let watcher = counter(&tree, "state.countries");

    let countries = tree.get("countries");
    for item in countries.as_list().unwrap() {
        if let Item::Node(country) = item {
            country.set("seen", true).unwrap();
        }
    }

    assert_eq!(watcher.count(), 2);
    assert_eq!(tree.get("countries.0.seen"), true);
    assert_eq!(tree.get("countries.1.seen"), true);
}

#[test]
fn test_element_paths_overlap_the_list() {
    let tree = StateTree::new();
    tree.set("countries", countries_fixture()).unwrap();
    let element = Recorder::new();
    element.watch(&tree, "state.countries.0.questions", "countries.0.questions");

    let first = tree.get("countries.0");
    first
        .as_node()
        .unwrap()
        .set("questions", json(r#"[{"id": 2}]"#))
        .unwrap();
    // Replacing the whole list reaches element watchers too.
    tree.set("countries", Value::List(Vec::new())).unwrap();

    assert_eq!(element.count(), 2);
    assert_eq!(element.values()[0], json(r#"[{"id": 2}]"#));
}

#[test]
fn test_set_and_push_notify() {
    let tree = StateTree::new();
    tree.set("items", vec![1, 2]).unwrap();
    let list = tree.get("items").as_list().cloned().unwrap();
    let element = counter(&tree, "state.items.1");
    let whole = counter(&tree, "state.items");

    list.set(1, 20).unwrap();
    assert_eq!(element.count(), 1);
    assert_eq!(whole.count(), 1);

    assert_eq!(list.push(3).unwrap(), 3);
    assert_eq!(whole.count(), 2);
    // Pushing signals the list path, which overlaps every element.
    assert_eq!(element.count(), 2);

    assert_eq!(list, vec![Value::Int(1), Value::Int(20), Value::Int(3)]);
    let err = list.set(9, 0).unwrap_err();
    assert!(matches!(
        err,
        appstate::Error::Tree(appstate::tree::TreeError::IndexOutOfRange { index: 9, len: 3, .. })
    ));
}

#[test]
fn test_push_on_non_list_fails() {
    let tree = StateTree::new();
    tree.set("items", vec![1]).unwrap();
    let list = tree.get("items").as_list().cloned().unwrap();
    tree.set("items", "replaced").unwrap();
    let err = list.push(1).unwrap_err();
    assert!(err.is_type_error());
}

#[test]
fn test_remove_notifies_watchers_of_shifted_elements() {
    let tree = StateTree::new();
    tree.set("items", vec![10, 20, 30]).unwrap();
    let list = tree.get("items").as_list().cloned().unwrap();
    let last = Recorder::new();
    last.watch(&tree, "state.items.2", "items.2");
    let earlier = counter(&tree, "state.items.0");

    assert_eq!(list.remove(1).unwrap(), Value::Int(20));

    assert_eq!(list, vec![Value::Int(10), Value::Int(30)]);
    assert_eq!(last.count(), 1);
    // Element 0 did not move, but the list path overlaps it.
    assert_eq!(earlier.count(), 1);

    tree.delete("items.0").unwrap();
    assert_eq!(last.count(), 2);
    assert_eq!(tree.get("items"), Value::from(vec![30]));
}
