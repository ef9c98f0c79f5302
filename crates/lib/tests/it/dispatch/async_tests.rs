use std::{sync::Arc, time::Duration};

use appstate::{ExecutorMode, StateTree, TreeConfig};
use tokio::sync::mpsc;

#[tokio::test]
async fn test_async_handler_is_spawned_not_awaited() {
    let tree = StateTree::new();
    let (tx, mut rx) = mpsc::unbounded_channel();
    tree.on_async(&["state.user"], move |tree| {
        let tx = tx.clone();
        async move {
            tokio::task::yield_now().await;
            let _ = tx.send(tree.get("user.name").into_value());
            Ok(())
        }
    });

    tree.set("user.name", "alice").unwrap();
    // set returns before the handler ran
    assert!(rx.try_recv().is_err());

    let seen = tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(seen, "alice");
}

#[test]
fn test_async_handler_without_runtime_is_config_error() {
    let tree = StateTree::new();
    tree.on_async(&["state.a"], |_tree| async { Ok(()) });
    let err = tree.set("a", 1).unwrap_err();
    assert!(err.is_config_error());
}

#[test]
fn test_supplied_executor_requires_task_group() {
    let config = TreeConfig::default().with_executor(ExecutorMode::Supplied);
    let tree = StateTree::with_config(config).unwrap();
    let (tx, rx) = std::sync::mpsc::channel();
    tree.on_async(&["state.a"], move |_tree| {
        let tx = tx.clone();
        async move {
            let _ = tx.send(());
            Ok(())
        }
    });

    let err = tree.set("a", 1).unwrap_err();
    assert!(matches!(
        err,
        appstate::Error::Dispatch(appstate::dispatch::DispatchError::MissingTaskGroup { .. })
    ));

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(1)
        .enable_all()
        .build()
        .unwrap();
    tree.set_task_group(runtime.handle().clone());
    tree.set("a", 2).unwrap();
    rx.recv_timeout(Duration::from_secs(5)).unwrap();
}

struct Inbox {
    tx: mpsc::UnboundedSender<&'static str>,
}

#[tokio::test]
async fn test_async_method_runs_per_instance() {
    let tree = StateTree::new();
    tree.on_method_async(&["state.inbox"], |inbox: Arc<Inbox>, _tree| {
        Box::pin(async move {
            let _ = inbox.tx.send("delivered");
            Ok::<(), appstate::Error>(())
        })
    });

    let (tx, mut rx) = mpsc::unbounded_channel();
    let a = Arc::new(Inbox { tx: tx.clone() });
    let b = Arc::new(Inbox { tx });
    tree.register_instance(&a);
    tree.register_instance(&b);

    tree.set("inbox.count", 1).unwrap();

    for _ in 0..2 {
        let msg = tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .unwrap();
        assert_eq!(msg, Some("delivered"));
    }
}

#[tokio::test]
async fn test_failing_async_handler_is_logged_not_raised() {
    let tree = StateTree::new();
    tree.on_async(&["state.a"], |tree| async move { tree.delete("missing").map(|_| ()) });
    tree.set("a", 1).unwrap();
    tokio::task::yield_now().await;
    assert_eq!(tree.get("a"), 1);
}
