/*! Integration tests for appstate.
 *
 * This test suite is organized as a single integration test binary
 * following the pattern described by matklad in
 * https://matklad.github.io/2021/02/27/delete-cargo-integration-tests.html
 *
 * The module structure mirrors the main library structure:
 * - tree: Reads, writes, updates and views (Node, NodeList, Item)
 * - subscription: Pattern matching and notification fan-out
 * - dispatch: Function and method handlers, async delivery, executors
 * - persist: Autopersist, reload, debouncing and teardown
 * - binding: Property binding
 */

use tracing_subscriber::EnvFilter;

#[ctor::ctor]
fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("appstate=info".parse().unwrap()),
        )
        .with_test_writer()
        .try_init();
}

mod binding;
mod dispatch;
mod helpers;
mod persist;
mod subscription;
