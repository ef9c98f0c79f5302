//! Persistence integration tests
//!
//! Snapshot round trips through JSON files and debounced flushing.

mod file_tests;
