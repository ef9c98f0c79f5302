//! Dispatch integration tests
//!
//! Method fan-out over live instances and asynchronous delivery.

mod async_tests;
