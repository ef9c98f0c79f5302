//! Subscription integration tests
//!
//! Pattern matching, fan-out order and re-entrant notification.
