//! R-Tree integration test module.
//!
//! These tests drive the public API end to end and check every answer
//! against a linear scan over the inserted boxes.

mod property_test;
mod scenario_test;
mod shared_test;
