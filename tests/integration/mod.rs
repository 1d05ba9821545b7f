//! Integration tests for rolegate
//!
//! These tests verify the interaction between multiple components against
//! real in-memory stores, without mocking.

pub mod engine_tests;
pub mod hierarchy_tests;
pub mod routes_tests;
pub mod sync_tests;
