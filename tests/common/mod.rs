//! Common test utilities for rolegate
//!
//! This module provides shared test infrastructure for all tests:
//! - In-memory SQLite database support
//! - Engine fixtures and failure-injecting store doubles
//! - Custom assertions and helpers

pub mod database;

// Re-export commonly used items
pub use database::TestDatabase;
pub use fixtures::{FlakyPolicyStore, FlakyRoleStore, test_engine};

/// Assert that a result is Ok and return the value
#[macro_export]
macro_rules! assert_ok {
    ($expr:expr) => {
        match $expr {
            Ok(v) => v,
            Err(e) => panic!("Expected Ok, got Err: {:?}", e),
        }
    };
}

/// Assert that a result is Err and return the error
#[macro_export]
macro_rules! assert_err {
    ($expr:expr) => {
        match $expr {
            Ok(v) => panic!("Expected Err, got Ok: {:?}", v),
            Err(e) => e,
        }
    };
}
