//! Utility modules for the authorization engine
//!
//! Shared plumbing that does not belong to any one subsystem: the error
//! taxonomy and small logging helpers.

pub mod error;
pub mod logging;

// Re-export commonly used types for convenience
pub use error::{AuthzError, Result};
pub use logging::sanitize_url;
