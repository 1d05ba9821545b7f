//! Policy and role domain model
//!
//! The vocabulary shared by every subsystem: role kinds and naming rules,
//! the policy/grouping tuple grammar, and the matching rule applied during
//! enforcement.

pub mod matcher;
pub mod role;
pub mod tuple;

// Re-export commonly used types for convenience
pub use matcher::{action_match, domain_match, key_match};
pub use role::{
    ADMINISTRATOR_ROLE, DEFAULT_ROLE_SENIORITY, INTERNAL_ROLE_PREFIX, InternalAction, RoleKind,
    RoleStatus, SeniorityOrder, internal_role_code, is_internal_code, validate_business_code,
};
pub use tuple::{AccessRequest, GroupingTuple, PolicySet, PolicyTuple};
