//! Storage layer for the authorization engine
//!
//! Two stores with very different jobs: the policy store is a replicated,
//! fast projection of tuples shared by every engine replica; the hierarchy
//! store is the durable relational source of truth for roles and their
//! relationships.

/// Durable role hierarchy store (relational)
pub mod hierarchy;
/// Distributed policy store (replicated tuple sets + change channel)
pub mod policy;
