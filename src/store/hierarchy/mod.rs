//! Durable role hierarchy store
//!
//! The relational source of truth for roles, inheritance edges, and user
//! assignments. Everything here is CRUD-with-invariants: role kinds are
//! immutable, inherit edges only run business -> internal, and edge/assignment
//! sets are replaced wholesale inside one transaction. The distributed
//! policy store is a projection of this data, kept in step by the sync
//! layer and never written from here.

pub mod db;
pub mod entities;
pub mod migration;

pub use db::DbRoleStore;

use async_trait::async_trait;

use crate::model::{RoleKind, RoleStatus};
use crate::utils::error::Result;

/// A role row as the rest of the engine sees it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleRecord {
    /// Unique role code
    pub code: String,
    /// Display name
    pub name: String,
    /// Role kind, immutable once created
    pub kind: RoleKind,
    /// Administrative status
    pub status: RoleStatus,
}

/// Storage interface for the role hierarchy.
///
/// A trait rather than a concrete type so the sync layer can be exercised
/// against wrapped or failing stores in tests.
#[async_trait]
pub trait RoleStore: Send + Sync + std::fmt::Debug {
    /// Idempotently provision the internal role for a (resource, action)
    /// capability, deriving its code from the fixed naming convention
    async fn ensure_internal_role(&self, resource: &str, action: &str) -> Result<RoleRecord>;

    /// Idempotently provision a business role. Rejects codes in the
    /// reserved internal namespace; an existing row is returned unchanged.
    async fn ensure_business_role(
        &self,
        code: &str,
        name: &str,
        status: RoleStatus,
    ) -> Result<RoleRecord>;

    /// Update a business role's name and/or status. The kind cannot change.
    async fn update_business_role(
        &self,
        code: &str,
        name: Option<&str>,
        status: Option<RoleStatus>,
    ) -> Result<RoleRecord>;

    /// Look up a role by code
    async fn find_role(&self, code: &str) -> Result<Option<RoleRecord>>;

    /// All roles of one kind, ordered by code
    async fn list_roles_by_kind(&self, kind: RoleKind) -> Result<Vec<RoleRecord>>;

    /// Internal role codes a business role inherits
    async fn list_role_inherits(&self, role_code: &str) -> Result<Vec<String>>;

    /// Business role codes assigned to a user
    async fn list_user_roles(&self, uid: &str) -> Result<Vec<String>>;

    /// Uids holding a given business role
    async fn list_assignees(&self, role_code: &str) -> Result<Vec<String>>;

    /// Replace the full inherit edge set for a business role in one
    /// transaction. Input is deduplicated; no validation happens here.
    async fn replace_role_inherits(
        &self,
        role_code: &str,
        inherit_codes: &[String],
    ) -> Result<()>;

    /// Replace the full assignment set for a uid in one transaction
    async fn replace_user_roles(&self, uid: &str, role_codes: &[String]) -> Result<()>;

    /// Delete a role and every inherit edge and assignment referencing it,
    /// all in one transaction
    async fn delete_role_cascade(&self, code: &str) -> Result<()>;

    /// Liveness probe against the backing database
    async fn health_check(&self) -> Result<()>;
}
