//! Cross-store synchronization
//!
//! [`RoleManager`] is the only writer allowed to touch both the role
//! hierarchy store and the distributed policy store. Every dual mutation is
//! a saga: validate against the hierarchy store, mutate the fast policy
//! store, then run the relational transaction as the final arbiter. A
//! relational failure triggers compensation of the policy store back to its
//! prior state; a failed compensation is escalated to
//! [`AuthzError::Consistency`] with both tuple sets attached, the one
//! condition that needs an operator.
//!
//! The fast-store-first ordering is deliberate. A crash between the two
//! stores leaves the policy store ahead of the durable one, and the next
//! wholesale replacement for that subject starts with a full removal, so
//! the divergence heals itself.

use std::sync::Arc;

use tracing::{debug, error, info, warn};

use crate::engine::PolicyEngine;
use crate::model::{ADMINISTRATOR_ROLE, GroupingTuple, RoleKind, RoleStatus, validate_business_code};
use crate::store::hierarchy::{RoleRecord, RoleStore};
use crate::utils::error::{AuthzError, Result};

/// Administrative surface over both stores
#[derive(Debug, Clone)]
pub struct RoleManager {
    roles: Arc<dyn RoleStore>,
    engine: Arc<PolicyEngine>,
}

impl RoleManager {
    pub fn new(roles: Arc<dyn RoleStore>, engine: Arc<PolicyEngine>) -> Self {
        Self { roles, engine }
    }

    /// Idempotently provision the internal role for a (resource, action)
    /// capability. Store-only: internal roles gain reach through policy
    /// tuples and inherit edges, not at provisioning time.
    pub async fn ensure_internal_role(&self, resource: &str, action: &str) -> Result<RoleRecord> {
        self.roles.ensure_internal_role(resource, action).await
    }

    /// Idempotently provision a business role
    pub async fn ensure_business_role(
        &self,
        code: &str,
        name: &str,
        status: RoleStatus,
    ) -> Result<RoleRecord> {
        self.roles.ensure_business_role(code, name, status).await
    }

    /// Update a business role's display name and/or status
    pub async fn update_business_role(
        &self,
        code: &str,
        name: Option<&str>,
        status: Option<RoleStatus>,
    ) -> Result<RoleRecord> {
        self.roles.update_business_role(code, name, status).await
    }

    /// Replace the set of internal roles a business role inherits.
    ///
    /// Validation failures return before either store is touched. A policy
    /// store failure aborts before the relational write. A relational
    /// failure rolls the policy store back to the previous edge set.
    pub async fn set_role_inherits(&self, role_code: &str, inherit_codes: &[String]) -> Result<()> {
        // Previous edge set, needed for rollback
        let old_codes = self.roles.list_role_inherits(role_code).await?;

        let role = self.require_role(role_code).await?;
        if role.kind != RoleKind::Business {
            return Err(AuthzError::params(format!(
                "role '{role_code}' is not a business role"
            )));
        }
        let new_codes = dedupe(inherit_codes);
        for code in &new_codes {
            let target = self.require_role(code).await?;
            if target.kind != RoleKind::Internal {
                return Err(AuthzError::params(format!(
                    "inherit target '{code}' is not an internal role"
                )));
            }
        }

        info!(
            "Setting {} inherit edges for role '{}'",
            new_codes.len(),
            role_code
        );

        // Fast store first: full removal, then one edge per code. Any
        // failure aborts with the relational store untouched.
        self.engine
            .remove_grouping_tuples_for_subject(role_code)
            .await?;
        for code in &new_codes {
            self.engine.add_grouping_tuple(role_code, code).await?;
        }

        // Durable store is the final arbiter
        if let Err(db_err) = self.roles.replace_role_inherits(role_code, &new_codes).await {
            warn!(
                "Relational replace failed for role '{}', compensating policy store: {}",
                role_code, db_err
            );
            let attempted = edges(role_code, &new_codes);
            let previous = edges(role_code, &old_codes);
            self.compensate_subject(role_code, &attempted, &previous)
                .await?;
            return Err(db_err);
        }
        Ok(())
    }

    /// Replace the set of business roles assigned to a user. Same saga
    /// shape as [`Self::set_role_inherits`].
    pub async fn set_user_roles(&self, uid: &str, role_codes: &[String]) -> Result<()> {
        if uid.is_empty() {
            return Err(AuthzError::params("uid must not be empty"));
        }

        let old_codes = self.roles.list_user_roles(uid).await?;

        let new_codes = dedupe(role_codes);
        for code in &new_codes {
            validate_business_code(code)?;
            let target = self.require_role(code).await?;
            if target.kind != RoleKind::Business {
                return Err(AuthzError::params(format!(
                    "role '{code}' is not a business role"
                )));
            }
        }

        info!("Setting {} roles for uid '{}'", new_codes.len(), uid);

        self.engine.remove_grouping_tuples_for_subject(uid).await?;
        for code in &new_codes {
            self.engine.add_grouping_tuple(uid, code).await?;
        }

        if let Err(db_err) = self.roles.replace_user_roles(uid, &new_codes).await {
            warn!(
                "Relational replace failed for uid '{}', compensating policy store: {}",
                uid, db_err
            );
            let attempted = edges(uid, &new_codes);
            let previous = edges(uid, &old_codes);
            self.compensate_subject(uid, &attempted, &previous).await?;
            return Err(db_err);
        }
        Ok(())
    }

    /// Delete a business role, cascading over its inherit edges and user
    /// assignments in both stores. The administrator role and internal
    /// roles are refused.
    pub async fn delete_business_role(&self, code: &str) -> Result<()> {
        validate_business_code(code)?;
        if code == ADMINISTRATOR_ROLE {
            return Err(AuthzError::params(format!(
                "the '{ADMINISTRATOR_ROLE}' role cannot be deleted"
            )));
        }
        let role = self.require_role(code).await?;
        if role.kind != RoleKind::Business {
            return Err(AuthzError::params(format!(
                "role '{code}' is not a business role"
            )));
        }

        // Everything the cascade will remove, for rollback
        let old_inherits = self.roles.list_role_inherits(code).await?;
        let old_assignees = self.roles.list_assignees(code).await?;

        info!(
            "Deleting role '{}' ({} inherit edges, {} assignees)",
            code,
            old_inherits.len(),
            old_assignees.len()
        );

        // Fast store: drop the role's own edges, then every user edge
        // pointing at it
        self.engine.remove_grouping_tuples_for_subject(code).await?;
        self.engine.remove_grouping_tuples_for_group(code).await?;

        if let Err(db_err) = self.roles.delete_role_cascade(code).await {
            warn!(
                "Relational cascade failed for role '{}', compensating policy store: {}",
                code, db_err
            );
            let mut previous = edges(code, &old_inherits);
            previous.extend(
                old_assignees
                    .iter()
                    .map(|uid| GroupingTuple::new(uid.clone(), code)),
            );
            // The target state has no tuples for this role, so the
            // attempted set is empty.
            self.restore_edges(code, &[], &previous).await?;
            return Err(db_err);
        }
        Ok(())
    }

    /// Internal role codes inherited by a business role
    pub async fn list_role_inherits(&self, role_code: &str) -> Result<Vec<String>> {
        self.roles.list_role_inherits(role_code).await
    }

    /// Business role codes assigned to a user
    pub async fn list_user_roles(&self, uid: &str) -> Result<Vec<String>> {
        self.roles.list_user_roles(uid).await
    }

    /// All roles of one kind
    pub async fn list_roles_by_kind(&self, kind: RoleKind) -> Result<Vec<RoleRecord>> {
        self.roles.list_roles_by_kind(kind).await
    }

    /// Look up a role by code
    pub async fn find_role(&self, code: &str) -> Result<Option<RoleRecord>> {
        self.roles.find_role(code).await
    }

    async fn require_role(&self, code: &str) -> Result<RoleRecord> {
        self.roles
            .find_role(code)
            .await?
            .ok_or_else(|| AuthzError::not_found("role", code))
    }

    /// Roll the policy store back to the previous edge set for a subject:
    /// remove whatever the failed mutation added, re-add the old edges.
    async fn compensate_subject(
        &self,
        subject: &str,
        attempted: &[GroupingTuple],
        previous: &[GroupingTuple],
    ) -> Result<()> {
        let rollback = async {
            self.engine
                .remove_grouping_tuples_for_subject(subject)
                .await?;
            for edge in previous {
                self.engine
                    .add_grouping_tuple(&edge.member, &edge.group)
                    .await?;
            }
            Ok::<(), AuthzError>(())
        };
        match rollback.await {
            Ok(()) => {
                debug!(
                    "Compensation restored {} edges for subject '{}'",
                    previous.len(),
                    subject
                );
                Ok(())
            }
            Err(comp_err) => {
                error!(
                    subject = subject,
                    error = %comp_err,
                    attempted = ?attempted,
                    previous = ?previous,
                    "Compensation failed: policy store and relational store have diverged"
                );
                Err(AuthzError::consistency(
                    subject,
                    attempted.to_vec(),
                    previous.to_vec(),
                ))
            }
        }
    }

    /// Rollback for the delete cascade: re-add every removed edge, both
    /// the role's own inherits and the user assignments pointing at it.
    async fn restore_edges(
        &self,
        subject: &str,
        attempted: &[GroupingTuple],
        previous: &[GroupingTuple],
    ) -> Result<()> {
        let rollback = async {
            for edge in previous {
                self.engine
                    .add_grouping_tuple(&edge.member, &edge.group)
                    .await?;
            }
            Ok::<(), AuthzError>(())
        };
        match rollback.await {
            Ok(()) => {
                debug!(
                    "Compensation restored {} edges around role '{}'",
                    previous.len(),
                    subject
                );
                Ok(())
            }
            Err(comp_err) => {
                error!(
                    subject = subject,
                    error = %comp_err,
                    attempted = ?attempted,
                    previous = ?previous,
                    "Compensation failed: policy store and relational store have diverged"
                );
                Err(AuthzError::consistency(
                    subject,
                    attempted.to_vec(),
                    previous.to_vec(),
                ))
            }
        }
    }
}

fn dedupe(codes: &[String]) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    codes
        .iter()
        .filter(|code| seen.insert(code.as_str()))
        .cloned()
        .collect()
}

fn edges(member: &str, groups: &[String]) -> Vec<GroupingTuple> {
    groups
        .iter()
        .map(|group| GroupingTuple::new(member, group.clone()))
        .collect()
}
