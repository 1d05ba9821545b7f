//! Role taxonomy and naming rules
//!
//! Roles come in exactly two kinds. Internal roles are system-derived, one
//! per (resource, action) capability, and follow a fixed naming convention.
//! Business roles are operator-defined, assigned to users, and composed of
//! inherited internal roles. The kind of a role is immutable once created.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::utils::error::{AuthzError, Result};

/// The fixed administrator role code. It can never be deleted.
pub const ADMINISTRATOR_ROLE: &str = "administrator";

/// Prefix reserved for system-derived internal role codes
pub const INTERNAL_ROLE_PREFIX: &str = "internal.";

/// Default role seniority, most senior first. Each role implies every role
/// after it when routes are compiled into policy tuples.
pub const DEFAULT_ROLE_SENIORITY: [&str; 5] =
    ["administrator", "manager", "editor", "guest", "anonymous"];

static RESOURCE_SLUG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z0-9][a-z0-9_-]*$").expect("resource slug regex is valid"));

/// Role kind (immutable once a role is created)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoleKind {
    /// System-derived capability role, named `internal.<resource>.<action>`
    Internal,
    /// Operator-defined role assigned to users
    Business,
}

impl RoleKind {
    /// String form as stored in the database
    pub fn as_str(&self) -> &'static str {
        match self {
            RoleKind::Internal => "internal",
            RoleKind::Business => "business",
        }
    }

    /// Parse the stored string form
    pub fn parse(value: &str) -> Result<Self> {
        match value {
            "internal" => Ok(RoleKind::Internal),
            "business" => Ok(RoleKind::Business),
            other => Err(AuthzError::params(format!("unknown role kind '{other}'"))),
        }
    }
}

impl std::fmt::Display for RoleKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Role status (administrative metadata; enforcement does not consult it)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoleStatus {
    Enabled,
    Disabled,
}

impl RoleStatus {
    /// String form as stored in the database
    pub fn as_str(&self) -> &'static str {
        match self {
            RoleStatus::Enabled => "enabled",
            RoleStatus::Disabled => "disabled",
        }
    }

    /// Parse the stored string form
    pub fn parse(value: &str) -> Result<Self> {
        match value {
            "enabled" => Ok(RoleStatus::Enabled),
            "disabled" => Ok(RoleStatus::Disabled),
            other => Err(AuthzError::params(format!("unknown role status '{other}'"))),
        }
    }
}

impl std::fmt::Display for RoleStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Capability verb an internal role grants on its resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InternalAction {
    Read,
    Write,
}

impl InternalAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            InternalAction::Read => "read",
            InternalAction::Write => "write",
        }
    }

    /// Parse a caller-supplied action string
    pub fn parse(value: &str) -> Result<Self> {
        match value {
            "read" => Ok(InternalAction::Read),
            "write" => Ok(InternalAction::Write),
            other => Err(AuthzError::params(format!(
                "internal role action must be 'read' or 'write', got '{other}'"
            ))),
        }
    }
}

impl std::fmt::Display for InternalAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Derive the internal role code for a (resource, action) capability
pub fn internal_role_code(resource: &str, action: InternalAction) -> Result<String> {
    if !RESOURCE_SLUG.is_match(resource) {
        return Err(AuthzError::params(format!(
            "internal role resource must be a lowercase slug, got '{resource}'"
        )));
    }
    Ok(format!("{INTERNAL_ROLE_PREFIX}{resource}.{action}"))
}

/// Whether a role code uses the reserved internal naming convention
pub fn is_internal_code(code: &str) -> bool {
    code.starts_with(INTERNAL_ROLE_PREFIX)
}

/// Validate a business role code: non-empty and outside the reserved
/// internal namespace
pub fn validate_business_code(code: &str) -> Result<()> {
    if code.is_empty() {
        return Err(AuthzError::params("role code must not be empty"));
    }
    if is_internal_code(code) {
        return Err(AuthzError::params(format!(
            "role code '{code}' is internal: the '{INTERNAL_ROLE_PREFIX}' namespace is reserved"
        )));
    }
    Ok(())
}

/// Role seniority ordering, most senior first, validated at load time.
///
/// The route compiler expands a required role into the role itself plus
/// everything senior to it, so a `manager` endpoint is also reachable by
/// `administrator` but never by `guest`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeniorityOrder {
    order: Vec<String>,
}

impl SeniorityOrder {
    /// Build and validate an ordering. Rejects empty lists, duplicate
    /// entries, internal role codes, and orderings that omit the
    /// administrator role.
    pub fn new(order: Vec<String>) -> Result<Self> {
        if order.is_empty() {
            return Err(AuthzError::params("role seniority must not be empty"));
        }
        let mut seen = std::collections::HashSet::new();
        for code in &order {
            validate_business_code(code)?;
            if !seen.insert(code.as_str()) {
                return Err(AuthzError::params(format!(
                    "role seniority lists '{code}' more than once"
                )));
            }
        }
        if !seen.contains(ADMINISTRATOR_ROLE) {
            return Err(AuthzError::params(format!(
                "role seniority must include '{ADMINISTRATOR_ROLE}'"
            )));
        }
        Ok(Self { order })
    }

    /// All role codes, most senior first
    pub fn roles(&self) -> &[String] {
        &self.order
    }

    /// The required role plus every role senior to it. An empty required
    /// role expands to the full list (a public endpoint).
    pub fn covering_roles(&self, required: &str) -> Result<Vec<String>> {
        if required.is_empty() {
            return Ok(self.order.clone());
        }
        let position = self
            .order
            .iter()
            .position(|code| code == required)
            .ok_or_else(|| {
                AuthzError::params(format!("role '{required}' is not in the seniority ordering"))
            })?;
        Ok(self.order[..=position].to_vec())
    }
}

impl Default for SeniorityOrder {
    fn default() -> Self {
        Self {
            order: DEFAULT_ROLE_SENIORITY
                .iter()
                .map(|code| code.to_string())
                .collect(),
        }
    }
}
