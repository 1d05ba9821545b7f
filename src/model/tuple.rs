//! Policy and grouping tuple grammar
//!
//! Two tuple shapes cover the whole model. A [`PolicyTuple`] is an explicit
//! allow rule; a [`GroupingTuple`] is a membership edge that lets its member
//! inherit every permission granted to its group. There are no deny rules:
//! absence of a matching policy is a deny.

use serde::{Deserialize, Serialize};

use crate::utils::error::{AuthzError, Result};

/// An explicit allow rule over (subject, domain, object, action).
///
/// `subject` is normally a role code; `domain` identifies a tenant or a
/// service; `object` is a resource path (wildcards allowed, see
/// [`crate::model::matcher`]); `action` is an HTTP-style verb or `*`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PolicyTuple {
    pub subject: String,
    pub domain: String,
    pub object: String,
    pub action: String,
}

impl PolicyTuple {
    pub fn new<S1, S2, S3, S4>(subject: S1, domain: S2, object: S3, action: S4) -> Self
    where
        S1: Into<String>,
        S2: Into<String>,
        S3: Into<String>,
        S4: Into<String>,
    {
        Self {
            subject: subject.into(),
            domain: domain.into(),
            object: object.into(),
            action: action.into(),
        }
    }

    /// Reject tuples with empty fields before they reach a store
    pub fn validate(&self) -> Result<()> {
        if self.subject.is_empty()
            || self.domain.is_empty()
            || self.object.is_empty()
            || self.action.is_empty()
        {
            return Err(AuthzError::params(format!(
                "policy tuple has empty fields: {self:?}"
            )));
        }
        Ok(())
    }
}

impl std::fmt::Display for PolicyTuple {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "p({}, {}, {}, {})",
            self.subject, self.domain, self.object, self.action
        )
    }
}

/// A membership edge: `member` inherits every permission granted to `group`.
///
/// Both relation kinds live in one grouping space: user -> business-role edges
/// mirror user role assignments, business-role -> internal-role edges mirror
/// role inheritance.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GroupingTuple {
    pub member: String,
    pub group: String,
}

impl GroupingTuple {
    pub fn new<M, G>(member: M, group: G) -> Self
    where
        M: Into<String>,
        G: Into<String>,
    {
        Self {
            member: member.into(),
            group: group.into(),
        }
    }

    /// Reject edges with empty endpoints or self-loops
    pub fn validate(&self) -> Result<()> {
        if self.member.is_empty() || self.group.is_empty() {
            return Err(AuthzError::params(format!(
                "grouping tuple has empty fields: {self:?}"
            )));
        }
        if self.member == self.group {
            return Err(AuthzError::params(format!(
                "grouping tuple is a self-loop: {self:?}"
            )));
        }
        Ok(())
    }
}

impl std::fmt::Display for GroupingTuple {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "g({}, {})", self.member, self.group)
    }
}

/// An authorization check request. Ephemeral: never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessRequest {
    pub subject: String,
    pub domain: String,
    pub object: String,
    pub action: String,
}

impl AccessRequest {
    pub fn new<S1, S2, S3, S4>(subject: S1, domain: S2, object: S3, action: S4) -> Self
    where
        S1: Into<String>,
        S2: Into<String>,
        S3: Into<String>,
        S4: Into<String>,
    {
        Self {
            subject: subject.into(),
            domain: domain.into(),
            object: object.into(),
            action: action.into(),
        }
    }
}

impl std::fmt::Display for AccessRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "r({}, {}, {}, {})",
            self.subject, self.domain, self.object, self.action
        )
    }
}

/// The complete tuple set held by a policy store, loaded as one unit when
/// an engine replica rebuilds its cache.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PolicySet {
    pub policies: Vec<PolicyTuple>,
    pub groupings: Vec<GroupingTuple>,
}

impl PolicySet {
    pub fn new(policies: Vec<PolicyTuple>, groupings: Vec<GroupingTuple>) -> Self {
        Self {
            policies,
            groupings,
        }
    }

    pub fn len(&self) -> usize {
        self.policies.len() + self.groupings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.policies.is_empty() && self.groupings.is_empty()
    }
}
