//! Error handling for the authorization engine
//!
//! This module defines all error types used throughout the engine.

#![allow(missing_docs)]

use thiserror::Error;

use crate::model::GroupingTuple;

/// Result type alias for the authorization engine
pub type Result<T> = std::result::Result<T, AuthzError>;

/// Main error type for the authorization engine
#[derive(Error, Debug)]
#[allow(dead_code)]
pub enum AuthzError {
    /// Malformed or rejected caller input
    #[error("Invalid parameter: {0}")]
    Params(String),

    /// Uniqueness violations (role codes, tuple sets)
    #[error("Duplicate: {0}")]
    Duplicate(String),

    /// Lookup failures, carrying the entity kind and the identifier
    #[error("{kind} not found: {id}")]
    NotFound { kind: String, id: String },

    /// The policy store and the relational store have diverged and
    /// compensation failed. Carries both tuple sets so an operator can
    /// repair the stores by hand.
    #[error("Consistency error for subject '{subject}': policy store and relational store have diverged")]
    Consistency {
        subject: String,
        attempted: Vec<GroupingTuple>,
        previous: Vec<GroupingTuple>,
    },

    /// Enforcement engine failures (cache rebuild, store unreachable)
    #[error("Enforcement error: {0}")]
    Enforcement(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Database errors
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// Redis errors
    #[cfg(feature = "redis")]
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// YAML parsing errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Timeout errors
    #[error("Timeout error: {0}")]
    Timeout(String),

    /// Internal errors
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Helper functions for creating specific errors
#[allow(dead_code)]
impl AuthzError {
    pub fn params<S: Into<String>>(message: S) -> Self {
        Self::Params(message.into())
    }

    pub fn duplicate<S: Into<String>>(message: S) -> Self {
        Self::Duplicate(message.into())
    }

    pub fn not_found<K: Into<String>, I: Into<String>>(kind: K, id: I) -> Self {
        Self::NotFound {
            kind: kind.into(),
            id: id.into(),
        }
    }

    pub fn consistency<S: Into<String>>(
        subject: S,
        attempted: Vec<GroupingTuple>,
        previous: Vec<GroupingTuple>,
    ) -> Self {
        Self::Consistency {
            subject: subject.into(),
            attempted,
            previous,
        }
    }

    pub fn enforcement<S: Into<String>>(message: S) -> Self {
        Self::Enforcement(message.into())
    }

    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config(message.into())
    }

    pub fn timeout<S: Into<String>>(message: S) -> Self {
        Self::Timeout(message.into())
    }

    pub fn internal<S: Into<String>>(message: S) -> Self {
        Self::Internal(message.into())
    }

    /// Map a database error to the taxonomy, turning unique-constraint
    /// violations into `Duplicate` so callers see one error shape across
    /// SQLite and PostgreSQL.
    pub fn from_db(err: sea_orm::DbErr, what: &str) -> Self {
        match err.sql_err() {
            Some(sea_orm::SqlErr::UniqueConstraintViolation(_)) => {
                Self::Duplicate(what.to_string())
            }
            _ => Self::Database(err),
        }
    }

    /// Stable machine-readable code used in structured log fields
    pub fn code(&self) -> &'static str {
        match self {
            Self::Params(_) => "PARAMS_ERROR",
            Self::Duplicate(_) => "DUPLICATE",
            Self::NotFound { .. } => "NOT_FOUND",
            Self::Consistency { .. } => "CONSISTENCY_ERROR",
            Self::Enforcement(_) => "ENFORCEMENT_ERROR",
            Self::Config(_) => "CONFIG_ERROR",
            Self::Database(_) => "DATABASE_ERROR",
            #[cfg(feature = "redis")]
            Self::Redis(_) => "REDIS_ERROR",
            Self::Serialization(_) => "SERIALIZATION_ERROR",
            Self::Yaml(_) => "YAML_ERROR",
            Self::Io(_) => "IO_ERROR",
            Self::Timeout(_) => "TIMEOUT",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// True when the operation may succeed if retried with the same inputs
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Database(_) | Self::Timeout(_) | Self::Io(_) => true,
            #[cfg(feature = "redis")]
            Self::Redis(_) => true,
            _ => false,
        }
    }
}
