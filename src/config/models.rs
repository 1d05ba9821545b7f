//! Configuration data models
//!
//! This module defines all configuration structures used by the engine.

#![allow(missing_docs)]

use serde::{Deserialize, Serialize};

use crate::model::DEFAULT_ROLE_SENIORITY;

/// Default database URL (SQLite file, created on first use)
pub fn default_database_url() -> String {
    "sqlite://data/rolegate.db?mode=rwc".to_string()
}

/// Default maximum database connections
pub fn default_max_connections() -> u32 {
    10
}

/// Default connection timeout in seconds
pub fn default_connection_timeout() -> u64 {
    10
}

/// Default Redis URL
pub fn default_redis_url() -> String {
    "redis://localhost:6379".to_string()
}

/// Default per-operation timeout against the policy store, in seconds
pub fn default_operation_timeout() -> u64 {
    5
}

/// Default key prefix for policy store keys and the change channel
pub fn default_key_prefix() -> String {
    "rolegate".to_string()
}

/// Default interval between full cache resyncs, in seconds
pub fn default_resync_interval() -> u64 {
    300
}

/// Default service name
pub fn default_service_name() -> String {
    "rolegate".to_string()
}

fn default_role_seniority() -> Vec<String> {
    DEFAULT_ROLE_SENIORITY
        .iter()
        .map(|code| code.to_string())
        .collect()
}

fn default_redis_enabled() -> bool {
    true
}

/// Service-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Service name, used as the policy domain for unscoped routes
    #[serde(default = "default_service_name")]
    pub name: String,
    /// Role seniority ordering, most senior first
    #[serde(default = "default_role_seniority")]
    pub role_seniority: Vec<String>,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            name: default_service_name(),
            role_seniority: default_role_seniority(),
        }
    }
}

#[allow(dead_code)]
impl ServiceConfig {
    /// Merge service configurations (other takes precedence)
    pub fn merge(mut self, other: Self) -> Self {
        if !other.name.is_empty() && other.name != default_service_name() {
            self.name = other.name;
        }
        if other.role_seniority != default_role_seniority() {
            self.role_seniority = other.role_seniority;
        }
        self
    }
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Database URL
    #[serde(default = "default_database_url")]
    pub url: String,
    /// Maximum connections
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Connection timeout in seconds
    #[serde(default = "default_connection_timeout")]
    pub connection_timeout: u64,
    /// Run pending migrations on startup
    #[serde(default)]
    pub auto_migrate: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: default_database_url(),
            max_connections: default_max_connections(),
            connection_timeout: default_connection_timeout(),
            auto_migrate: false,
        }
    }
}

#[allow(dead_code)]
impl DatabaseConfig {
    /// Merge database configurations (other takes precedence)
    pub fn merge(mut self, other: Self) -> Self {
        if !other.url.is_empty() && other.url != default_database_url() {
            self.url = other.url;
        }
        if other.max_connections != default_max_connections() {
            self.max_connections = other.max_connections;
        }
        if other.connection_timeout != default_connection_timeout() {
            self.connection_timeout = other.connection_timeout;
        }
        if other.auto_migrate {
            self.auto_migrate = other.auto_migrate;
        }
        self
    }
}

/// Redis policy store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedisConfig {
    /// Redis URL
    #[serde(default = "default_redis_url")]
    pub url: String,
    /// Enable Redis (if false, an in-process policy store is used)
    #[serde(default = "default_redis_enabled")]
    pub enabled: bool,
    /// Key prefix for tuple sets and the change channel
    #[serde(default = "default_key_prefix")]
    pub key_prefix: String,
    /// Connection timeout in seconds
    #[serde(default = "default_connection_timeout")]
    pub connection_timeout: u64,
    /// Per-operation timeout in seconds
    #[serde(default = "default_operation_timeout")]
    pub operation_timeout: u64,
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            url: default_redis_url(),
            enabled: default_redis_enabled(),
            key_prefix: default_key_prefix(),
            connection_timeout: default_connection_timeout(),
            operation_timeout: default_operation_timeout(),
        }
    }
}

#[allow(dead_code)]
impl RedisConfig {
    /// Merge Redis configurations (other takes precedence)
    pub fn merge(mut self, other: Self) -> Self {
        if !other.url.is_empty() && other.url != default_redis_url() {
            self.url = other.url;
        }
        if other.key_prefix != default_key_prefix() {
            self.key_prefix = other.key_prefix;
        }
        if other.connection_timeout != default_connection_timeout() {
            self.connection_timeout = other.connection_timeout;
        }
        if other.operation_timeout != default_operation_timeout() {
            self.operation_timeout = other.operation_timeout;
        }
        if !other.enabled {
            self.enabled = other.enabled;
        }
        self
    }
}

/// Enforcement engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Interval between periodic full resyncs in seconds (0 disables the
    /// fallback; change events remain the primary reload trigger)
    #[serde(default = "default_resync_interval")]
    pub resync_interval: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            resync_interval: default_resync_interval(),
        }
    }
}

#[allow(dead_code)]
impl EngineConfig {
    /// Merge engine configurations (other takes precedence)
    pub fn merge(mut self, other: Self) -> Self {
        if other.resync_interval != default_resync_interval() {
            self.resync_interval = other.resync_interval;
        }
        self
    }
}

/// A declared endpoint compiled into default policy tuples at startup
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RouteConfig {
    /// URL path, may carry `*` wildcards
    pub path: String,
    /// HTTP methods the declaration covers
    pub methods: Vec<String>,
    /// Minimal required role; empty means public
    #[serde(default)]
    pub role: String,
    /// Whether the route is reachable under any tenant domain
    #[serde(default)]
    pub tenant_scoped: bool,
}
