//! Configuration management for the authorization engine
//!
//! This module handles loading, validation, and merging of all engine
//! configuration.

pub mod models;

pub use models::*;

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::model::SeniorityOrder;
use crate::utils::error::{AuthzError, Result};

/// Main configuration struct for the authorization engine
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Service identity and role ordering
    #[serde(default)]
    pub service: ServiceConfig,
    /// Relational store configuration
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Policy store configuration
    #[serde(default)]
    pub redis: RedisConfig,
    /// Enforcement engine configuration
    #[serde(default)]
    pub engine: EngineConfig,
    /// Declared endpoints compiled into default policies at startup
    #[serde(default)]
    pub routes: Vec<RouteConfig>,
}

#[allow(dead_code)]
impl Config {
    /// Load configuration from a YAML file
    pub async fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        info!("Loading configuration from: {:?}", path);

        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| AuthzError::Config(format!("Failed to read config file: {}", e)))?;

        let config: Config = serde_yaml::from_str(&content)
            .map_err(|e| AuthzError::Config(format!("Failed to parse config: {}", e)))?;

        config.validate()?;

        debug!("Configuration loaded successfully");
        Ok(config)
    }

    /// Load configuration from environment variables, falling back to
    /// defaults for everything not set
    pub fn from_env() -> Result<Self> {
        info!("Loading configuration from environment variables");

        let mut config = Self::default();
        if let Ok(url) = std::env::var("ROLEGATE_DATABASE_URL") {
            config.database.url = url;
        }
        if let Ok(url) = std::env::var("ROLEGATE_REDIS_URL") {
            config.redis.url = url;
        }
        if let Ok(name) = std::env::var("ROLEGATE_SERVICE_NAME") {
            config.service.name = name;
        }

        config.validate()?;
        Ok(config)
    }

    /// The validated seniority ordering declared by this configuration
    pub fn seniority(&self) -> Result<SeniorityOrder> {
        SeniorityOrder::new(self.service.role_seniority.clone())
    }

    /// Validate the entire configuration
    pub fn validate(&self) -> Result<()> {
        debug!("Validating configuration");

        if self.service.name.is_empty() {
            return Err(AuthzError::Config(
                "service name must not be empty".to_string(),
            ));
        }

        self.seniority()
            .map_err(|e| AuthzError::Config(format!("Role seniority error: {}", e)))?;

        if self.database.url.is_empty() {
            return Err(AuthzError::Config(
                "database URL must not be empty".to_string(),
            ));
        }

        if self.redis.enabled && self.redis.url.is_empty() {
            return Err(AuthzError::Config(
                "redis URL must not be empty when redis is enabled".to_string(),
            ));
        }
        if self.redis.key_prefix.is_empty() {
            return Err(AuthzError::Config(
                "redis key prefix must not be empty".to_string(),
            ));
        }

        for route in &self.routes {
            if !route.path.starts_with('/') {
                return Err(AuthzError::Config(format!(
                    "route path '{}' must start with '/'",
                    route.path
                )));
            }
            if route.methods.is_empty() {
                return Err(AuthzError::Config(format!(
                    "route '{}' declares no methods",
                    route.path
                )));
            }
        }

        debug!("Configuration validation completed");
        Ok(())
    }

    /// Merge with another configuration (other takes precedence)
    pub fn merge(mut self, other: Self) -> Self {
        self.service = self.service.merge(other.service);
        self.database = self.database.merge(other.database);
        self.redis = self.redis.merge(other.redis);
        self.engine = self.engine.merge(other.engine);
        if !other.routes.is_empty() {
            self.routes = other.routes;
        }
        self
    }

    /// Convert to YAML string
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self)
            .map_err(|e| AuthzError::Config(format!("Failed to serialize config to YAML: {}", e)))
    }
}
