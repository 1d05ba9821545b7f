//! # Rolegate
//!
//! A role-based authorization engine for multi-tenant service backends.
//! Decides, for a given (subject, domain, object, action) request, whether
//! access is allowed, and keeps that decision data consistent across a
//! durable role hierarchy and a distributed, cache-backed policy evaluator.
//!
//! ## Features
//!
//! - **Tuple policy model**: explicit allow rules plus grouping edges for
//!   role inheritance, no deny rules
//! - **Fast enforcement**: full policy set cached in memory per replica,
//!   read-mostly locking, definitive booleans
//! - **Durable role hierarchy**: roles, inheritance edges, and user
//!   assignments in a relational store with typed invariants
//! - **Cross-store sagas**: dual mutations with compensation, never a
//!   half-applied state without an escalated error
//! - **Change propagation**: pub/sub invalidation between replicas with a
//!   periodic resync fallback
//! - **Route compilation**: default policies derived from declared endpoints
//!   and a role seniority ordering
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use rolegate::{AccessRequest, AuthzService, Config};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::from_file("config/rolegate.yaml").await?;
//!     let service = AuthzService::new(config).await?;
//!     service.start().await?;
//!
//!     let request = AccessRequest::new("user-42", "tenant-a", "/report", "GET");
//!     let allowed = service.enforce(&request).await?;
//!     println!("allowed: {allowed}");
//!
//!     service.shutdown().await;
//!     Ok(())
//! }
//! ```

#![allow(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_inception)]

// Public module exports
pub mod config;
pub mod engine;
pub mod model;
pub mod routes;
pub mod store;
pub mod sync;
pub mod utils;

// Re-export main types
pub use config::Config;
pub use engine::{MAX_GROUPING_DEPTH, PolicyEngine, PolicySnapshot};
pub use model::{
    AccessRequest, GroupingTuple, PolicySet, PolicyTuple, RoleKind, RoleStatus, SeniorityOrder,
};
pub use routes::compile_route_policies;
pub use store::hierarchy::{DbRoleStore, RoleRecord, RoleStore};
#[cfg(feature = "redis")]
pub use store::policy::RedisPolicyStore;
pub use store::policy::{ChangeEvent, MemoryPolicyStore, PolicyStore};
pub use sync::RoleManager;
pub use utils::error::{AuthzError, Result};

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{info, warn};

/// The authorization service composition root.
///
/// Wires one enforcement engine, one role hierarchy store, and one policy
/// store into a ready-to-use service. Tests and embedders that need finer
/// control can construct the parts directly instead.
#[derive(Debug)]
pub struct AuthzService {
    config: Config,
    roles: Arc<DbRoleStore>,
    policy: Arc<dyn PolicyStore>,
    engine: Arc<PolicyEngine>,
    manager: RoleManager,
    tasks: tokio::sync::Mutex<Vec<JoinHandle<()>>>,
}

impl AuthzService {
    /// Create a new service instance from a validated configuration
    pub async fn new(config: Config) -> Result<Self> {
        info!("Creating authorization service '{}'", config.service.name);
        config.validate()?;

        let roles = Arc::new(DbRoleStore::new(&config.database).await?);
        let policy = Self::build_policy_store(&config).await?;
        let engine = Arc::new(PolicyEngine::new(policy.clone()));
        let manager = RoleManager::new(roles.clone(), engine.clone());

        Ok(Self {
            config,
            roles,
            policy,
            engine,
            manager,
            tasks: tokio::sync::Mutex::new(Vec::new()),
        })
    }

    /// Bootstrap the service: run pending migrations when configured to,
    /// compile and submit the default route policies, and spawn the change
    /// listener and the periodic resync task.
    pub async fn start(&self) -> Result<()> {
        info!("Starting authorization service '{}'", self.config.service.name);

        if self.config.database.auto_migrate {
            self.roles.migrate().await?;
        }

        let seniority = self.config.seniority()?;
        let tuples =
            compile_route_policies(&self.config.service.name, &self.config.routes, &seniority)?;
        let count = tuples.len();
        self.engine.add_policies(&tuples).await?;
        info!("Submitted {} default route policies", count);

        let mut tasks = self.tasks.lock().await;
        tasks.push(self.engine.start_change_listener().await?);
        if self.config.engine.resync_interval > 0 {
            let interval = Duration::from_secs(self.config.engine.resync_interval);
            tasks.push(self.engine.start_resync(interval));
        }

        info!("Authorization service started");
        Ok(())
    }

    /// Check whether the request is allowed
    pub async fn enforce(&self, request: &AccessRequest) -> Result<bool> {
        self.engine.enforce(request).await
    }

    /// Probe both backing stores
    pub async fn health_check(&self) -> Result<()> {
        self.roles.health_check().await?;
        self.policy.health_check().await?;
        Ok(())
    }

    /// Stop the background tasks. Store connections close when the service
    /// is dropped.
    pub async fn shutdown(&self) {
        info!("Shutting down authorization service");
        let mut tasks = self.tasks.lock().await;
        for task in tasks.drain(..) {
            task.abort();
        }
    }

    /// The enforcement engine
    pub fn engine(&self) -> &Arc<PolicyEngine> {
        &self.engine
    }

    /// The administrative surface over both stores
    pub fn manager(&self) -> &RoleManager {
        &self.manager
    }

    /// The active configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    async fn build_policy_store(config: &Config) -> Result<Arc<dyn PolicyStore>> {
        #[cfg(feature = "redis")]
        if config.redis.enabled {
            let store = store::policy::RedisPolicyStore::new(&config.redis).await?;
            return Ok(Arc::new(store));
        }
        #[cfg(not(feature = "redis"))]
        if config.redis.enabled {
            warn!("Redis support is not compiled in, using the in-process policy store");
        }
        if !config.redis.enabled {
            warn!("Redis is disabled, policy state will not replicate beyond this process");
        }
        Ok(Arc::new(MemoryPolicyStore::new()))
    }
}

// Version information
/// Current version of the crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
/// Name of the crate
pub const NAME: &str = env!("CARGO_PKG_NAME");
/// Description of the crate
pub const DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");
