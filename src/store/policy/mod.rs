//! Distributed policy store
//!
//! A replicated backing store for the full policy/grouping tuple set, plus
//! a broadcast channel that tells every engine replica to reload after a
//! write. Saves replace the complete set: incremental add/remove semantics
//! live in the enforcement engine, which flushes its whole view on every
//! mutation. Full-set replacement is what makes the cross-store saga
//! self-healing after a crash between stores.

pub mod memory;
#[cfg(feature = "redis")]
pub mod redis;

pub use memory::MemoryPolicyStore;
#[cfg(feature = "redis")]
pub use redis::RedisPolicyStore;

use async_trait::async_trait;
use futures::stream::BoxStream;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::model::PolicySet;
use crate::utils::error::Result;

/// Invalidation event published after every successful tuple mutation.
///
/// Carries the originating replica id so the publisher can skip reloading
/// state it already holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeEvent {
    /// Replica that originated the change
    pub origin: Uuid,
}

impl ChangeEvent {
    pub fn new(origin: Uuid) -> Self {
        Self { origin }
    }
}

/// Replicated store for the policy/grouping tuple set
#[async_trait]
pub trait PolicyStore: Send + Sync + std::fmt::Debug {
    /// Load the complete tuple set
    async fn load(&self) -> Result<PolicySet>;

    /// Durably persist the complete tuple set, replacing whatever was there
    async fn save(&self, set: &PolicySet) -> Result<()>;

    /// Broadcast an invalidation event to peer replicas
    async fn publish_change(&self, event: &ChangeEvent) -> Result<()>;

    /// Subscribe to invalidation events from all replicas
    async fn subscribe_changes(&self) -> Result<BoxStream<'static, ChangeEvent>>;

    /// Liveness probe against the backing system
    async fn health_check(&self) -> Result<()>;
}
