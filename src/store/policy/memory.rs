//! In-process policy store
//!
//! The fallback when Redis is disabled: suitable for single-replica
//! deployments and for tests. The change channel is a local broadcast, so
//! "peer replicas" are other engine instances in the same process.

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use futures::StreamExt;
use futures::stream::BoxStream;
use tokio::sync::{Mutex, broadcast};
use tracing::warn;

use crate::model::PolicySet;
use crate::store::policy::{ChangeEvent, PolicyStore};
use crate::utils::error::{AuthzError, Result};

const CHANGE_CHANNEL_CAPACITY: usize = 64;

/// Policy store backed by process memory
#[derive(Debug)]
pub struct MemoryPolicyStore {
    set: Mutex<PolicySet>,
    changes: broadcast::Sender<ChangeEvent>,
    fail_saves: AtomicBool,
    fail_loads: AtomicBool,
}

impl MemoryPolicyStore {
    pub fn new() -> Self {
        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Self {
            set: Mutex::new(PolicySet::default()),
            changes,
            fail_saves: AtomicBool::new(false),
            fail_loads: AtomicBool::new(false),
        }
    }

    /// Make every subsequent `save` fail. Test hook for exercising the
    /// durability-flush failure path.
    pub fn fail_saves(&self, fail: bool) {
        self.fail_saves.store(fail, Ordering::SeqCst);
    }

    /// Make every subsequent `load` fail. Test hook for exercising the
    /// cold-start failure path.
    pub fn fail_loads(&self, fail: bool) {
        self.fail_loads.store(fail, Ordering::SeqCst);
    }
}

impl Default for MemoryPolicyStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PolicyStore for MemoryPolicyStore {
    async fn load(&self) -> Result<PolicySet> {
        if self.fail_loads.load(Ordering::SeqCst) {
            return Err(AuthzError::timeout("memory store: load failure injected"));
        }
        Ok(self.set.lock().await.clone())
    }

    async fn save(&self, set: &PolicySet) -> Result<()> {
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(AuthzError::timeout("memory store: save failure injected"));
        }
        *self.set.lock().await = set.clone();
        Ok(())
    }

    async fn publish_change(&self, event: &ChangeEvent) -> Result<()> {
        // A send error just means nobody is subscribed, which is the normal
        // state for a single replica.
        let _ = self.changes.send(*event);
        Ok(())
    }

    async fn subscribe_changes(&self) -> Result<BoxStream<'static, ChangeEvent>> {
        let rx = self.changes.subscribe();
        let stream = futures::stream::unfold(rx, |mut rx| async move {
            loop {
                match rx.recv().await {
                    Ok(event) => return Some((event, rx)),
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!("Change subscriber lagged, {} events skipped", skipped);
                        continue;
                    }
                    Err(broadcast::error::RecvError::Closed) => return None,
                }
            }
        });
        Ok(stream.boxed())
    }

    async fn health_check(&self) -> Result<()> {
        Ok(())
    }
}
