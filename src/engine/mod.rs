//! Enforcement engine
//!
//! One [`PolicyEngine`] per replica. Checks run against an in-memory
//! [`PolicySnapshot`] behind a read-write lock: any number of concurrent
//! checks share the read lock; a rebuild holds the write lock for the whole
//! reload so a check never sees a half-built snapshot.
//!
//! Mutations follow a fixed three-step contract: apply to the local
//! snapshot, flush the full tuple set to the policy store, then broadcast a
//! change event so peer replicas reload. A flush failure is returned as a
//! retryable error and the local snapshot is left ahead of the store on
//! purpose; the next wholesale replacement for the same subject converges
//! both sides. A broadcast failure is only logged; peers catch up through
//! the periodic resync.

pub mod snapshot;

pub use snapshot::{MAX_GROUPING_DEPTH, PolicySnapshot};

use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::model::{AccessRequest, GroupingTuple, PolicySet, PolicyTuple};
use crate::store::policy::{ChangeEvent, PolicyStore};
use crate::utils::error::{AuthzError, Result};

/// Policy evaluation engine for one replica
#[derive(Debug)]
pub struct PolicyEngine {
    store: Arc<dyn PolicyStore>,
    snapshot: RwLock<Option<PolicySnapshot>>,
    replica_id: Uuid,
}

impl PolicyEngine {
    /// Create an engine over a policy store. The cache starts cold and is
    /// filled on the first check, mutation, or reload.
    pub fn new(store: Arc<dyn PolicyStore>) -> Self {
        let replica_id = Uuid::new_v4();
        info!("Creating policy engine, replica {}", replica_id);
        Self {
            store,
            snapshot: RwLock::new(None),
            replica_id,
        }
    }

    /// Identity of this replica, carried in change events so the
    /// originator can skip reloading state it already holds
    pub fn replica_id(&self) -> Uuid {
        self.replica_id
    }

    /// Decide whether the request is allowed.
    ///
    /// Always returns a definitive boolean once the snapshot is available;
    /// the only error is an [`AuthzError::Enforcement`] when a cold-start
    /// load from the backing store fails. Callers must treat an error as a
    /// deny.
    pub async fn enforce(&self, request: &AccessRequest) -> Result<bool> {
        {
            let guard = self.snapshot.read().await;
            if let Some(snapshot) = guard.as_ref() {
                return Ok(snapshot.allows(request));
            }
        }

        let mut guard = self.snapshot.write().await;
        let snapshot = Self::loaded(&self.store, &mut guard).await?;
        Ok(snapshot.allows(request))
    }

    /// Rebuild the snapshot from the policy store. The write lock is held
    /// across the load, so checks block until the rebuild completes.
    pub async fn reload(&self) -> Result<()> {
        let mut guard = self.snapshot.write().await;
        let set = Self::load_set(&self.store).await?;
        debug!(
            "Reloaded policy snapshot: {} policies, {} groupings",
            set.policies.len(),
            set.groupings.len()
        );
        *guard = Some(PolicySnapshot::from_set(set));
        Ok(())
    }

    /// Add policy rules. Validation failures and store-load failures abort
    /// before anything is written or broadcast.
    pub async fn add_policies(&self, tuples: &[PolicyTuple]) -> Result<()> {
        for tuple in tuples {
            tuple.validate()?;
        }

        let mut guard = self.snapshot.write().await;
        let snapshot = Self::loaded(&self.store, &mut guard).await?;
        let added = snapshot.add_policies(tuples);
        debug!("Added {} of {} submitted policies", added, tuples.len());

        self.flush_and_broadcast(snapshot).await
    }

    /// Add one grouping edge
    pub async fn add_grouping_tuple(&self, member: &str, group: &str) -> Result<()> {
        let edge = GroupingTuple::new(member, group);
        edge.validate()?;

        let mut guard = self.snapshot.write().await;
        let snapshot = Self::loaded(&self.store, &mut guard).await?;
        snapshot.add_grouping(edge);

        self.flush_and_broadcast(snapshot).await
    }

    /// Remove every grouping edge whose member is `subject`
    pub async fn remove_grouping_tuples_for_subject(&self, subject: &str) -> Result<()> {
        let mut guard = self.snapshot.write().await;
        let snapshot = Self::loaded(&self.store, &mut guard).await?;
        let removed = snapshot.remove_groupings_for_subject(subject);
        debug!("Removed {} grouping edges for subject '{}'", removed, subject);

        self.flush_and_broadcast(snapshot).await
    }

    /// Remove every grouping edge whose group is `group`
    pub async fn remove_grouping_tuples_for_group(&self, group: &str) -> Result<()> {
        let mut guard = self.snapshot.write().await;
        let snapshot = Self::loaded(&self.store, &mut guard).await?;
        let removed = snapshot.remove_groupings_for_group(group);
        debug!("Removed {} grouping edges for group '{}'", removed, group);

        self.flush_and_broadcast(snapshot).await
    }

    /// Current policy rules, for introspection and tests
    pub async fn policies(&self) -> Result<Vec<PolicyTuple>> {
        let mut guard = self.snapshot.write().await;
        let snapshot = Self::loaded(&self.store, &mut guard).await?;
        Ok(snapshot.policies().to_vec())
    }

    /// Grouping edges whose member matches
    pub async fn groupings_for_member(&self, member: &str) -> Result<Vec<GroupingTuple>> {
        let mut guard = self.snapshot.write().await;
        let snapshot = Self::loaded(&self.store, &mut guard).await?;
        Ok(snapshot.groupings_for_member(member))
    }

    /// Grouping edges whose group matches
    pub async fn groupings_for_group(&self, group: &str) -> Result<Vec<GroupingTuple>> {
        let mut guard = self.snapshot.write().await;
        let snapshot = Self::loaded(&self.store, &mut guard).await?;
        Ok(snapshot.groupings_for_group(group))
    }

    /// Spawn the change listener: reload on every event published by a
    /// peer replica, skipping events this replica originated.
    pub async fn start_change_listener(self: &Arc<Self>) -> Result<JoinHandle<()>> {
        let mut stream = self.store.subscribe_changes().await?;
        let engine = Arc::clone(self);
        info!("Starting policy change listener, replica {}", engine.replica_id);

        Ok(tokio::spawn(async move {
            while let Some(event) = stream.next().await {
                if event.origin == engine.replica_id {
                    debug!("Skipping change event originated by this replica");
                    continue;
                }
                debug!("Change event from replica {}, reloading", event.origin);
                if let Err(err) = engine.reload().await {
                    warn!("Reload after change event failed: {}", err);
                }
            }
            info!("Policy change stream closed");
        }))
    }

    /// Spawn the periodic full resync. Change delivery is at-most-once, so
    /// this schedule is the convergence fallback for missed events.
    pub fn start_resync(self: &Arc<Self>, interval: Duration) -> JoinHandle<()> {
        let engine = Arc::clone(self);
        info!("Starting policy resync every {:?}", interval);

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            // The first tick completes immediately; the cold-start load
            // already covers that point in time.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                if let Err(err) = engine.reload().await {
                    warn!("Periodic policy resync failed: {}", err);
                }
            }
        })
    }

    async fn load_set(store: &Arc<dyn PolicyStore>) -> Result<PolicySet> {
        store
            .load()
            .await
            .map_err(|err| AuthzError::enforcement(format!("policy store load failed: {err}")))
    }

    async fn loaded<'a>(
        store: &Arc<dyn PolicyStore>,
        guard: &'a mut Option<PolicySnapshot>,
    ) -> Result<&'a mut PolicySnapshot> {
        if guard.is_none() {
            let set = Self::load_set(store).await?;
            debug!(
                "Cold-start policy load: {} policies, {} groupings",
                set.policies.len(),
                set.groupings.len()
            );
            *guard = Some(PolicySnapshot::from_set(set));
        }
        match guard.as_mut() {
            Some(snapshot) => Ok(snapshot),
            None => Err(AuthzError::enforcement("policy snapshot missing after load")),
        }
    }

    /// Steps (b) and (c) of the mutation contract: flush the whole set,
    /// then broadcast. The snapshot already carries the mutation, so a
    /// flush failure leaves this replica ahead of the store; see the
    /// module docs.
    async fn flush_and_broadcast(&self, snapshot: &PolicySnapshot) -> Result<()> {
        self.store.save(&snapshot.to_set()).await?;

        let event = ChangeEvent::new(self.replica_id);
        if let Err(err) = self.store.publish_change(&event).await {
            warn!(
                "Change broadcast failed, peers converge on their next resync: {}",
                err
            );
        }
        Ok(())
    }
}
