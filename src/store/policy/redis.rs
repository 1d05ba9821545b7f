//! Redis-backed policy store
//!
//! Tuples live in two Redis sets, `<prefix>:p` for policies and
//! `<prefix>:g` for groupings, one JSON document per member. A save
//! replaces both sets inside a MULTI/EXEC block so replicas never observe
//! a half-written state. Invalidation events travel over the
//! `<prefix>:changes` channel. Every command runs under a bounded timeout
//! and surfaces as a retryable error when it expires.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use futures::stream::BoxStream;
use redis::{AsyncCommands, Client, aio::MultiplexedConnection};
use tracing::{debug, info, warn};

use crate::config::RedisConfig;
use crate::model::{GroupingTuple, PolicySet, PolicyTuple};
use crate::store::policy::{ChangeEvent, PolicyStore};
use crate::utils::error::{AuthzError, Result};
use crate::utils::logging::sanitize_url;

fn policy_key(prefix: &str) -> String {
    format!("{prefix}:p")
}

fn grouping_key(prefix: &str) -> String {
    format!("{prefix}:g")
}

fn change_channel(prefix: &str) -> String {
    format!("{prefix}:changes")
}

/// Policy store shared by all engine replicas through Redis
#[derive(Debug, Clone)]
pub struct RedisPolicyStore {
    /// Client handle, kept for opening dedicated pub/sub connections
    client: Client,
    /// Multiplexed connection used for regular commands
    conn: MultiplexedConnection,
    /// Prefix for tuple set keys and the change channel
    key_prefix: String,
    /// Per-operation deadline
    op_timeout: Duration,
}

impl RedisPolicyStore {
    /// Connect to Redis and build the store
    pub async fn new(config: &RedisConfig) -> Result<Self> {
        info!("Creating Redis policy store");
        debug!("Redis URL: {}", sanitize_url(&config.url));

        let client = Client::open(config.url.as_str()).map_err(AuthzError::Redis)?;

        let connect_timeout = Duration::from_secs(config.connection_timeout);
        let conn = tokio::time::timeout(
            connect_timeout,
            client.get_multiplexed_async_connection(),
        )
        .await
        .map_err(|_| AuthzError::timeout(format!("redis connect after {connect_timeout:?}")))?
        .map_err(AuthzError::Redis)?;

        info!("Redis policy store created successfully");
        Ok(Self {
            client,
            conn,
            key_prefix: config.key_prefix.clone(),
            op_timeout: Duration::from_secs(config.operation_timeout),
        })
    }

    fn policy_key(&self) -> String {
        policy_key(&self.key_prefix)
    }

    fn grouping_key(&self) -> String {
        grouping_key(&self.key_prefix)
    }

    fn change_channel(&self) -> String {
        change_channel(&self.key_prefix)
    }

    /// Run a Redis future under the per-operation deadline
    async fn bounded<T, F>(&self, what: &str, fut: F) -> Result<T>
    where
        F: Future<Output = redis::RedisResult<T>> + Send,
    {
        match tokio::time::timeout(self.op_timeout, fut).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(err)) => Err(AuthzError::Redis(err)),
            Err(_) => Err(AuthzError::timeout(format!(
                "redis {what} after {:?}",
                self.op_timeout
            ))),
        }
    }
}

#[async_trait]
impl PolicyStore for RedisPolicyStore {
    async fn load(&self) -> Result<PolicySet> {
        let mut conn = self.conn.clone();

        let policies_raw: Vec<String> = self
            .bounded("load policies", conn.smembers(self.policy_key()))
            .await?;
        let groupings_raw: Vec<String> = self
            .bounded("load groupings", conn.smembers(self.grouping_key()))
            .await?;

        let mut policies = Vec::with_capacity(policies_raw.len());
        for raw in &policies_raw {
            policies.push(serde_json::from_str::<PolicyTuple>(raw)?);
        }
        let mut groupings = Vec::with_capacity(groupings_raw.len());
        for raw in &groupings_raw {
            groupings.push(serde_json::from_str::<GroupingTuple>(raw)?);
        }

        debug!(
            "Loaded {} policies and {} groupings from redis",
            policies.len(),
            groupings.len()
        );
        Ok(PolicySet::new(policies, groupings))
    }

    async fn save(&self, set: &PolicySet) -> Result<()> {
        let mut policy_members = Vec::with_capacity(set.policies.len());
        for tuple in &set.policies {
            policy_members.push(serde_json::to_string(tuple)?);
        }
        let mut grouping_members = Vec::with_capacity(set.groupings.len());
        for edge in &set.groupings {
            grouping_members.push(serde_json::to_string(edge)?);
        }

        let mut pipe = redis::pipe();
        pipe.atomic();
        pipe.del(self.policy_key()).ignore();
        pipe.del(self.grouping_key()).ignore();
        // SADD with no members is a protocol error, so empty sets stay
        // as plain deletes.
        if !policy_members.is_empty() {
            pipe.sadd(self.policy_key(), policy_members).ignore();
        }
        if !grouping_members.is_empty() {
            pipe.sadd(self.grouping_key(), grouping_members).ignore();
        }

        let mut conn = self.conn.clone();
        let _: () = self
            .bounded("save tuple sets", pipe.query_async(&mut conn))
            .await?;

        debug!(
            "Saved {} policies and {} groupings to redis",
            set.policies.len(),
            set.groupings.len()
        );
        Ok(())
    }

    async fn publish_change(&self, event: &ChangeEvent) -> Result<()> {
        let payload = serde_json::to_string(event)?;
        let mut conn = self.conn.clone();
        let _: () = self
            .bounded("publish change", conn.publish(self.change_channel(), payload))
            .await?;
        Ok(())
    }

    async fn subscribe_changes(&self) -> Result<BoxStream<'static, ChangeEvent>> {
        let mut pubsub = self.client.get_async_pubsub().await.map_err(AuthzError::Redis)?;
        pubsub
            .subscribe(self.change_channel())
            .await
            .map_err(AuthzError::Redis)?;
        info!(
            "Subscribed to policy change channel '{}'",
            self.change_channel()
        );

        let stream = pubsub
            .into_on_message()
            .filter_map(|msg| async move {
                match msg.get_payload::<String>() {
                    Ok(payload) => match serde_json::from_str::<ChangeEvent>(&payload) {
                        Ok(event) => Some(event),
                        Err(err) => {
                            warn!("Ignoring malformed change event: {}", err);
                            None
                        }
                    },
                    Err(err) => {
                        warn!("Ignoring unreadable change message: {}", err);
                        None
                    }
                }
            })
            .boxed();
        Ok(stream)
    }

    async fn health_check(&self) -> Result<()> {
        let mut conn = self.conn.clone();
        let _: String = self
            .bounded("ping", redis::cmd("PING").query_async(&mut conn))
            .await?;
        debug!("Redis health check passed");
        Ok(())
    }
}
