//! Enforcement engine integration tests
//!
//! Exercises enforcement, the mutation flush contract, and cross-replica
//! change propagation against the in-memory policy store.

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use rolegate::{
        AccessRequest, MemoryPolicyStore, PolicyEngine, PolicySet, PolicyStore, PolicyTuple,
    };

    use crate::common::fixtures::test_engine;

    fn request(subject: &str, domain: &str, object: &str, action: &str) -> AccessRequest {
        AccessRequest::new(subject, domain, object, action)
    }

    /// Wait until the engine allows the request or the deadline passes
    async fn wait_for_allow(engine: &PolicyEngine, req: &AccessRequest) -> bool {
        let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
        while tokio::time::Instant::now() < deadline {
            if engine.enforce(req).await.unwrap_or(false) {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        false
    }

    /// Cold start lazily loads the snapshot from the backing store
    #[tokio::test]
    async fn test_cold_start_loads_from_store() {
        let store = Arc::new(MemoryPolicyStore::new());
        let set = PolicySet::new(
            vec![PolicyTuple::new("manager", "svc", "/report", "GET")],
            vec![],
        );
        store.save(&set).await.unwrap();

        let engine = PolicyEngine::new(store);
        assert!(
            engine
                .enforce(&request("manager", "svc", "/report", "GET"))
                .await
                .unwrap()
        );
        assert!(
            !engine
                .enforce(&request("guest", "svc", "/report", "GET"))
                .await
                .unwrap()
        );
    }

    /// Two engines over one store see each other's mutations after a reload
    #[tokio::test]
    async fn test_mutations_flow_through_store() {
        let store = Arc::new(MemoryPolicyStore::new());
        let writer = PolicyEngine::new(store.clone());
        let reader = PolicyEngine::new(store.clone());

        let req = request("u:1", "svc", "/report", "GET");
        assert!(!reader.enforce(&req).await.unwrap());

        writer
            .add_policies(&[PolicyTuple::new("manager", "svc", "/report", "GET")])
            .await
            .unwrap();
        writer.add_grouping_tuple("u:1", "manager").await.unwrap();

        // Still the stale snapshot until the reader reloads
        assert!(!reader.enforce(&req).await.unwrap());
        reader.reload().await.unwrap();
        assert!(reader.enforce(&req).await.unwrap());
    }

    /// The change listener invalidates a peer replica without manual reloads
    #[tokio::test]
    async fn test_change_listener_invalidates_peer() {
        let store = Arc::new(MemoryPolicyStore::new());
        let writer = PolicyEngine::new(store.clone());
        let reader = Arc::new(PolicyEngine::new(store.clone()));

        let req = request("manager", "svc", "/report", "GET");
        assert!(!reader.enforce(&req).await.unwrap());
        let listener = reader.start_change_listener().await.unwrap();

        writer
            .add_policies(&[PolicyTuple::new("manager", "svc", "/report", "GET")])
            .await
            .unwrap();

        assert!(wait_for_allow(&reader, &req).await);
        listener.abort();
    }

    /// A failed durability flush is retryable and leaves the local replica
    /// serving the newer state
    #[tokio::test]
    async fn test_save_failure_is_retryable_and_replica_stays_ahead() {
        let (engine, store) = test_engine();
        let req = request("manager", "svc", "/report", "GET");
        assert!(!engine.enforce(&req).await.unwrap());

        store.fail_saves(true);
        let err = engine
            .add_policies(&[PolicyTuple::new("manager", "svc", "/report", "GET")])
            .await
            .unwrap_err();
        assert!(err.is_retryable());

        // The local snapshot already has the policy
        assert!(engine.enforce(&req).await.unwrap());

        // A fresh replica sees nothing until a later flush succeeds
        let fresh = PolicyEngine::new(store.clone());
        assert!(!fresh.enforce(&req).await.unwrap());

        store.fail_saves(false);
        engine.add_grouping_tuple("u:1", "manager").await.unwrap();
        fresh.reload().await.unwrap();
        assert!(fresh.enforce(&req).await.unwrap());
    }

    /// A cold engine surfaces a load failure as an enforcement error
    #[tokio::test]
    async fn test_cold_load_failure_is_enforcement_error() {
        let (engine, store) = test_engine();
        store.fail_loads(true);

        let err = engine
            .enforce(&request("manager", "svc", "/report", "GET"))
            .await
            .unwrap_err();
        assert_eq!(err.code(), "ENFORCEMENT_ERROR");

        // Once the store recovers, checks return definitive booleans again
        store.fail_loads(false);
        assert!(
            !engine
                .enforce(&request("manager", "svc", "/report", "GET"))
                .await
                .unwrap()
        );
    }

    /// The periodic resync converges a replica that missed change events
    #[tokio::test]
    async fn test_resync_converges_without_events() {
        let store = Arc::new(MemoryPolicyStore::new());
        let engine = Arc::new(PolicyEngine::new(store.clone()));

        let req = request("manager", "svc", "/report", "GET");
        assert!(!engine.enforce(&req).await.unwrap());

        // Write to the store behind the engine's back
        let set = PolicySet::new(
            vec![PolicyTuple::new("manager", "svc", "/report", "GET")],
            vec![],
        );
        store.save(&set).await.unwrap();

        let resync = engine.start_resync(Duration::from_millis(20));
        assert!(wait_for_allow(&engine, &req).await);
        resync.abort();
    }
}
