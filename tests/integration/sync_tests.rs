//! Cross-store saga integration tests
//!
//! Drives `RoleManager` against a real SQLite hierarchy store and an
//! in-memory policy store, with failure injection on either side to
//! exercise the compensation paths.

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use rolegate::{
        AccessRequest, AuthzError, PolicyEngine, PolicyTuple, RoleManager, RoleStatus, RoleStore,
    };

    use crate::common::TestDatabase;
    use crate::common::fixtures::{
        FlakyPolicyStore, FlakyRoleStore, seed_reporting_roles, test_engine,
    };

    async fn setup() -> (TestDatabase, Arc<FlakyRoleStore>, Arc<PolicyEngine>, RoleManager) {
        let db = TestDatabase::new().await;
        let roles = Arc::new(FlakyRoleStore::new(db.store_arc()));
        let (engine, _) = test_engine();
        let manager = RoleManager::new(roles.clone(), engine.clone());
        (db, roles, engine, manager)
    }

    /// Grouping edges for a member, as sorted group codes
    async fn member_groups(engine: &PolicyEngine, member: &str) -> Vec<String> {
        let mut groups: Vec<String> = engine
            .groupings_for_member(member)
            .await
            .unwrap()
            .into_iter()
            .map(|edge| edge.group)
            .collect();
        groups.sort();
        groups
    }

    fn sorted(mut list: Vec<String>) -> Vec<String> {
        list.sort();
        list
    }

    /// A user linked to a role passes checks covered by the role's
    /// inherited capabilities, across both grouping hops
    #[tokio::test]
    async fn test_set_role_inherits_grants_reach() {
        let (_db, _roles, engine, manager) = setup().await;
        seed_reporting_roles(&manager).await;

        engine
            .add_policies(&[PolicyTuple::new(
                "internal.report.read",
                "svc",
                "/report",
                "GET",
            )])
            .await
            .unwrap();
        manager
            .set_user_roles("u:1", &["manager".to_string()])
            .await
            .unwrap();

        assert_eq!(
            sorted(manager.list_role_inherits("manager").await.unwrap()),
            vec![
                "internal.report.read".to_string(),
                "internal.report.write".to_string(),
            ]
        );

        let allowed = engine
            .enforce(&AccessRequest::new("u:1", "svc", "/report", "GET"))
            .await
            .unwrap();
        assert!(allowed);

        let denied = engine
            .enforce(&AccessRequest::new("u:1", "svc", "/budget", "GET"))
            .await
            .unwrap();
        assert!(!denied);
    }

    /// Replacing an edge set twice leaves exactly the second set
    #[tokio::test]
    async fn test_wholesale_replacement_leaves_no_residue() {
        let (_db, _roles, engine, manager) = setup().await;
        seed_reporting_roles(&manager).await;

        manager
            .set_role_inherits("manager", &["internal.report.read".to_string()])
            .await
            .unwrap();

        assert_eq!(
            manager.list_role_inherits("manager").await.unwrap(),
            vec!["internal.report.read".to_string()]
        );
        assert_eq!(
            member_groups(&engine, "manager").await,
            vec!["internal.report.read".to_string()]
        );
    }

    /// Validation failures mutate neither store
    #[tokio::test]
    async fn test_type_mismatch_leaves_both_stores_unchanged() {
        let (_db, _roles, engine, manager) = setup().await;
        seed_reporting_roles(&manager).await;

        let before_db = sorted(manager.list_role_inherits("manager").await.unwrap());
        let before_engine = member_groups(&engine, "manager").await;

        // Business role as an inherit target
        let err = manager
            .set_role_inherits("manager", &["guest".to_string()])
            .await
            .unwrap_err();
        assert!(matches!(err, AuthzError::Params(_)));

        // Internal role as the subject
        let err = manager
            .set_role_inherits("internal.report.read", &[])
            .await
            .unwrap_err();
        assert!(matches!(err, AuthzError::Params(_)));

        // Internal role as a user assignment
        let err = manager
            .set_user_roles("u:1", &["internal.report.read".to_string()])
            .await
            .unwrap_err();
        assert!(matches!(err, AuthzError::Params(_)));

        // Unknown role as a user assignment
        let err = manager
            .set_user_roles("u:1", &["reviewer".to_string()])
            .await
            .unwrap_err();
        assert!(matches!(err, AuthzError::NotFound { .. }));

        assert_eq!(
            sorted(manager.list_role_inherits("manager").await.unwrap()),
            before_db
        );
        assert_eq!(member_groups(&engine, "manager").await, before_engine);
        assert!(manager.list_user_roles("u:1").await.unwrap().is_empty());
        assert!(member_groups(&engine, "u:1").await.is_empty());
    }

    /// Deleting a role removes every reference and all reach through it
    #[tokio::test]
    async fn test_delete_business_role_removes_reach() {
        let (_db, _roles, engine, manager) = setup().await;
        seed_reporting_roles(&manager).await;

        engine
            .add_policies(&[PolicyTuple::new(
                "internal.report.read",
                "svc",
                "/report",
                "GET",
            )])
            .await
            .unwrap();
        manager
            .set_user_roles("u:1", &["manager".to_string()])
            .await
            .unwrap();
        let request = AccessRequest::new("u:1", "svc", "/report", "GET");
        assert!(engine.enforce(&request).await.unwrap());

        manager.delete_business_role("manager").await.unwrap();

        assert!(manager.find_role("manager").await.unwrap().is_none());
        assert!(manager.list_role_inherits("manager").await.unwrap().is_empty());
        assert!(manager.list_user_roles("u:1").await.unwrap().is_empty());
        assert!(member_groups(&engine, "manager").await.is_empty());
        assert!(member_groups(&engine, "u:1").await.is_empty());
        assert!(!engine.enforce(&request).await.unwrap());
    }

    /// The administrator role and internal roles cannot be deleted
    #[tokio::test]
    async fn test_delete_guards() {
        let (_db, _roles, _engine, manager) = setup().await;
        seed_reporting_roles(&manager).await;

        let err = manager
            .delete_business_role("internal.report.read")
            .await
            .unwrap_err();
        assert!(err.to_string().contains("internal"));

        let err = manager.delete_business_role("administrator").await.unwrap_err();
        assert!(err.to_string().contains("cannot be deleted"));

        let err = manager.delete_business_role("reviewer").await.unwrap_err();
        assert!(matches!(err, AuthzError::NotFound { .. }));
    }

    /// A durable-store failure after the fast-store mutation rolls the
    /// fast store back to its prior state
    #[tokio::test]
    async fn test_user_role_compensation_restores_fast_store() {
        let (_db, roles, engine, manager) = setup().await;
        seed_reporting_roles(&manager).await;
        manager
            .set_user_roles("u:1", &["manager".to_string()])
            .await
            .unwrap();

        roles.fail_replace_user_roles(true);
        let err = manager
            .set_user_roles("u:1", &["guest".to_string()])
            .await
            .unwrap_err();
        assert!(err.is_retryable());

        // Fast store restored, durable store untouched
        assert_eq!(
            member_groups(&engine, "u:1").await,
            vec!["manager".to_string()]
        );
        assert_eq!(
            manager.list_user_roles("u:1").await.unwrap(),
            vec!["manager".to_string()]
        );

        // The same call succeeds once the store recovers
        roles.fail_replace_user_roles(false);
        manager
            .set_user_roles("u:1", &["guest".to_string()])
            .await
            .unwrap();
        assert_eq!(
            member_groups(&engine, "u:1").await,
            vec!["guest".to_string()]
        );
        assert_eq!(
            manager.list_user_roles("u:1").await.unwrap(),
            vec!["guest".to_string()]
        );
    }

    /// Same compensation shape for inherit edges
    #[tokio::test]
    async fn test_role_inherit_compensation_restores_fast_store() {
        let (_db, roles, engine, manager) = setup().await;
        seed_reporting_roles(&manager).await;

        roles.fail_replace_role_inherits(true);
        let err = manager
            .set_role_inherits("manager", &["internal.report.read".to_string()])
            .await
            .unwrap_err();
        assert!(err.is_retryable());

        assert_eq!(
            member_groups(&engine, "manager").await,
            vec![
                "internal.report.read".to_string(),
                "internal.report.write".to_string(),
            ]
        );
        assert_eq!(
            sorted(manager.list_role_inherits("manager").await.unwrap()),
            vec![
                "internal.report.read".to_string(),
                "internal.report.write".to_string(),
            ]
        );
    }

    /// A failed delete cascade restores edges in both directions
    #[tokio::test]
    async fn test_delete_compensation_restores_fast_store() {
        let (_db, roles, engine, manager) = setup().await;
        seed_reporting_roles(&manager).await;
        manager
            .set_user_roles("u:1", &["manager".to_string()])
            .await
            .unwrap();

        roles.fail_delete_cascade(true);
        let err = manager.delete_business_role("manager").await.unwrap_err();
        assert!(err.is_retryable());

        assert_eq!(
            member_groups(&engine, "manager").await,
            vec![
                "internal.report.read".to_string(),
                "internal.report.write".to_string(),
            ]
        );
        assert_eq!(
            member_groups(&engine, "u:1").await,
            vec!["manager".to_string()]
        );
        assert!(manager.find_role("manager").await.unwrap().is_some());
    }

    /// When compensation itself fails, the error escalates to a
    /// consistency error carrying both tuple sets
    #[tokio::test]
    async fn test_double_failure_escalates_to_consistency() {
        let db = TestDatabase::new().await;
        let roles = Arc::new(FlakyRoleStore::new(db.store_arc()));
        let policy = Arc::new(FlakyPolicyStore::new());
        let engine = Arc::new(PolicyEngine::new(policy.clone()));
        let manager = RoleManager::new(roles.clone(), engine.clone());

        roles
            .ensure_business_role("manager", "Manager", RoleStatus::Enabled)
            .await
            .unwrap();
        roles
            .ensure_business_role("guest", "Guest", RoleStatus::Enabled)
            .await
            .unwrap();
        manager
            .set_user_roles("u:1", &["manager".to_string()])
            .await
            .unwrap();

        roles.fail_replace_user_roles(true);
        // Let the saga's own two flushes through, then fail the
        // compensation flush
        policy.fail_saves_after(2);

        let err = manager
            .set_user_roles("u:1", &["guest".to_string()])
            .await
            .unwrap_err();
        assert_eq!(err.code(), "CONSISTENCY_ERROR");
        match err {
            AuthzError::Consistency {
                subject,
                attempted,
                previous,
            } => {
                assert_eq!(subject, "u:1");
                assert_eq!(attempted.len(), 1);
                assert_eq!(attempted[0].group, "guest");
                assert_eq!(previous.len(), 1);
                assert_eq!(previous[0].group, "manager");
            }
            other => panic!("expected Consistency, got {other:?}"),
        }

        // The durable store still holds the old assignment; the local
        // replica is stuck mid-compensation until an operator intervenes
        assert_eq!(
            manager.list_user_roles("u:1").await.unwrap(),
            vec!["manager".to_string()]
        );
        assert!(member_groups(&engine, "u:1").await.is_empty());
    }
}
