//! Role hierarchy store integration tests
//!
//! Tests the sea-orm store against real in-memory SQLite databases,
//! including the migration path.

#[cfg(test)]
mod tests {
    use rolegate::{AuthzError, RoleKind, RoleStatus, RoleStore};

    use crate::common::TestDatabase;

    fn codes(mut list: Vec<String>) -> Vec<String> {
        list.sort();
        list
    }

    /// Provisioning an internal role twice yields one row
    #[tokio::test]
    async fn test_ensure_internal_role_is_idempotent() {
        let db = TestDatabase::new().await;
        let store = db.store();

        let first = store.ensure_internal_role("report", "read").await.unwrap();
        let second = store.ensure_internal_role("report", "read").await.unwrap();

        assert_eq!(first, second);
        assert_eq!(first.code, "internal.report.read");
        assert_eq!(first.kind, RoleKind::Internal);

        let internals = store.list_roles_by_kind(RoleKind::Internal).await.unwrap();
        assert_eq!(internals.len(), 1);
    }

    /// Invalid (resource, action) pairs are rejected before touching the
    /// database
    #[tokio::test]
    async fn test_ensure_internal_role_rejects_bad_params() {
        let db = TestDatabase::new().await;
        let store = db.store();

        let err = store.ensure_internal_role("report", "delete").await.unwrap_err();
        assert!(matches!(err, AuthzError::Params(_)));

        let err = store.ensure_internal_role("", "read").await.unwrap_err();
        assert!(matches!(err, AuthzError::Params(_)));

        let err = store.ensure_internal_role("Bad Slug", "read").await.unwrap_err();
        assert!(matches!(err, AuthzError::Params(_)));

        assert!(
            store
                .list_roles_by_kind(RoleKind::Internal)
                .await
                .unwrap()
                .is_empty()
        );
    }

    /// Business role provisioning refuses the internal namespace and is
    /// idempotent for existing rows
    #[tokio::test]
    async fn test_ensure_business_role_guards_and_idempotency() {
        let db = TestDatabase::new().await;
        let store = db.store();

        let err = store
            .ensure_business_role("internal.report.read", "Sneaky", RoleStatus::Enabled)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("internal"));

        let first = store
            .ensure_business_role("editor", "Editor", RoleStatus::Enabled)
            .await
            .unwrap();
        // A second ensure returns the existing row unchanged
        let second = store
            .ensure_business_role("editor", "Different Name", RoleStatus::Disabled)
            .await
            .unwrap();
        assert_eq!(first, second);
        assert_eq!(second.name, "Editor");
        assert_eq!(second.status, RoleStatus::Enabled);
    }

    /// Updates change name and status but never the kind
    #[tokio::test]
    async fn test_update_business_role() {
        let db = TestDatabase::new().await;
        let store = db.store();

        let err = store
            .update_business_role("missing", Some("X"), None)
            .await
            .unwrap_err();
        assert!(matches!(err, AuthzError::NotFound { .. }));

        store
            .ensure_business_role("editor", "Editor", RoleStatus::Enabled)
            .await
            .unwrap();
        let updated = store
            .update_business_role("editor", Some("Content Editor"), Some(RoleStatus::Disabled))
            .await
            .unwrap();
        assert_eq!(updated.name, "Content Editor");
        assert_eq!(updated.status, RoleStatus::Disabled);
        assert_eq!(updated.kind, RoleKind::Business);

        // Internal roles are not reachable through the business update path
        store.ensure_internal_role("report", "read").await.unwrap();
        let err = store
            .update_business_role("internal.report.read", Some("X"), None)
            .await
            .unwrap_err();
        assert!(matches!(err, AuthzError::Params(_)));
    }

    /// Edge sets are replaced wholesale with no residue
    #[tokio::test]
    async fn test_replace_role_inherits_is_wholesale() {
        let db = TestDatabase::new().await;
        let store = db.store();

        store.ensure_internal_role("report", "read").await.unwrap();
        store.ensure_internal_role("report", "write").await.unwrap();
        store.ensure_internal_role("audit", "read").await.unwrap();
        store
            .ensure_business_role("manager", "Manager", RoleStatus::Enabled)
            .await
            .unwrap();

        let first = vec![
            "internal.report.read".to_string(),
            "internal.report.write".to_string(),
        ];
        store.replace_role_inherits("manager", &first).await.unwrap();
        assert_eq!(
            codes(store.list_role_inherits("manager").await.unwrap()),
            codes(first)
        );

        let second = vec!["internal.audit.read".to_string()];
        store.replace_role_inherits("manager", &second).await.unwrap();
        assert_eq!(
            store.list_role_inherits("manager").await.unwrap(),
            vec!["internal.audit.read".to_string()]
        );
    }

    /// Duplicate codes in the input collapse to one row
    #[tokio::test]
    async fn test_replace_dedupes_input() {
        let db = TestDatabase::new().await;
        let store = db.store();

        store.ensure_internal_role("report", "read").await.unwrap();
        store
            .ensure_business_role("manager", "Manager", RoleStatus::Enabled)
            .await
            .unwrap();

        let doubled = vec![
            "internal.report.read".to_string(),
            "internal.report.read".to_string(),
        ];
        store.replace_role_inherits("manager", &doubled).await.unwrap();
        assert_eq!(store.list_role_inherits("manager").await.unwrap().len(), 1);
    }

    /// Assignments replace wholesale and index both directions
    #[tokio::test]
    async fn test_replace_user_roles_and_assignees() {
        let db = TestDatabase::new().await;
        let store = db.store();

        store
            .ensure_business_role("manager", "Manager", RoleStatus::Enabled)
            .await
            .unwrap();
        store
            .ensure_business_role("guest", "Guest", RoleStatus::Enabled)
            .await
            .unwrap();

        store
            .replace_user_roles("u:1", &["manager".to_string(), "guest".to_string()])
            .await
            .unwrap();
        store
            .replace_user_roles("u:2", &["manager".to_string()])
            .await
            .unwrap();

        assert_eq!(
            codes(store.list_user_roles("u:1").await.unwrap()),
            vec!["guest".to_string(), "manager".to_string()]
        );
        assert_eq!(
            codes(store.list_assignees("manager").await.unwrap()),
            vec!["u:1".to_string(), "u:2".to_string()]
        );

        store
            .replace_user_roles("u:1", &["guest".to_string()])
            .await
            .unwrap();
        assert_eq!(
            store.list_assignees("manager").await.unwrap(),
            vec!["u:2".to_string()]
        );
    }

    /// The cascade removes edges, assignments, and the role row in one pass
    #[tokio::test]
    async fn test_delete_role_cascade() {
        let db = TestDatabase::new().await;
        let store = db.store();

        store.ensure_internal_role("report", "read").await.unwrap();
        store
            .ensure_business_role("manager", "Manager", RoleStatus::Enabled)
            .await
            .unwrap();
        store
            .replace_role_inherits("manager", &["internal.report.read".to_string()])
            .await
            .unwrap();
        store
            .replace_user_roles("u:1", &["manager".to_string()])
            .await
            .unwrap();

        store.delete_role_cascade("manager").await.unwrap();

        assert!(store.find_role("manager").await.unwrap().is_none());
        assert!(store.list_role_inherits("manager").await.unwrap().is_empty());
        assert!(store.list_assignees("manager").await.unwrap().is_empty());
        assert!(store.list_user_roles("u:1").await.unwrap().is_empty());
    }

    /// Health check passes against a migrated database
    #[tokio::test]
    async fn test_health_check() {
        let db = TestDatabase::new().await;
        assert!(db.store().health_check().await.is_ok());
    }
}
