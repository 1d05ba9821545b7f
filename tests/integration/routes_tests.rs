//! Route compilation integration tests
//!
//! Compiles endpoint declarations and verifies enforcement through a real
//! engine, covering the seniority expansion and the namespace grant.

#[cfg(test)]
mod tests {
    use rolegate::config::RouteConfig;
    use rolegate::{AccessRequest, SeniorityOrder, compile_route_policies};

    use crate::common::fixtures::test_engine;

    fn declare(path: &str, methods: &[&str], role: &str, tenant_scoped: bool) -> RouteConfig {
        RouteConfig {
            path: path.to_string(),
            methods: methods.iter().map(|m| m.to_string()).collect(),
            role: role.to_string(),
            tenant_scoped,
        }
    }

    /// A manager endpoint admits managers and administrators, nobody junior
    #[tokio::test]
    async fn test_manager_route_admits_seniors_only() {
        let seniority = SeniorityOrder::default();
        let tuples = compile_route_policies(
            "svc",
            &[declare("/report", &["GET"], "manager", false)],
            &seniority,
        )
        .unwrap();

        let (engine, _) = test_engine();
        engine.add_policies(&tuples).await.unwrap();

        for (subject, expected) in [
            ("administrator", true),
            ("manager", true),
            ("editor", false),
            ("guest", false),
        ] {
            let allowed = engine
                .enforce(&AccessRequest::new(subject, "svc", "/report", "GET"))
                .await
                .unwrap();
            assert_eq!(allowed, expected, "subject '{subject}'");
        }

        // The declared method is part of the rule
        assert!(
            !engine
                .enforce(&AccessRequest::new("manager", "svc", "/report", "POST"))
                .await
                .unwrap()
        );
    }

    /// The namespace tuple grants the anonymous tier the service's own
    /// path prefix
    #[tokio::test]
    async fn test_namespace_grant_for_anonymous_tier() {
        let seniority = SeniorityOrder::default();
        let tuples = compile_route_policies("svc", &[], &seniority).unwrap();

        let (engine, _) = test_engine();
        engine.add_policies(&tuples).await.unwrap();

        assert!(
            engine
                .enforce(&AccessRequest::new("anonymous", "svc", "/svc/health", "GET"))
                .await
                .unwrap()
        );
        assert!(
            !engine
                .enforce(&AccessRequest::new("anonymous", "svc", "/other/health", "GET"))
                .await
                .unwrap()
        );
    }

    /// Tenant-scoped routes match under any domain; pinned routes only
    /// under the service's own name
    #[tokio::test]
    async fn test_tenant_scoped_routes_match_any_domain() {
        let seniority = SeniorityOrder::default();
        let tuples = compile_route_policies(
            "svc",
            &[
                declare("/tenants/:id/report", &["GET"], "manager", true),
                declare("/admin", &["POST"], "administrator", false),
            ],
            &seniority,
        )
        .unwrap();

        let (engine, _) = test_engine();
        engine.add_policies(&tuples).await.unwrap();

        assert!(
            engine
                .enforce(&AccessRequest::new(
                    "manager",
                    "tenant-7",
                    "/tenants/42/report",
                    "GET"
                ))
                .await
                .unwrap()
        );
        assert!(
            !engine
                .enforce(&AccessRequest::new("manager", "tenant-7", "/admin", "POST"))
                .await
                .unwrap()
        );
        assert!(
            engine
                .enforce(&AccessRequest::new("administrator", "svc", "/admin", "POST"))
                .await
                .unwrap()
        );
    }
}
