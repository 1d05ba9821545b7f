//! Route to policy compiler
//!
//! Turns the endpoint declarations from the YAML config into the default
//! policy tuple set submitted to the enforcement engine at startup. A route
//! guarded by a role is also granted to every role senior to it, so a
//! `manager` endpoint is reachable by `administrator` without a second
//! declaration.

use std::collections::HashSet;

use tracing::debug;

use crate::config::models::RouteConfig;
use crate::model::{PolicyTuple, SeniorityOrder};
use crate::utils::error::{AuthzError, Result};

/// Compile declared endpoints into policy tuples.
///
/// One tuple per (route, method, senior-or-equal role). An empty required
/// role expands to the whole seniority ordering, a public endpoint. Routes
/// flagged `tenant_scoped` match under any domain; the rest are pinned to
/// the service's own name. One extra tuple grants the most junior tier the
/// service's own `/{service}/*` namespace.
///
/// Unknown role names fail compilation; nothing is submitted anywhere from
/// here, the caller hands the result to the engine.
pub fn compile_route_policies(
    service: &str,
    routes: &[RouteConfig],
    seniority: &SeniorityOrder,
) -> Result<Vec<PolicyTuple>> {
    if service.is_empty() {
        return Err(AuthzError::params("service name must not be empty"));
    }

    let mut tuples = Vec::new();
    let mut seen = HashSet::new();

    for route in routes {
        if route.path.is_empty() {
            return Err(AuthzError::params("route path must not be empty"));
        }
        if route.methods.is_empty() {
            return Err(AuthzError::params(format!(
                "route '{}' declares no methods",
                route.path
            )));
        }
        let covering = seniority.covering_roles(&route.role)?;
        let domain = if route.tenant_scoped { "*" } else { service };
        for method in &route.methods {
            if method.is_empty() {
                return Err(AuthzError::params(format!(
                    "route '{}' declares an empty method",
                    route.path
                )));
            }
            for role in &covering {
                let tuple = PolicyTuple::new(role.clone(), domain, &route.path, method.clone());
                if seen.insert(tuple.clone()) {
                    tuples.push(tuple);
                }
            }
        }
    }

    // The most junior tier gets the service's own namespace
    let junior = seniority
        .roles()
        .last()
        .ok_or_else(|| AuthzError::params("role seniority must not be empty"))?;
    let namespace = PolicyTuple::new(junior.clone(), service, format!("/{service}/*"), "*");
    if seen.insert(namespace.clone()) {
        tuples.push(namespace);
    }

    debug!(
        "Compiled {} policy tuples from {} route declarations",
        tuples.len(),
        routes.len()
    );
    Ok(tuples)
}
