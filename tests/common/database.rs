//! Test database utilities
//!
//! Provides in-memory SQLite databases for testing without external
//! dependencies. Each test gets an isolated, migrated instance.

use std::sync::Arc;

use rolegate::DbRoleStore;
use rolegate::config::DatabaseConfig;

/// Test database wrapper providing isolated in-memory SQLite instances
#[derive(Debug, Clone)]
pub struct TestDatabase {
    inner: Arc<DbRoleStore>,
}

impl TestDatabase {
    /// Create a new migrated in-memory test database.
    ///
    /// Each call creates a completely isolated database instance.
    pub async fn new() -> Self {
        let store = DbRoleStore::new(&test_db_config())
            .await
            .expect("Failed to create in-memory test database");

        store
            .migrate()
            .await
            .expect("Failed to run database migrations");

        Self {
            inner: Arc::new(store),
        }
    }

    /// Get a reference to the underlying store
    pub fn store(&self) -> &DbRoleStore {
        &self.inner
    }

    /// Get an Arc to the underlying store
    pub fn store_arc(&self) -> Arc<DbRoleStore> {
        Arc::clone(&self.inner)
    }
}

/// Config for an in-memory SQLite store
pub fn test_db_config() -> DatabaseConfig {
    DatabaseConfig {
        url: "sqlite::memory:".to_string(),
        // In-memory DB only supports 1 connection
        max_connections: 1,
        connection_timeout: 5,
        auto_migrate: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rolegate::RoleStore;

    #[tokio::test]
    async fn test_database_creation() {
        let db = TestDatabase::new().await;
        // Database should be created and migrations run
        assert!(db.store().health_check().await.is_ok());
    }
}
