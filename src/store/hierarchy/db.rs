//! SeaORM-backed role hierarchy store
//!
//! One `DatabaseConnection` pool over SQLite or PostgreSQL. All multi-row
//! writes run inside a transaction so replacement and cascade semantics
//! hold even when the process dies mid-call.

use std::collections::HashSet;
use std::time::Duration;

use async_trait::async_trait;
use sea_orm::sea_query::OnConflict;
use sea_orm::*;
use sea_orm_migration::MigratorTrait;
use tracing::{debug, info, warn};

use crate::config::DatabaseConfig;
use crate::model::{
    InternalAction, RoleKind, RoleStatus, internal_role_code, validate_business_code,
};
use crate::store::hierarchy::migration::Migrator;
use crate::store::hierarchy::{RoleRecord, RoleStore, entities};
use crate::utils::error::{AuthzError, Result};
use crate::utils::logging::sanitize_url;

use entities::{role, role_inherit, user_role};

/// Role hierarchy store backed by a relational database
#[derive(Debug)]
pub struct DbRoleStore {
    db: DatabaseConnection,
}

impl DbRoleStore {
    /// Connect to the database described by the configuration
    pub async fn new(config: &DatabaseConfig) -> Result<Self> {
        info!("Creating role hierarchy store");
        debug!("Database URL: {}", sanitize_url(&config.url));

        let mut opt = ConnectOptions::new(config.url.clone());
        opt.max_connections(config.max_connections)
            .min_connections(1)
            .connect_timeout(Duration::from_secs(config.connection_timeout))
            .acquire_timeout(Duration::from_secs(30))
            .idle_timeout(Duration::from_secs(600))
            .max_lifetime(Duration::from_secs(3600))
            .sqlx_logging(true)
            .sqlx_logging_level(log::LevelFilter::Debug);

        let db = Database::connect(opt).await.map_err(AuthzError::Database)?;

        info!("Role hierarchy store connected");
        Ok(Self { db })
    }

    /// Run pending database migrations
    pub async fn migrate(&self) -> Result<()> {
        info!("Running role hierarchy migrations...");
        Migrator::up(&self.db, None).await.map_err(|e| {
            warn!("Migration failed: {}", e);
            AuthzError::Database(e)
        })?;
        info!("Role hierarchy migrations completed");
        Ok(())
    }

    /// Get the underlying database connection
    #[allow(dead_code)]
    pub fn connection(&self) -> &DatabaseConnection {
        &self.db
    }

    async fn find_model(&self, code: &str) -> Result<Option<role::Model>> {
        entities::Role::find()
            .filter(role::Column::Code.eq(code))
            .one(&self.db)
            .await
            .map_err(AuthzError::Database)
    }

    /// Insert a role row, treating a lost uniqueness race as success, then
    /// fetch whichever row won
    async fn insert_or_fetch(&self, active: role::ActiveModel, code: &str) -> Result<RoleRecord> {
        let outcome = entities::Role::insert(active)
            .on_conflict(
                OnConflict::column(role::Column::Code)
                    .do_nothing()
                    .to_owned(),
            )
            .exec(&self.db)
            .await;
        match outcome {
            Ok(_) | Err(DbErr::RecordNotInserted) => {}
            Err(err) => return Err(AuthzError::Database(err)),
        }

        match self.find_model(code).await? {
            Some(model) => model.to_domain(),
            None => Err(AuthzError::internal(format!(
                "role '{code}' missing after provisioning"
            ))),
        }
    }
}

fn dedupe(codes: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    codes
        .iter()
        .filter(|code| seen.insert(code.as_str()))
        .cloned()
        .collect()
}

#[async_trait]
impl RoleStore for DbRoleStore {
    async fn ensure_internal_role(&self, resource: &str, action: &str) -> Result<RoleRecord> {
        if resource.is_empty() != action.is_empty() {
            return Err(AuthzError::params(
                "internal role needs both a resource and an action",
            ));
        }
        let action = InternalAction::parse(action)?;
        let code = internal_role_code(resource, action)?;
        debug!("Ensuring internal role: {}", code);

        if let Some(model) = self.find_model(&code).await? {
            let record = model.to_domain()?;
            if record.kind != RoleKind::Internal {
                return Err(AuthzError::internal(format!(
                    "role '{code}' exists with kind '{}' inside the internal namespace",
                    record.kind
                )));
            }
            return Ok(record);
        }

        // The internal code is its own display name; a separate string
        // would only drift from the convention.
        let active = role::Model::for_insert(&code, &code, RoleKind::Internal, RoleStatus::Enabled);
        self.insert_or_fetch(active, &code).await
    }

    async fn ensure_business_role(
        &self,
        code: &str,
        name: &str,
        status: RoleStatus,
    ) -> Result<RoleRecord> {
        validate_business_code(code)?;
        if name.is_empty() {
            return Err(AuthzError::params("role name must not be empty"));
        }
        debug!("Ensuring business role: {}", code);

        if let Some(model) = self.find_model(code).await? {
            let record = model.to_domain()?;
            if record.kind != RoleKind::Business {
                return Err(AuthzError::internal(format!(
                    "role '{code}' exists with kind '{}' outside the internal namespace",
                    record.kind
                )));
            }
            return Ok(record);
        }

        let active = role::Model::for_insert(code, name, RoleKind::Business, status);
        self.insert_or_fetch(active, code).await
    }

    async fn update_business_role(
        &self,
        code: &str,
        name: Option<&str>,
        status: Option<RoleStatus>,
    ) -> Result<RoleRecord> {
        validate_business_code(code)?;
        debug!("Updating business role: {}", code);

        let model = self
            .find_model(code)
            .await?
            .ok_or_else(|| AuthzError::not_found("role", code))?;
        let record = model.to_domain()?;
        if record.kind != RoleKind::Business {
            return Err(AuthzError::params(format!(
                "role '{code}' is not a business role"
            )));
        }
        if name.is_none() && status.is_none() {
            return Ok(record);
        }

        let mut active: role::ActiveModel = model.into();
        if let Some(name) = name {
            if name.is_empty() {
                return Err(AuthzError::params("role name must not be empty"));
            }
            active.name = Set(name.to_string());
        }
        if let Some(status) = status {
            active.status = Set(status.as_str().to_string());
        }
        active.updated_at = Set(chrono::Utc::now().into());

        let updated = active.update(&self.db).await.map_err(AuthzError::Database)?;
        updated.to_domain()
    }

    async fn find_role(&self, code: &str) -> Result<Option<RoleRecord>> {
        let model = self.find_model(code).await?;
        model.map(|m| m.to_domain()).transpose()
    }

    async fn list_roles_by_kind(&self, kind: RoleKind) -> Result<Vec<RoleRecord>> {
        let models = entities::Role::find()
            .filter(role::Column::Kind.eq(kind.as_str()))
            .order_by_asc(role::Column::Code)
            .all(&self.db)
            .await
            .map_err(AuthzError::Database)?;
        models.iter().map(|m| m.to_domain()).collect()
    }

    async fn list_role_inherits(&self, role_code: &str) -> Result<Vec<String>> {
        let rows = entities::RoleInherit::find()
            .filter(role_inherit::Column::RoleCode.eq(role_code))
            .order_by_asc(role_inherit::Column::Id)
            .all(&self.db)
            .await
            .map_err(AuthzError::Database)?;
        Ok(rows.into_iter().map(|row| row.inherit_code).collect())
    }

    async fn list_user_roles(&self, uid: &str) -> Result<Vec<String>> {
        let rows = entities::UserRole::find()
            .filter(user_role::Column::Uid.eq(uid))
            .order_by_asc(user_role::Column::Id)
            .all(&self.db)
            .await
            .map_err(AuthzError::Database)?;
        Ok(rows.into_iter().map(|row| row.role_code).collect())
    }

    async fn list_assignees(&self, role_code: &str) -> Result<Vec<String>> {
        let rows = entities::UserRole::find()
            .filter(user_role::Column::RoleCode.eq(role_code))
            .order_by_asc(user_role::Column::Id)
            .all(&self.db)
            .await
            .map_err(AuthzError::Database)?;
        Ok(rows.into_iter().map(|row| row.uid).collect())
    }

    async fn replace_role_inherits(
        &self,
        role_code: &str,
        inherit_codes: &[String],
    ) -> Result<()> {
        let codes = dedupe(inherit_codes);
        debug!(
            "Replacing inherit set for role '{}' with {} edges",
            role_code,
            codes.len()
        );

        let txn = self.db.begin().await?;
        entities::RoleInherit::delete_many()
            .filter(role_inherit::Column::RoleCode.eq(role_code))
            .exec(&txn)
            .await?;
        if !codes.is_empty() {
            let rows = codes
                .iter()
                .map(|code| role_inherit::Model::for_insert(role_code, code));
            entities::RoleInherit::insert_many(rows)
                .exec(&txn)
                .await
                .map_err(|e| AuthzError::from_db(e, "role inherit edge"))?;
        }
        txn.commit().await?;
        Ok(())
    }

    async fn replace_user_roles(&self, uid: &str, role_codes: &[String]) -> Result<()> {
        let codes = dedupe(role_codes);
        debug!(
            "Replacing assignment set for uid '{}' with {} roles",
            uid,
            codes.len()
        );

        let txn = self.db.begin().await?;
        entities::UserRole::delete_many()
            .filter(user_role::Column::Uid.eq(uid))
            .exec(&txn)
            .await?;
        if !codes.is_empty() {
            let rows = codes
                .iter()
                .map(|code| user_role::Model::for_insert(uid, code));
            entities::UserRole::insert_many(rows)
                .exec(&txn)
                .await
                .map_err(|e| AuthzError::from_db(e, "user role assignment"))?;
        }
        txn.commit().await?;
        Ok(())
    }

    async fn delete_role_cascade(&self, code: &str) -> Result<()> {
        debug!("Deleting role '{}' with cascade", code);

        let txn = self.db.begin().await?;
        entities::RoleInherit::delete_many()
            .filter(role_inherit::Column::RoleCode.eq(code))
            .exec(&txn)
            .await?;
        entities::UserRole::delete_many()
            .filter(user_role::Column::RoleCode.eq(code))
            .exec(&txn)
            .await?;
        entities::Role::delete_many()
            .filter(role::Column::Code.eq(code))
            .exec(&txn)
            .await?;
        txn.commit().await?;
        Ok(())
    }

    async fn health_check(&self) -> Result<()> {
        debug!("Performing role store health check");

        let _result = entities::Role::find()
            .limit(1)
            .all(&self.db)
            .await
            .map_err(AuthzError::Database)?;

        debug!("Role store health check passed");
        Ok(())
    }
}
