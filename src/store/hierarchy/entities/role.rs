use sea_orm::Set;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::model::{RoleKind, RoleStatus};
use crate::store::hierarchy::RoleRecord;
use crate::utils::error::Result as AuthzResult;

/// Role database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "roles")]
pub struct Model {
    /// Row id
    #[sea_orm(primary_key)]
    pub id: i64,

    /// Role code (unique)
    #[sea_orm(unique)]
    pub code: String,

    /// Display name
    pub name: String,

    /// Role kind ("internal" or "business"), immutable once set
    pub kind: String,

    /// Role status ("enabled" or "disabled")
    pub status: String,

    /// Creation timestamp
    pub created_at: DateTimeWithTimeZone,

    /// Last update timestamp
    pub updated_at: DateTimeWithTimeZone,
}

/// Role entity relations
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Convert the row to the domain record, rejecting rows whose stored
    /// kind or status does not parse
    pub fn to_domain(&self) -> AuthzResult<RoleRecord> {
        Ok(RoleRecord {
            code: self.code.clone(),
            name: self.name.clone(),
            kind: RoleKind::parse(&self.kind)?,
            status: RoleStatus::parse(&self.status)?,
        })
    }

    /// Build an active model for inserting a new role row
    pub fn for_insert(code: &str, name: &str, kind: RoleKind, status: RoleStatus) -> ActiveModel {
        let now = chrono::Utc::now();
        ActiveModel {
            code: Set(code.to_string()),
            name: Set(name.to_string()),
            kind: Set(kind.as_str().to_string()),
            status: Set(status.as_str().to_string()),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
            ..Default::default()
        }
    }
}
