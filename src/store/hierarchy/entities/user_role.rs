use sea_orm::Set;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// User role assignment database model. `role_code` always references a
/// business role.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "user_roles")]
pub struct Model {
    /// Row id
    #[sea_orm(primary_key)]
    pub id: i64,

    /// User identifier
    pub uid: String,

    /// Business role code
    pub role_code: String,

    /// Creation timestamp
    pub created_at: DateTimeWithTimeZone,
}

/// User role assignment entity relations
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Build an active model for inserting a new assignment row
    pub fn for_insert(uid: &str, role_code: &str) -> ActiveModel {
        ActiveModel {
            uid: Set(uid.to_string()),
            role_code: Set(role_code.to_string()),
            created_at: Set(chrono::Utc::now().into()),
            ..Default::default()
        }
    }
}
