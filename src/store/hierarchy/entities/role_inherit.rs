use sea_orm::Set;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Role inheritance edge database model.
///
/// A directed edge: `role_code` (a business role) inherits `inherit_code`
/// (an internal role). Internal roles never have outgoing edges, so the
/// graph is cycle-free by construction.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "role_inherits")]
pub struct Model {
    /// Row id
    #[sea_orm(primary_key)]
    pub id: i64,

    /// Business role code (edge source)
    pub role_code: String,

    /// Internal role code (edge target)
    pub inherit_code: String,

    /// Creation timestamp
    pub created_at: DateTimeWithTimeZone,
}

/// Role inheritance entity relations
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Build an active model for inserting a new edge row
    pub fn for_insert(role_code: &str, inherit_code: &str) -> ActiveModel {
        ActiveModel {
            role_code: Set(role_code.to_string()),
            inherit_code: Set(inherit_code.to_string()),
            created_at: Set(chrono::Utc::now().into()),
            ..Default::default()
        }
    }
}
