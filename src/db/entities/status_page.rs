use crate::db::models::MonitorSection;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "status_pages")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub user_id: i32,
    pub name: String,
    #[sea_orm(unique)]
    pub slug: String,
    #[sea_orm(nullable)]
    pub description: Option<String>,
    #[sea_orm(column_type = "JsonBinary", nullable)]
    pub branding: Option<Json>,
    /// Json array of `db::models::MonitorSection`.
    #[sea_orm(column_type = "JsonBinary")]
    pub monitor_sections: Json,
    pub active: bool,
    pub created_at: ChronoDateTimeUtc,
    pub updated_at: ChronoDateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    User,

    #[sea_orm(has_one = "super::status_page_cache::Entity")]
    StatusPageCache,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl Related<super::status_page_cache::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::StatusPageCache.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn sections(&self) -> Vec<MonitorSection> {
        serde_json::from_value(self.monitor_sections.clone()).unwrap_or_default()
    }

    /// Ids of every monitor referenced anywhere on this page.
    pub fn referenced_monitor_ids(&self) -> Vec<i32> {
        let mut ids: Vec<i32> = self
            .sections()
            .iter()
            .flat_map(|s| s.monitors.iter().map(|m| m.monitor_id))
            .collect();
        ids.sort_unstable();
        ids.dedup();
        ids
    }
}
