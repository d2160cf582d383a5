use crate::db::enums::IncidentStatus;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "incidents")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(nullable)]
    pub monitor_id: Option<i32>,
    pub title: String,
    #[sea_orm(nullable)]
    pub description: Option<String>,
    pub status: IncidentStatus,
    pub severity: String,
    /// Json array of `db::models::TimelineEntry`.
    #[sea_orm(column_type = "JsonBinary")]
    pub timeline: Json,
    /// Json array of affected monitor ids.
    #[sea_orm(column_type = "JsonBinary")]
    pub affected_services: Json,
    pub started_at: ChronoDateTimeUtc,
    #[sea_orm(nullable)]
    pub resolved_at: Option<ChronoDateTimeUtc>,
    #[sea_orm(nullable)]
    pub root_cause: Option<String>,
    pub created_at: ChronoDateTimeUtc,
    pub updated_at: ChronoDateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn timeline_entries(&self) -> Vec<crate::db::models::TimelineEntry> {
        serde_json::from_value(self.timeline.clone()).unwrap_or_default()
    }

    pub fn affected_monitor_ids(&self) -> Vec<i32> {
        serde_json::from_value(self.affected_services.clone()).unwrap_or_default()
    }
}
