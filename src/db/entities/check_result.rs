use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Append-only record of one probe attempt for one monitor in one region.
/// Rows are only ever removed by the monitor-deletion cascade.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "check_results")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub monitor_id: i32,
    pub time: ChronoDateTimeUtc,
    pub region: String,
    pub is_up: bool,
    #[sea_orm(nullable)]
    pub latency_ms: Option<i32>,
    #[sea_orm(nullable)]
    pub status_code: Option<i32>,
    #[sea_orm(column_type = "JsonBinary", nullable)]
    pub error: Option<Json>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::monitor::Entity",
        from = "Column::MonitorId",
        to = "super::monitor::Column::Id",
        on_delete = "Cascade"
    )]
    Monitor,
}

impl Related<super::monitor::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Monitor.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
