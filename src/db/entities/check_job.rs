use crate::db::enums::CheckJobStatus;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// One "run this monitor's check now" unit of work. Durable so that jobs
/// survive a process restart; delivery is at-least-once.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "check_jobs")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub monitor_id: i32,
    pub status: CheckJobStatus,
    pub attempts: i32,
    pub created_at: ChronoDateTimeUtc,
    pub updated_at: ChronoDateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
