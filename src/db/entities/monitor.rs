use crate::db::enums::MonitorStatus;
use crate::db::models::MaintenanceWindow;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "monitors")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub user_id: i32,
    pub name: String,
    pub url: String,
    pub method: String,
    #[sea_orm(column_type = "JsonBinary", nullable)]
    pub headers: Option<Json>,
    #[sea_orm(nullable)]
    pub body: Option<String>,
    pub timeout_seconds: i32,
    pub interval_seconds: i32,
    /// Json array of region names this monitor is probed from.
    #[sea_orm(column_type = "JsonBinary")]
    pub regions: Json,
    /// Json array of accepted HTTP status codes; empty or null means any 2xx.
    #[sea_orm(column_type = "JsonBinary", nullable)]
    pub expected_status_codes: Option<Json>,
    pub status: MonitorStatus,
    pub consecutive_fails: i32,
    #[sea_orm(nullable)]
    pub last_check: Option<ChronoDateTimeUtc>,
    #[sea_orm(nullable)]
    pub last_status_change: Option<ChronoDateTimeUtc>,
    pub active: bool,
    #[sea_orm(column_type = "JsonBinary", nullable)]
    pub maintenance_windows: Option<Json>,
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

    #[sea_orm(has_many = "super::check_result::Entity")]
    CheckResult,

    #[sea_orm(has_many = "super::notification_binding::Entity")]
    NotificationBinding,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl Related<super::check_result::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CheckResult.def()
    }
}

impl Related<super::notification_binding::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::NotificationBinding.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Region list, falling back to a single default vantage point when the
    /// configuration carries none.
    pub fn region_list(&self) -> Vec<String> {
        let regions: Vec<String> = serde_json::from_value(self.regions.clone()).unwrap_or_default();
        if regions.is_empty() {
            vec!["default".to_string()]
        } else {
            regions
        }
    }

    pub fn header_map(&self) -> HashMap<String, String> {
        self.headers
            .as_ref()
            .and_then(|h| serde_json::from_value(h.clone()).ok())
            .unwrap_or_default()
    }

    /// Empty means "accept any 2xx".
    pub fn expected_codes(&self) -> Vec<u16> {
        self.expected_status_codes
            .as_ref()
            .and_then(|c| serde_json::from_value(c.clone()).ok())
            .unwrap_or_default()
    }

    pub fn maintenance_window_list(&self) -> Vec<MaintenanceWindow> {
        self.maintenance_windows
            .as_ref()
            .and_then(|w| serde_json::from_value(w.clone()).ok())
            .unwrap_or_default()
    }
}
