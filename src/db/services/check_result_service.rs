use crate::db::entities::{check_result, prelude::*};
use crate::db::models::ProbeError;
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, Set,
};

#[allow(clippy::too_many_arguments)]
pub async fn record_result(
    db: &DatabaseConnection,
    monitor_id: i32,
    region: &str,
    is_up: bool,
    latency_ms: Option<i32>,
    status_code: Option<i32>,
    error: Option<&ProbeError>,
) -> Result<check_result::Model, DbErr> {
    let error_json = error
        .map(serde_json::to_value)
        .transpose()
        .map_err(|e| DbErr::Custom(format!("Failed to serialize probe error: {}", e)))?;

    let result = check_result::ActiveModel {
        monitor_id: Set(monitor_id),
        time: Set(Utc::now()),
        region: Set(region.to_string()),
        is_up: Set(is_up),
        latency_ms: Set(latency_ms),
        status_code: Set(status_code),
        error: Set(error_json),
        ..Default::default()
    };
    result.insert(db).await
}

pub async fn count_in_range(
    db: &DatabaseConnection,
    monitor_id: i32,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Result<u64, DbErr> {
    CheckResult::find()
        .filter(check_result::Column::MonitorId.eq(monitor_id))
        .filter(check_result::Column::Time.gte(start))
        .filter(check_result::Column::Time.lt(end))
        .count(db)
        .await
}

pub async fn count_down_in_range(
    db: &DatabaseConnection,
    monitor_id: i32,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Result<u64, DbErr> {
    CheckResult::find()
        .filter(check_result::Column::MonitorId.eq(monitor_id))
        .filter(check_result::Column::IsUp.eq(false))
        .filter(check_result::Column::Time.gte(start))
        .filter(check_result::Column::Time.lt(end))
        .count(db)
        .await
}
