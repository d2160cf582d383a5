use crate::db::entities::{incident, prelude::*};
use crate::db::enums::IncidentStatus;
use chrono::{DateTime, Utc};
use sea_orm::{ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, QueryOrder};

/// The single unresolved incident for a monitor, if one exists. The state
/// machine never opens a second incident while one is outstanding.
pub async fn find_open_for_monitor(
    db: &DatabaseConnection,
    monitor_id: i32,
) -> Result<Option<incident::Model>, DbErr> {
    Incident::find()
        .filter(incident::Column::MonitorId.eq(monitor_id))
        .filter(incident::Column::Status.ne(IncidentStatus::Resolved))
        .order_by_desc(incident::Column::StartedAt)
        .one(db)
        .await
}

pub async fn get_incident_by_id(
    db: &DatabaseConnection,
    incident_id: i32,
) -> Result<Option<incident::Model>, DbErr> {
    Incident::find_by_id(incident_id).one(db).await
}

/// Incidents touching any of the given monitors that either started after
/// `since` or are still unresolved. Used for the status page history feed.
pub async fn recent_for_monitors(
    db: &DatabaseConnection,
    monitor_ids: &[i32],
    since: DateTime<Utc>,
) -> Result<Vec<incident::Model>, DbErr> {
    if monitor_ids.is_empty() {
        return Ok(Vec::new());
    }
    Incident::find()
        .filter(incident::Column::MonitorId.is_in(monitor_ids.iter().copied()))
        .filter(
            sea_orm::Condition::any()
                .add(incident::Column::StartedAt.gte(since))
                .add(incident::Column::Status.ne(IncidentStatus::Resolved)),
        )
        .order_by_desc(incident::Column::StartedAt)
        .all(db)
        .await
}
