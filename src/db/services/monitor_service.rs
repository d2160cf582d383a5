use crate::db::entities::{check_job, check_result, incident, monitor, notification_binding, prelude::*};
use crate::db::enums::MonitorStatus;
use crate::db::services::status_page_service;
use chrono::{DateTime, Utc};
use sea_orm::{
    ColumnTrait, Condition, DatabaseConnection, DbErr, EntityTrait, QueryFilter, Set,
    TransactionTrait,
};
use tracing::info;

pub async fn get_monitor_by_id(
    db: &DatabaseConnection,
    monitor_id: i32,
) -> Result<Option<monitor::Model>, DbErr> {
    Monitor::find_by_id(monitor_id).one(db).await
}

pub async fn get_monitors_by_ids(
    db: &DatabaseConnection,
    monitor_ids: &[i32],
) -> Result<Vec<monitor::Model>, DbErr> {
    if monitor_ids.is_empty() {
        return Ok(Vec::new());
    }
    Monitor::find()
        .filter(monitor::Column::Id.is_in(monitor_ids.iter().copied()))
        .all(db)
        .await
}

pub async fn get_active_monitors(db: &DatabaseConnection) -> Result<Vec<monitor::Model>, DbErr> {
    Monitor::find()
        .filter(monitor::Column::Active.eq(true))
        .all(db)
        .await
}

/// Pauses a monitor: no more scheduled checks, status frozen at `paused`.
pub async fn mark_paused(
    db: &DatabaseConnection,
    monitor_id: i32,
) -> Result<Option<monitor::Model>, DbErr> {
    let Some(monitor) = Monitor::find_by_id(monitor_id).one(db).await? else {
        return Ok(None);
    };
    let now = Utc::now();
    let update = monitor::ActiveModel {
        id: Set(monitor.id),
        active: Set(false),
        status: Set(MonitorStatus::Paused),
        last_status_change: Set(Some(now)),
        updated_at: Set(now),
        ..Default::default()
    };
    Ok(Some(Monitor::update(update).exec(db).await?))
}

/// Resumes a paused monitor. The status is optimistically set to `up` with a
/// clean failure count; the immediate check the caller enqueues corrects it
/// within one cycle if the endpoint is actually down.
pub async fn mark_resumed(
    db: &DatabaseConnection,
    monitor_id: i32,
) -> Result<Option<monitor::Model>, DbErr> {
    let Some(monitor) = Monitor::find_by_id(monitor_id).one(db).await? else {
        return Ok(None);
    };
    let now = Utc::now();
    let update = monitor::ActiveModel {
        id: Set(monitor.id),
        active: Set(true),
        status: Set(MonitorStatus::Up),
        consecutive_fails: Set(0),
        last_status_change: Set(Some(now)),
        updated_at: Set(now),
        ..Default::default()
    };
    Ok(Some(Monitor::update(update).exec(db).await?))
}

/// Persists the outcome of one check cycle with a compare-and-set keyed on
/// the `last_check` value read at the start of the cycle. Returns false when
/// another execution won the write, in which case the caller must skip all
/// side effects for this cycle.
pub async fn apply_check_outcome(
    db: &DatabaseConnection,
    previous: &monitor::Model,
    new_status: MonitorStatus,
    consecutive_fails: i32,
    status_changed: bool,
    now: DateTime<Utc>,
) -> Result<bool, DbErr> {
    let mut update = monitor::ActiveModel {
        status: Set(new_status),
        consecutive_fails: Set(consecutive_fails),
        last_check: Set(Some(now)),
        updated_at: Set(now),
        ..Default::default()
    };
    if status_changed {
        update.last_status_change = Set(Some(now));
    }

    let mut guard = Condition::all().add(monitor::Column::Id.eq(previous.id));
    guard = match previous.last_check {
        Some(ts) => guard.add(monitor::Column::LastCheck.eq(ts)),
        None => guard.add(monitor::Column::LastCheck.is_null()),
    };

    let result = Monitor::update_many().set(update).filter(guard).exec(db).await?;
    Ok(result.rows_affected > 0)
}

/// Deletes a monitor and everything hanging off it: check results, bindings,
/// incidents, queued jobs, and the monitor's references inside status-page
/// sections. Returns the ids of the status pages that referenced it so the
/// caller can rebuild exactly those caches.
pub async fn delete_monitor_cascade(
    db: &DatabaseConnection,
    monitor_id: i32,
) -> Result<Vec<i32>, DbErr> {
    let referencing_pages = status_page_service::pages_referencing_monitor(db, monitor_id).await?;

    let txn = db.begin().await?;

    for page in &referencing_pages {
        let mut sections = page.sections();
        for section in &mut sections {
            section.monitors.retain(|m| m.monitor_id != monitor_id);
        }
        let update = crate::db::entities::status_page::ActiveModel {
            id: Set(page.id),
            monitor_sections: Set(serde_json::to_value(&sections).unwrap_or_default()),
            updated_at: Set(Utc::now()),
            ..Default::default()
        };
        StatusPage::update(update).exec(&txn).await?;
    }

    CheckResult::delete_many()
        .filter(check_result::Column::MonitorId.eq(monitor_id))
        .exec(&txn)
        .await?;
    NotificationBinding::delete_many()
        .filter(notification_binding::Column::MonitorId.eq(monitor_id))
        .exec(&txn)
        .await?;
    Incident::delete_many()
        .filter(incident::Column::MonitorId.eq(monitor_id))
        .exec(&txn)
        .await?;
    CheckJob::delete_many()
        .filter(check_job::Column::MonitorId.eq(monitor_id))
        .exec(&txn)
        .await?;
    Monitor::delete_by_id(monitor_id).exec(&txn).await?;

    txn.commit().await?;

    info!(
        monitor_id = monitor_id,
        page_count = referencing_pages.len(),
        "Deleted monitor and associated data."
    );

    Ok(referencing_pages.into_iter().map(|p| p.id).collect())
}
