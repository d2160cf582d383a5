use crate::db::entities::{integration, notification_binding, prelude::*};
use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, Set};

/// Every channel bound to a monitor, with its integration record. Bindings
/// whose integration has been deleted out from under them are skipped by the
/// dispatcher, so the integration side is optional here.
pub async fn bindings_for_monitor(
    db: &DatabaseConnection,
    monitor_id: i32,
) -> Result<Vec<(notification_binding::Model, Option<integration::Model>)>, DbErr> {
    NotificationBinding::find()
        .filter(notification_binding::Column::MonitorId.eq(monitor_id))
        .find_also_related(Integration)
        .all(db)
        .await
}

/// Creates a binding unless an identical one already exists. The
/// (monitor, integration) pair is unique; re-binding is a no-op that returns
/// the existing row.
pub async fn ensure_binding(
    db: &DatabaseConnection,
    user_id: i32,
    monitor_id: i32,
    integration_id: i32,
) -> Result<notification_binding::Model, DbErr> {
    let existing = NotificationBinding::find()
        .filter(notification_binding::Column::MonitorId.eq(monitor_id))
        .filter(notification_binding::Column::IntegrationId.eq(integration_id))
        .one(db)
        .await?;
    if let Some(binding) = existing {
        return Ok(binding);
    }

    let binding = notification_binding::ActiveModel {
        user_id: Set(user_id),
        monitor_id: Set(monitor_id),
        integration_id: Set(integration_id),
        created_at: Set(Utc::now()),
        ..Default::default()
    };
    binding.insert(db).await
}

pub async fn get_owner_email(
    db: &DatabaseConnection,
    user_id: i32,
) -> Result<Option<String>, DbErr> {
    Ok(User::find_by_id(user_id).one(db).await?.map(|u| u.email))
}
