//! Incident lifecycle. Down transitions open incidents, up transitions
//! resolve them, and operators can append manual timeline updates.

use crate::db::entities::{incident, monitor};
use crate::db::enums::IncidentStatus;
use crate::db::models::TimelineEntry;
use crate::db::services::incident_service;
use crate::server::broadcaster::StatusBroadcaster;
use chrono::{DateTime, Utc};
use sea_orm::{ActiveModelTrait, DatabaseConnection, DbErr, IntoActiveModel, Set};
use std::sync::Arc;
use tracing::{debug, info};

const SYSTEM_AUTHOR: &str = "system";

pub struct IncidentManager {
    db: DatabaseConnection,
    broadcaster: Arc<StatusBroadcaster>,
}

impl IncidentManager {
    pub fn new(db: DatabaseConnection, broadcaster: Arc<StatusBroadcaster>) -> Self {
        Self { db, broadcaster }
    }

    /// Opens an incident for a monitor that just went down. At most one
    /// unresolved incident exists per monitor; repeated down cycles while one
    /// is open do nothing.
    pub async fn open_for_down(
        &self,
        monitor: &monitor::Model,
        root_cause: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<Option<incident::Model>, DbErr> {
        if let Some(existing) = incident_service::find_open_for_monitor(&self.db, monitor.id).await? {
            debug!(
                monitor_id = monitor.id,
                incident_id = existing.id,
                "Incident already open for monitor."
            );
            return Ok(None);
        }

        let timeline = vec![TimelineEntry {
            timestamp: now,
            status: IncidentStatus::Investigating.to_string(),
            message: format!("Automated checks detected that {} is down.", monitor.name),
            author: SYSTEM_AUTHOR.to_string(),
        }];

        let new_incident = incident::ActiveModel {
            monitor_id: Set(Some(monitor.id)),
            title: Set(format!("{} is down", monitor.name)),
            description: Set(Some(format!(
                "{} failed consecutive health checks and is currently unreachable.",
                monitor.name
            ))),
            status: Set(IncidentStatus::Investigating),
            severity: Set("critical".to_string()),
            timeline: Set(serde_json::to_value(&timeline).unwrap_or_default()),
            affected_services: Set(serde_json::json!([monitor.id])),
            started_at: Set(now),
            resolved_at: Set(None),
            root_cause: Set(Some(root_cause.unwrap_or_else(|| {
                "Automated monitoring detected repeated check failures.".to_string()
            }))),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };
        let created = new_incident.insert(&self.db).await?;

        info!(
            monitor_id = monitor.id,
            incident_id = created.id,
            "Opened incident for down monitor."
        );
        self.broadcaster.incident_new(&created);
        Ok(Some(created))
    }

    /// Resolves the open incident for a monitor that just recovered. No open
    /// incident is a no-op: the monitor may have recovered before the
    /// threshold was ever crossed.
    pub async fn resolve_for_up(
        &self,
        monitor: &monitor::Model,
        now: DateTime<Utc>,
    ) -> Result<Option<incident::Model>, DbErr> {
        let Some(open) = incident_service::find_open_for_monitor(&self.db, monitor.id).await? else {
            return Ok(None);
        };

        let mut timeline = open.timeline_entries();
        timeline.push(TimelineEntry {
            timestamp: now,
            status: IncidentStatus::Resolved.to_string(),
            message: format!("{} recovered and is responding normally.", monitor.name),
            author: SYSTEM_AUTHOR.to_string(),
        });

        let mut update = open.into_active_model();
        update.status = Set(IncidentStatus::Resolved);
        update.resolved_at = Set(Some(now));
        update.timeline = Set(serde_json::to_value(&timeline).unwrap_or_default());
        update.updated_at = Set(now);
        let resolved = update.update(&self.db).await?;

        info!(
            monitor_id = monitor.id,
            incident_id = resolved.id,
            "Resolved incident after recovery."
        );
        self.broadcaster.incident_update(&resolved);
        Ok(Some(resolved))
    }

    /// Appends a manual timeline update, optionally moving the incident to a
    /// new status. Moving to resolved stamps `resolved_at`.
    pub async fn add_update(
        &self,
        incident_id: i32,
        message: &str,
        author: &str,
        new_status: Option<IncidentStatus>,
    ) -> Result<incident::Model, DbErr> {
        let Some(existing) = incident_service::get_incident_by_id(&self.db, incident_id).await?
        else {
            return Err(DbErr::RecordNotFound(format!(
                "Incident {} not found",
                incident_id
            )));
        };

        let now = Utc::now();
        let status = new_status.unwrap_or_else(|| existing.status.clone());

        let mut timeline = existing.timeline_entries();
        timeline.push(TimelineEntry {
            timestamp: now,
            status: status.to_string(),
            message: message.to_string(),
            author: author.to_string(),
        });

        let already_resolved = existing.resolved_at.is_some();
        let mut update = existing.into_active_model();
        if status == IncidentStatus::Resolved && !already_resolved {
            update.resolved_at = Set(Some(now));
        }
        update.status = Set(status);
        update.timeline = Set(serde_json::to_value(&timeline).unwrap_or_default());
        update.updated_at = Set(now);
        let updated = update.update(&self.db).await?;

        self.broadcaster.incident_update(&updated);
        Ok(updated)
    }
}
