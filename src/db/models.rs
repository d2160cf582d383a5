//! Plain serde shapes stored inside Json columns of the entities.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A window during which scheduled checks for a monitor are suppressed.
/// Stored as a Json array on the monitor row.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MaintenanceWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    #[serde(default)]
    pub reason: Option<String>,
}

/// Classified probe failure recorded on a check_result row.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProbeError {
    pub kind: String,
    pub message: String,
}

/// One entry in an incident's timeline Json array.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineEntry {
    pub timestamp: DateTime<Utc>,
    pub status: String,
    pub message: String,
    pub author: String,
}

/// A monitor reference inside a status-page section, with optional
/// public-facing overrides.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionMonitorRef {
    pub monitor_id: i32,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default = "default_history_duration")]
    pub history_duration: i64,
}

fn default_history_duration() -> i64 {
    90
}

/// A named group of monitors on a status page. Stored as a Json array on the
/// status_page row.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonitorSection {
    pub name: String,
    pub monitors: Vec<SectionMonitorRef>,
}
