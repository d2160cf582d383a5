use crate::db::entities::{incident, monitor};
use crate::db::enums::MonitorStatus;
use tokio::sync::broadcast;
use tracing::debug;

/// Fan-out of realtime pipeline events as JSON strings. Subscribers come and
/// go freely; sending with no subscribers is fine.
pub struct StatusBroadcaster {
    sender: broadcast::Sender<String>,
}

impl StatusBroadcaster {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<String> {
        self.sender.subscribe()
    }

    fn send(&self, message: serde_json::Value) {
        // Err here just means nobody is listening right now.
        let _ = self.sender.send(message.to_string());
    }

    pub fn monitor_status_change(&self, monitor: &monitor::Model, new_status: &MonitorStatus) {
        debug!(monitor_id = monitor.id, status = %new_status, "Broadcasting status change.");
        self.send(serde_json::json!({
            "type": "monitor_status_change",
            "monitorId": monitor.id,
            "name": monitor.name,
            "status": new_status,
        }));
    }

    pub fn incident_new(&self, incident: &incident::Model) {
        self.send(serde_json::json!({
            "type": "incident_new",
            "incidentId": incident.id,
            "monitorId": incident.monitor_id,
            "title": incident.title,
            "status": incident.status,
            "severity": incident.severity,
        }));
    }

    pub fn incident_update(&self, incident: &incident::Model) {
        self.send(serde_json::json!({
            "type": "incident_update",
            "incidentId": incident.id,
            "monitorId": incident.monitor_id,
            "status": incident.status,
            "resolvedAt": incident.resolved_at.map(|t| t.to_rfc3339()),
        }));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[tokio::test]
    async fn subscribers_receive_typed_events() {
        let broadcaster = StatusBroadcaster::new(16);
        let mut rx = broadcaster.subscribe();

        let now = Utc::now();
        let monitor = monitor::Model {
            id: 9,
            user_id: 1,
            name: "Web".to_string(),
            url: "https://example.com".to_string(),
            method: "GET".to_string(),
            headers: None,
            body: None,
            timeout_seconds: 10,
            interval_seconds: 60,
            regions: serde_json::json!(["default"]),
            expected_status_codes: None,
            status: MonitorStatus::Up,
            consecutive_fails: 0,
            last_check: None,
            last_status_change: None,
            active: true,
            maintenance_windows: None,
            created_at: now,
            updated_at: now,
        };
        broadcaster.monitor_status_change(&monitor, &MonitorStatus::Down);

        let raw = rx.recv().await.unwrap();
        let message: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(message["type"], "monitor_status_change");
        assert_eq!(message["monitorId"], 9);
        assert_eq!(message["status"], "down");
    }

    #[test]
    fn sending_without_subscribers_does_not_panic() {
        let broadcaster = StatusBroadcaster::new(16);
        broadcaster.send(serde_json::json!({"type": "noop"}));
    }
}
