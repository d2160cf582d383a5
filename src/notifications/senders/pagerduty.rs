use super::{post_json, NotificationSender, SenderError};
use crate::db::entities::monitor;
use crate::notifications::models::{ChannelDetails, MonitorEvent};
use async_trait::async_trait;

const EVENTS_API_URL: &str = "https://events.pagerduty.com/v2/enqueue";

/// PagerDuty Events API v2 payload. The dedup key ties the down trigger and
/// the later resolve to the same PagerDuty incident.
pub fn event_payload(
    monitor: &monitor::Model,
    event: MonitorEvent,
    routing_key: &str,
) -> serde_json::Value {
    let dedup_key = format!("monitor-{}", monitor.id);
    if event.is_up() {
        serde_json::json!({
            "routing_key": routing_key,
            "event_action": "resolve",
            "dedup_key": dedup_key
        })
    } else {
        serde_json::json!({
            "routing_key": routing_key,
            "event_action": "trigger",
            "dedup_key": dedup_key,
            "payload": {
                "summary": format!("{} is down", monitor.name),
                "source": monitor.url,
                "severity": "critical"
            }
        })
    }
}

pub struct PagerDutySender;

#[async_trait]
impl NotificationSender for PagerDutySender {
    async fn send(
        &self,
        monitor: &monitor::Model,
        event: MonitorEvent,
        details: &ChannelDetails,
    ) -> Result<(), SenderError> {
        let routing_key = details
            .integration_key
            .as_deref()
            .ok_or(SenderError::MissingDetail("integrationKey"))?;
        post_json(EVENTS_API_URL, &event_payload(monitor, event, routing_key)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::enums::MonitorStatus;
    use chrono::Utc;

    fn test_monitor() -> monitor::Model {
        let now = Utc::now();
        monitor::Model {
            id: 42,
            user_id: 1,
            name: "Gateway".to_string(),
            url: "https://gw.example.com".to_string(),
            method: "GET".to_string(),
            headers: None,
            body: None,
            timeout_seconds: 10,
            interval_seconds: 60,
            regions: serde_json::json!(["default"]),
            expected_status_codes: None,
            status: MonitorStatus::Down,
            consecutive_fails: 3,
            last_check: None,
            last_status_change: None,
            active: true,
            maintenance_windows: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn down_triggers_with_stable_dedup_key() {
        let payload = event_payload(&test_monitor(), MonitorEvent::Down, "rk");
        assert_eq!(payload["event_action"], "trigger");
        assert_eq!(payload["dedup_key"], "monitor-42");
        assert_eq!(payload["payload"]["severity"], "critical");
    }

    #[test]
    fn up_resolves_the_same_dedup_key() {
        let payload = event_payload(&test_monitor(), MonitorEvent::Up, "rk");
        assert_eq!(payload["event_action"], "resolve");
        assert_eq!(payload["dedup_key"], "monitor-42");
        assert!(payload.get("payload").is_none());
    }
}
