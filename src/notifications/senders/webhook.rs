use super::{post_json, NotificationSender, SenderError};
use crate::db::entities::monitor;
use crate::notifications::models::{ChannelDetails, MonitorEvent};
use async_trait::async_trait;
use chrono::Utc;

const COLOR_UP: u32 = 3_066_993;
const COLOR_DOWN: u32 = 15_158_332;

/// Embed payload understood by Discord and accepted verbatim by Slack, Teams,
/// and generic webhook receivers.
pub fn embed_payload(monitor: &monitor::Model, event: MonitorEvent) -> serde_json::Value {
    let (color, description) = if event.is_up() {
        (
            COLOR_UP,
            format!("{} has recovered and is responding normally.", monitor.name),
        )
    } else {
        (
            COLOR_DOWN,
            format!("{} is not responding to health checks.", monitor.name),
        )
    };
    serde_json::json!({
        "embeds": [{
            "title": format!("Monitor {}: {}", event.label(), monitor.name),
            "description": description,
            "color": color,
            "fields": [
                { "name": "URL", "value": monitor.url, "inline": true },
                { "name": "Status", "value": event.label(), "inline": true }
            ],
            "timestamp": Utc::now().to_rfc3339()
        }]
    })
}

/// Delivery to any endpoint that accepts a JSON POST: Discord, Slack, Teams,
/// and plain webhooks all share this sender.
pub struct WebhookSender;

#[async_trait]
impl NotificationSender for WebhookSender {
    async fn send(
        &self,
        monitor: &monitor::Model,
        event: MonitorEvent,
        details: &ChannelDetails,
    ) -> Result<(), SenderError> {
        let url = details
            .webhook_url
            .as_deref()
            .ok_or(SenderError::MissingDetail("webhookUrl"))?;
        post_json(url, &embed_payload(monitor, event)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::enums::MonitorStatus;

    fn test_monitor() -> monitor::Model {
        let now = Utc::now();
        monitor::Model {
            id: 7,
            user_id: 1,
            name: "API".to_string(),
            url: "https://api.example.com/health".to_string(),
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
        }
    }

    #[test]
    fn down_embed_is_red_and_titled() {
        let payload = embed_payload(&test_monitor(), MonitorEvent::Down);
        let embed = &payload["embeds"][0];
        assert_eq!(embed["color"], 15_158_332);
        assert_eq!(embed["title"], "Monitor DOWN: API");
    }

    #[test]
    fn up_embed_is_green() {
        let payload = embed_payload(&test_monitor(), MonitorEvent::Up);
        let embed = &payload["embeds"][0];
        assert_eq!(embed["color"], 3_066_993);
        assert_eq!(embed["fields"][0]["value"], "https://api.example.com/health");
    }
}
