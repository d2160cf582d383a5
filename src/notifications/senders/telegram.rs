use super::{post_json, NotificationSender, SenderError};
use crate::db::entities::monitor;
use crate::notifications::models::{ChannelDetails, MonitorEvent};
use async_trait::async_trait;

pub fn render_text(monitor: &monitor::Model, event: MonitorEvent) -> String {
    if event.is_up() {
        format!(
            "✅ *{}* is back *UP*\n{}",
            monitor.name, monitor.url
        )
    } else {
        format!(
            "🔴 *{}* is *DOWN*\nFailed repeated health checks.\n{}",
            monitor.name, monitor.url
        )
    }
}

pub struct TelegramSender;

#[async_trait]
impl NotificationSender for TelegramSender {
    async fn send(
        &self,
        monitor: &monitor::Model,
        event: MonitorEvent,
        details: &ChannelDetails,
    ) -> Result<(), SenderError> {
        let bot_token = details
            .bot_token
            .as_deref()
            .ok_or(SenderError::MissingDetail("botToken"))?;
        let chat_id = details
            .chat_id
            .as_deref()
            .ok_or(SenderError::MissingDetail("chatId"))?;

        let url = format!("https://api.telegram.org/bot{}/sendMessage", bot_token);
        let payload = serde_json::json!({
            "chat_id": chat_id,
            "text": render_text(monitor, event),
            "parse_mode": "Markdown"
        });
        post_json(&url, &payload).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::enums::MonitorStatus;
    use chrono::Utc;

    #[test]
    fn text_carries_name_direction_and_url() {
        let now = Utc::now();
        let monitor = monitor::Model {
            id: 3,
            user_id: 1,
            name: "Docs".to_string(),
            url: "https://docs.example.com".to_string(),
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
        };

        let down = render_text(&monitor, MonitorEvent::Down);
        assert!(down.contains("*Docs*"));
        assert!(down.contains("*DOWN*"));
        assert!(down.contains("https://docs.example.com"));

        let up = render_text(&monitor, MonitorEvent::Up);
        assert!(up.contains("*UP*"));
    }
}
