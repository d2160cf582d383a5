use super::{post_json, NotificationSender, SenderError};
use crate::db::entities::monitor;
use crate::notifications::models::{ChannelDetails, MonitorEvent};
use async_trait::async_trait;

/// Google Chat webhook card (cardsV2 format).
pub fn card_payload(monitor: &monitor::Model, event: MonitorEvent) -> serde_json::Value {
    let title = format!("Monitor {}: {}", event.label(), monitor.name);
    let status_text = if event.is_up() {
        "Recovered and responding normally."
    } else {
        "Not responding to health checks."
    };
    serde_json::json!({
        "cardsV2": [{
            "cardId": format!("monitor-{}", monitor.id),
            "card": {
                "header": { "title": title },
                "sections": [{
                    "widgets": [
                        { "textParagraph": { "text": status_text } },
                        { "decoratedText": { "topLabel": "URL", "text": monitor.url } }
                    ]
                }]
            }
        }]
    })
}

pub struct GoogleChatSender;

#[async_trait]
impl NotificationSender for GoogleChatSender {
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
        post_json(url, &card_payload(monitor, event)).await
    }
}
