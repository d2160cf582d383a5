use super::{NotificationSender, SenderError, HTTP_CLIENT};
use crate::db::entities::monitor;
use crate::notifications::models::{ChannelDetails, MonitorEvent};
use crate::server::config::ServerConfig;
use async_trait::async_trait;

pub fn render_sms(monitor: &monitor::Model, event: MonitorEvent) -> String {
    if event.is_up() {
        format!("{} is back UP ({})", monitor.name, monitor.url)
    } else {
        format!(
            "ALERT: {} is DOWN, failed repeated health checks ({})",
            monitor.name, monitor.url
        )
    }
}

/// SMS via the Twilio REST API. Account credentials and the sending number
/// are server-side configuration; the recipient comes from the integration.
pub struct TwilioSmsSender {
    account_sid: Option<String>,
    auth_token: Option<String>,
    from_number: Option<String>,
}

impl TwilioSmsSender {
    pub fn new(config: &ServerConfig) -> Self {
        Self {
            account_sid: config.twilio_account_sid.clone(),
            auth_token: config.twilio_auth_token.clone(),
            from_number: config.twilio_from_number.clone(),
        }
    }
}

#[async_trait]
impl NotificationSender for TwilioSmsSender {
    async fn send(
        &self,
        monitor: &monitor::Model,
        event: MonitorEvent,
        details: &ChannelDetails,
    ) -> Result<(), SenderError> {
        let (Some(sid), Some(token), Some(from)) =
            (&self.account_sid, &self.auth_token, &self.from_number)
        else {
            return Err(SenderError::NotConfigured("twilio"));
        };
        let to = details
            .phone_number
            .as_deref()
            .ok_or(SenderError::MissingDetail("phoneNumber"))?;

        let url = format!(
            "https://api.twilio.com/2010-04-01/Accounts/{}/Messages.json",
            sid
        );
        let response = HTTP_CLIENT
            .post(&url)
            .basic_auth(sid, Some(token))
            .form(&[
                ("From", from.as_str()),
                ("To", to),
                ("Body", &render_sms(monitor, event)),
            ])
            .send()
            .await?;
        if response.status().is_success() {
            Ok(())
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(SenderError::Rejected(format!("{}: {}", status, body)))
        }
    }
}
