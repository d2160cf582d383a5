use super::{NotificationSender, SenderError};
use crate::db::entities::monitor;
use crate::notifications::models::{ChannelDetails, MonitorEvent};
use crate::server::config::ServerConfig;
use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::warn;

/// Subject and HTML body for a monitor transition email.
pub fn render_email(monitor: &monitor::Model, event: MonitorEvent) -> (String, String) {
    let subject = if event.is_up() {
        format!("[Recovered] {} is back up", monitor.name)
    } else {
        format!("[Alert] {} is down", monitor.name)
    };
    let (headline, detail) = if event.is_up() {
        (
            format!("{} has recovered", monitor.name),
            "The monitor is responding normally again.".to_string(),
        )
    } else {
        (
            format!("{} is down", monitor.name),
            "The monitor failed repeated health checks and appears to be unreachable.".to_string(),
        )
    };
    let body = format!(
        "<h2>{}</h2>\
         <p>{}</p>\
         <p><strong>URL:</strong> <a href=\"{}\">{}</a></p>",
        headline, detail, monitor.url, monitor.url
    );
    (subject, body)
}

pub struct EmailSender {
    transport: Option<AsyncSmtpTransport<Tokio1Executor>>,
    from: String,
}

impl EmailSender {
    /// Builds a STARTTLS transport for the configured relay. No relay host
    /// means email stays disabled; credentials are only ever sent over TLS.
    pub fn new(config: &ServerConfig) -> Self {
        let transport = config.smtp_host.as_deref().and_then(|host| {
            match AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host) {
                Ok(builder) => {
                    let mut builder = builder.port(config.smtp_port);
                    if let (Some(user), Some(pass)) =
                        (&config.smtp_username, &config.smtp_password)
                    {
                        builder =
                            builder.credentials(Credentials::new(user.clone(), pass.clone()));
                    }
                    Some(builder.build())
                }
                Err(e) => {
                    warn!(host = host, error = %e, "Invalid SMTP relay, email disabled.");
                    None
                }
            }
        });
        Self {
            transport,
            from: config.email_from.clone(),
        }
    }
}

#[async_trait]
impl NotificationSender for EmailSender {
    async fn send(
        &self,
        monitor: &monitor::Model,
        event: MonitorEvent,
        details: &ChannelDetails,
    ) -> Result<(), SenderError> {
        let Some(transport) = &self.transport else {
            return Err(SenderError::NotConfigured("smtp"));
        };
        let recipient = details
            .email
            .as_deref()
            .ok_or(SenderError::MissingDetail("email"))?;

        let (subject, body) = render_email(monitor, event);
        let message = Message::builder()
            .from(self.from.parse()?)
            .to(recipient.parse()?)
            .subject(subject)
            .header(ContentType::TEXT_HTML)
            .body(body)?;
        transport.send(message).await?;
        Ok(())
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
            id: 1,
            user_id: 1,
            name: "Checkout".to_string(),
            url: "https://shop.example.com".to_string(),
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

    #[tokio::test]
    async fn unconfigured_relay_refuses_to_send() {
        let config = ServerConfig {
            database_url: String::new(),
            smtp_host: None,
            smtp_port: 587,
            smtp_username: None,
            smtp_password: None,
            email_from: "alerts@pulsewatch.local".to_string(),
            twilio_account_sid: None,
            twilio_auth_token: None,
            twilio_from_number: None,
            check_worker_count: 1,
            log_dir: "logs".to_string(),
        };
        let sender = EmailSender::new(&config);
        let details = ChannelDetails {
            email: Some("owner@example.com".to_string()),
            ..Default::default()
        };

        let result = sender.send(&test_monitor(), MonitorEvent::Down, &details).await;
        assert!(matches!(result, Err(SenderError::NotConfigured("smtp"))));
    }

    #[test]
    fn subjects_name_the_monitor_and_direction() {
        let (down_subject, down_body) = render_email(&test_monitor(), MonitorEvent::Down);
        assert_eq!(down_subject, "[Alert] Checkout is down");
        assert!(down_body.contains("https://shop.example.com"));

        let (up_subject, _) = render_email(&test_monitor(), MonitorEvent::Up);
        assert_eq!(up_subject, "[Recovered] Checkout is back up");
    }
}
