use crate::db::entities::monitor;
use crate::db::services::notification_service;
use crate::notifications::models::{ChannelDetails, MonitorEvent};
use crate::notifications::senders::{
    EmailSender, GoogleChatSender, NotificationSender, PagerDutySender, TelegramSender,
    TwilioSmsSender, WebhookSender,
};
use crate::server::config::ServerConfig;
use futures::future::{join_all, BoxFuture};
use sea_orm::{DatabaseConnection, DbErr};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Fans one monitor transition out to every channel bound to the monitor.
/// Channels are isolated from each other: one failing delivery never blocks
/// or cancels the rest.
pub struct NotificationDispatcher {
    db: DatabaseConnection,
    senders: HashMap<&'static str, Arc<dyn NotificationSender>>,
    email: Arc<EmailSender>,
}

impl NotificationDispatcher {
    pub fn new(db: DatabaseConnection, config: &ServerConfig) -> Self {
        let email = Arc::new(EmailSender::new(config));
        let webhook: Arc<dyn NotificationSender> = Arc::new(WebhookSender);

        let mut senders: HashMap<&'static str, Arc<dyn NotificationSender>> = HashMap::new();
        senders.insert("email", email.clone());
        // Discord, Slack, Teams, and plain webhooks all take the same embed.
        senders.insert("discord", webhook.clone());
        senders.insert("slack", webhook.clone());
        senders.insert("teams", webhook.clone());
        senders.insert("webhook", webhook);
        senders.insert("googlechat", Arc::new(GoogleChatSender));
        senders.insert("telegram", Arc::new(TelegramSender));
        senders.insert("twiliosms", Arc::new(TwilioSmsSender::new(config)));
        senders.insert("pagerduty", Arc::new(PagerDutySender));

        Self { db, senders, email }
    }

    /// Delivers the event to all bound channels. The monitor's owner is
    /// always emailed unless an email-type binding already covers that.
    pub async fn dispatch(
        &self,
        monitor: &monitor::Model,
        event: MonitorEvent,
    ) -> Result<(), DbErr> {
        let bindings = notification_service::bindings_for_monitor(&self.db, monitor.id).await?;
        let owner_email = notification_service::get_owner_email(&self.db, monitor.user_id).await?;

        if bindings.is_empty() {
            let Some(address) = owner_email else {
                debug!(monitor_id = monitor.id, "No channels bound and no owner email, skipping.");
                return Ok(());
            };
            let details = ChannelDetails {
                email: Some(address),
                ..Default::default()
            };
            if let Err(e) = self.email.send(monitor, event, &details).await {
                error!(monitor_id = monitor.id, error = %e, "Owner email fallback failed.");
            } else {
                info!(monitor_id = monitor.id, "Sent fallback email to monitor owner.");
            }
            return Ok(());
        }

        let mut deliveries: Vec<BoxFuture<'_, ()>> = Vec::new();
        let mut has_email_binding = false;
        for (binding, integration) in bindings {
            let Some(integration) = integration else {
                warn!(
                    binding_id = binding.id,
                    "Binding references a deleted integration, skipping."
                );
                continue;
            };
            let Some(sender) = self.senders.get(integration.integration_type.as_str()) else {
                warn!(
                    integration_id = integration.id,
                    channel = %integration.integration_type,
                    "Unknown channel type, skipping."
                );
                continue;
            };

            let mut details: ChannelDetails =
                serde_json::from_value(integration.details.clone()).unwrap_or_default();
            if integration.integration_type == "email" {
                has_email_binding = true;
                if details.email.is_none() {
                    details.email = owner_email.clone();
                }
            }

            let sender = sender.clone();
            let channel = integration.integration_type.clone();
            let integration_id = integration.id;
            deliveries.push(Box::pin(async move {
                match sender.send(monitor, event, &details).await {
                    Ok(()) => {
                        debug!(
                            monitor_id = monitor.id,
                            integration_id = integration_id,
                            channel = %channel,
                            "Notification delivered."
                        );
                    }
                    Err(e) => {
                        error!(
                            monitor_id = monitor.id,
                            integration_id = integration_id,
                            channel = %channel,
                            error = %e,
                            "Notification delivery failed."
                        );
                    }
                }
            }));
        }

        // The owner always hears about transitions by email, even when only
        // non-email channels are bound.
        if !has_email_binding {
            if let Some(address) = owner_email {
                let details = ChannelDetails {
                    email: Some(address),
                    ..Default::default()
                };
                let email = self.email.clone();
                deliveries.push(Box::pin(async move {
                    if let Err(e) = email.send(monitor, event, &details).await {
                        error!(monitor_id = monitor.id, error = %e, "Owner email failed.");
                    }
                }));
            }
        }

        let count = deliveries.len();
        join_all(deliveries).await;
        info!(
            monitor_id = monitor.id,
            event = event.label(),
            channels = count,
            "Notification dispatch finished."
        );
        Ok(())
    }
}
