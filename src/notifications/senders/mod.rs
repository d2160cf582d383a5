use crate::db::entities::monitor;
use crate::notifications::models::{ChannelDetails, MonitorEvent};
use async_trait::async_trait;
use once_cell::sync::Lazy;
use reqwest::Client;
use thiserror::Error;

pub mod email;
pub mod google_chat;
pub mod pagerduty;
pub mod sms;
pub mod telegram;
pub mod webhook;

pub use email::EmailSender;
pub use google_chat::GoogleChatSender;
pub use pagerduty::PagerDutySender;
pub use sms::TwilioSmsSender;
pub use telegram::TelegramSender;
pub use webhook::WebhookSender;

/// Shared HTTP client for the webhook-style channels.
pub(crate) static HTTP_CLIENT: Lazy<Client> = Lazy::new(Client::new);

#[derive(Debug, Error)]
pub enum SenderError {
    #[error("channel configuration is missing `{0}`")]
    MissingDetail(&'static str),
    #[error("channel is not configured on this server: {0}")]
    NotConfigured(&'static str),
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("remote endpoint rejected the notification: {0}")]
    Rejected(String),
    #[error("invalid address: {0}")]
    Address(#[from] lettre::address::AddressError),
    #[error("failed to build email: {0}")]
    Email(#[from] lettre::error::Error),
    #[error("smtp delivery failed: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),
}

/// One delivery channel. Implementations are stateless apart from server-side
/// credentials; everything per-recipient arrives in `details`.
#[async_trait]
pub trait NotificationSender: Send + Sync {
    async fn send(
        &self,
        monitor: &monitor::Model,
        event: MonitorEvent,
        details: &ChannelDetails,
    ) -> Result<(), SenderError>;
}

/// Posts a JSON payload and surfaces non-2xx responses as errors.
pub(crate) async fn post_json(
    url: &str,
    payload: &serde_json::Value,
) -> Result<(), SenderError> {
    let response = HTTP_CLIENT.post(url).json(payload).send().await?;
    if response.status().is_success() {
        Ok(())
    } else {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        Err(SenderError::Rejected(format!("{}: {}", status, body)))
    }
}
