use serde::{Deserialize, Serialize};

/// The two monitor transitions that produce alerts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorEvent {
    Up,
    Down,
}

impl MonitorEvent {
    pub fn is_up(&self) -> bool {
        matches!(self, MonitorEvent::Up)
    }

    pub fn label(&self) -> &'static str {
        match self {
            MonitorEvent::Up => "UP",
            MonitorEvent::Down => "DOWN",
        }
    }
}

/// Channel configuration stored in an integration's details column. Each
/// channel type reads the fields it needs and ignores the rest.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelDetails {
    #[serde(default)]
    pub webhook_url: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub bot_token: Option<String>,
    #[serde(default)]
    pub chat_id: Option<String>,
    #[serde(default)]
    pub phone_number: Option<String>,
    #[serde(default)]
    pub integration_key: Option<String>,
}
