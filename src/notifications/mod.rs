//! Alert fan-out. The dispatcher resolves a monitor's channel bindings and
//! hands the event to one sender per channel type.

pub mod dispatcher;
pub mod models;
pub mod senders;

pub use dispatcher::NotificationDispatcher;
pub use models::{ChannelDetails, MonitorEvent};
