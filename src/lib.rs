pub mod db;
pub mod incidents;
pub mod monitoring;
pub mod notifications;
pub mod server;
pub mod status_page;
