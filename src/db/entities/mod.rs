//! SeaORM entities mapping to the database tables of the monitoring pipeline.
//! Each entity lives in its own module; the prelude re-exports them under
//! short names for query-building code.

pub mod check_job;
pub mod check_result;
pub mod incident;
pub mod integration;
pub mod monitor;
pub mod notification_binding;
pub mod status_page;
pub mod status_page_cache;
pub mod user;

pub mod prelude {
    pub use super::check_job::Entity as CheckJob;
    pub use super::check_result::Entity as CheckResult;
    pub use super::incident::Entity as Incident;
    pub use super::integration::Entity as Integration;
    pub use super::monitor::Entity as Monitor;
    pub use super::notification_binding::Entity as NotificationBinding;
    pub use super::status_page::Entity as StatusPage;
    pub use super::status_page_cache::Entity as StatusPageCache;
    pub use super::user::Entity as User;
}
