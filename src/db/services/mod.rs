//! High-level database access for the pipeline. Encapsulates query logic so
//! the scheduling, checking, incident, notification, and cache layers work
//! with domain models rather than SQL. One sub-module per aggregate; public
//! functions are re-exported here.

pub mod check_job_service;
pub mod check_result_service;
pub mod incident_service;
pub mod monitor_service;
pub mod notification_service;
pub mod status_page_service;

pub use check_job_service::*;
pub use check_result_service::*;
pub use incident_service::*;
pub use monitor_service::*;
pub use notification_service::*;
pub use status_page_service::*;
