pub mod broadcaster;
pub mod config;
pub mod core_services;

pub use core_services::CoreServices;
