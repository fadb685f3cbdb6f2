pub mod api_router;
pub mod auth;
pub mod core;
pub mod main_module;
pub mod notifications;
pub mod project;
pub mod security;
pub mod tasks;

pub use crate::core::shared;
