mod auth_service;
mod secret_config;
mod user_service;

pub use auth_service::*;
pub use secret_config::*;
pub use user_service::*;
