mod auth_service_impl;
mod credential_extractor;
mod password_hasher_argon2;
mod refresh_token_store_impl;
mod token_codec_jwt;
mod user_service_impl;

pub use auth_service_impl::*;
pub use credential_extractor::*;
pub use password_hasher_argon2::*;
pub use refresh_token_store_impl::*;
pub use token_codec_jwt::*;
pub use user_service_impl::*;
