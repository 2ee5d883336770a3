use crate::application_port::AuthError;
use hmac::{Hmac, KeyInit, Mac};
use sha2::Sha256;
use warp::http::HeaderMap;
use warp::http::header::AUTHORIZATION;

pub const BEARER_PREFIX: &str = "Bearer ";
pub const API_KEY_PREFIX: &str = "ApiKey ";

const API_KEY_MAC_KEY: &[u8] = b"chirpy.webhook.api-key";

fn authorization_value<'h>(headers: &'h HeaderMap, prefix: &str) -> Result<&'h str, AuthError> {
    headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix(prefix))
        .filter(|credential| !credential.is_empty())
        .ok_or(AuthError::MissingCredential)
}

/// `Authorization: Bearer <token>`.
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    authorization_value(headers, BEARER_PREFIX)
}

/// `Authorization: ApiKey <key>`, used only by the webhook path.
pub fn api_key(headers: &HeaderMap) -> Result<&str, AuthError> {
    authorization_value(headers, API_KEY_PREFIX)
}

type HmacSha256 = Hmac<Sha256>;

fn api_key_tag(key: &str) -> Option<HmacSha256> {
    let mut mac = <HmacSha256 as KeyInit>::new_from_slice(API_KEY_MAC_KEY).ok()?;
    mac.update(key.as_bytes());
    Some(mac)
}

/// Constant-time comparison of a presented API key with the configured one.
/// Both sides are reduced to fixed-size MACs first so the comparison does not
/// depend on key length either.
pub fn api_key_matches(provided: &str, expected: &str) -> bool {
    if expected.is_empty() {
        return false;
    }
    let (Some(expected_mac), Some(provided_mac)) = (api_key_tag(expected), api_key_tag(provided))
    else {
        return false;
    };
    let expected_tag = expected_mac.finalize().into_bytes();
    provided_mac.verify_slice(&expected_tag).is_ok()
}
