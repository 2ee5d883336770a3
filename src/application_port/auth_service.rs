use crate::domain_model::{RefreshTokenRecord, UserId, UserIdentity};
use chrono::{DateTime, Utc};
use serde::Serialize;
use warp::http::HeaderMap;

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("invalid credentials")]
    InvalidCredential,
    #[error("missing credential")]
    MissingCredential,
    #[error("token expired")]
    TokenExpired,
    #[error("token revoked")]
    TokenRevoked,
    #[error("token malformed")]
    TokenMalformed,
    #[error("token subject is not a valid user id")]
    TokenMalformedSubject,
    #[error("token signature invalid")]
    TokenInvalidSignature,
    #[error("token not found")]
    TokenNotFound,
    #[error("user already exists")]
    UserExists,
    #[error("user not found")]
    UserNotFound,
    #[error("operation not allowed on this platform")]
    Forbidden,
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("store error: {0}")]
    StoreFailure(String),
    #[error("hashing error: {0}")]
    HashingFailure(String),
    #[error("internal error: {0}")]
    InternalError(String),
}

impl AuthError {
    /// Failures that must reach the caller as a plain "unauthorized", without
    /// telling which check failed.
    pub fn is_unauthorized(&self) -> bool {
        matches!(
            self,
            AuthError::InvalidCredential
                | AuthError::MissingCredential
                | AuthError::TokenExpired
                | AuthError::TokenRevoked
                | AuthError::TokenMalformed
                | AuthError::TokenMalformedSubject
                | AuthError::TokenInvalidSignature
                | AuthError::TokenNotFound
        )
    }
}

#[derive(Clone)]
pub struct LoginInput {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone)]
pub struct LoginResult {
    pub user: UserIdentity,
    pub tokens: AuthTokens,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct AccessToken(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct RefreshToken(pub String);

#[derive(Debug, Clone, Serialize)]
pub struct AuthTokens {
    pub access_token: AccessToken,
    pub refresh_token: RefreshToken,
    pub access_token_expires_at: DateTime<Utc>,
    pub refresh_token_expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AccessGrant {
    pub access_token: AccessToken,
    pub expires_at: DateTime<Utc>,
}

pub const UPGRADE_EVENT: &str = "user.upgraded";

/// `data` is kept raw: only the upgrade event has a known shape, anything
/// else is acknowledged without being read.
#[derive(Clone)]
pub struct WebhookInput {
    pub api_key: String,
    pub event: String,
    pub data: serde_json::Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WebhookOutcome {
    Upgraded,
    Ignored,
}

pub trait TokenCodec: Send + Sync {
    fn issue_access_token(&self, user: UserId) -> Result<(AccessToken, DateTime<Utc>), AuthError>;
    fn verify_access_token(&self, token: &AccessToken) -> Result<UserId, AuthError>;
}

#[async_trait::async_trait]
pub trait CredentialHasher: Send + Sync {
    async fn hash_password(&self, password: &str) -> Result<String, AuthError>;
    async fn verify_password(&self, password: &str, password_hash: &str)
    -> Result<bool, AuthError>;
}

#[async_trait::async_trait]
pub trait RefreshTokenStore: Send + Sync {
    async fn issue(&self, user: UserId) -> Result<RefreshTokenRecord, AuthError>;
    async fn lookup(&self, token: &str) -> Result<RefreshTokenRecord, AuthError>;
    fn is_live(&self, record: &RefreshTokenRecord) -> bool;
    /// Checks liveness and bumps `updated_at` in one store operation. Fails
    /// with the reason the token cannot be used.
    async fn use_for_refresh(&self, token: &str) -> Result<RefreshTokenRecord, AuthError>;
    async fn revoke(&self, token: &str) -> Result<(), AuthError>;
}

#[async_trait::async_trait]
pub trait AuthService: Send + Sync {
    async fn login(&self, request: LoginInput) -> Result<LoginResult, AuthError>;
    async fn refresh(&self, refresh_token: &str) -> Result<AccessGrant, AuthError>;
    async fn revoke(&self, refresh_token: &str) -> Result<(), AuthError>;
    async fn authorize_webhook(&self, api_key: &str) -> Result<(), AuthError>;
    async fn upgrade_via_webhook(&self, request: WebhookInput)
    -> Result<WebhookOutcome, AuthError>;
    async fn verify_bearer(&self, headers: &HeaderMap) -> Result<UserId, AuthError>;
    async fn hash_password(&self, password: &str) -> Result<String, AuthError>;
    async fn verify_password(&self, password: &str, password_hash: &str)
    -> Result<bool, AuthError>;
}
