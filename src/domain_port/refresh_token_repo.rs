use crate::application_port::*;
use crate::domain_model::*;
use chrono::{DateTime, Utc};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted,
    Duplicate,
}

/// Row-level persistence for refresh tokens. Implementations perform each
/// check-and-update atomically; callers never hold a lock across calls.
#[async_trait::async_trait]
pub trait RefreshTokenRepo: Send + Sync {
    async fn insert(&self, record: &RefreshTokenRecord) -> Result<InsertOutcome, AuthError>;

    async fn find(&self, token: &str) -> Result<Option<RefreshTokenRecord>, AuthError>;

    /// If the token is live at `now`, set `updated_at = now`. Returns the row as
    /// seen under the lock (touched or not), or `None` if it does not exist.
    async fn touch_if_live(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<RefreshTokenRecord>, AuthError>;

    /// Set `revoked_at = updated_at = now` unless already revoked. Returns the
    /// resulting row, or `None` if it does not exist.
    async fn revoke(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<RefreshTokenRecord>, AuthError>;

    async fn delete_all(&self) -> Result<u64, AuthError>;
}
