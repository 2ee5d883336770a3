use crate::application_port::{AuthError, RefreshTokenStore};
use crate::domain_model::{RefreshTokenRecord, UserId};
use crate::domain_port::{Clock, InsertOutcome, RefreshTokenRepo};
use argon2::password_hash::rand_core::{OsRng, RngCore};
use chrono::Duration;
use std::sync::Arc;
use tracing::warn;

const TOKEN_BYTES: usize = 32;
const MAX_ISSUE_ATTEMPTS: usize = 3;

pub struct RealRefreshTokenStore {
    repo: Arc<dyn RefreshTokenRepo>,
    clock: Arc<dyn Clock>,
    ttl: Duration,
}

impl RealRefreshTokenStore {
    pub fn new(repo: Arc<dyn RefreshTokenRepo>, clock: Arc<dyn Clock>, ttl: Duration) -> Self {
        RealRefreshTokenStore { repo, clock, ttl }
    }

    #[inline]
    fn gen_token() -> String {
        let mut bytes = [0u8; TOKEN_BYTES];
        OsRng.fill_bytes(&mut bytes);
        hex::encode(bytes)
    }
}

#[async_trait::async_trait]
impl RefreshTokenStore for RealRefreshTokenStore {
    async fn issue(&self, user: UserId) -> Result<RefreshTokenRecord, AuthError> {
        let now = self.clock.now();
        for _ in 0..MAX_ISSUE_ATTEMPTS {
            let record = RefreshTokenRecord {
                token: Self::gen_token(),
                user_id: user,
                created_at: now,
                updated_at: now,
                expires_at: now + self.ttl,
                revoked_at: None,
            };
            match self.repo.insert(&record).await? {
                InsertOutcome::Inserted => return Ok(record),
                InsertOutcome::Duplicate => warn!(%user, "refresh token collision, regenerating"),
            }
        }
        Err(AuthError::StoreFailure(
            "could not allocate a unique refresh token".to_string(),
        ))
    }

    async fn lookup(&self, token: &str) -> Result<RefreshTokenRecord, AuthError> {
        self.repo.find(token).await?.ok_or(AuthError::TokenNotFound)
    }

    fn is_live(&self, record: &RefreshTokenRecord) -> bool {
        record.is_live(self.clock.now())
    }

    async fn use_for_refresh(&self, token: &str) -> Result<RefreshTokenRecord, AuthError> {
        let now = self.clock.now();
        let record = self
            .repo
            .touch_if_live(token, now)
            .await?
            .ok_or(AuthError::TokenNotFound)?;

        if record.is_revoked() {
            return Err(AuthError::TokenRevoked);
        }
        if !record.is_live(now) {
            return Err(AuthError::TokenExpired);
        }
        Ok(record)
    }

    async fn revoke(&self, token: &str) -> Result<(), AuthError> {
        self.repo
            .revoke(token, self.clock.now())
            .await?
            .ok_or(AuthError::TokenNotFound)?;
        Ok(())
    }
}
