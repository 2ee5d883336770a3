use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

/// Each operation holds the dashmap shard lock for its row, which gives the
/// same per-row serialization as the SQL adapter's `SELECT ... FOR UPDATE`.
#[derive(Debug, Default)]
pub struct MemoryRefreshTokenRepo {
    tokens: DashMap<String, RefreshTokenRecord>,
}

impl MemoryRefreshTokenRepo {
    pub fn new() -> Self {
        MemoryRefreshTokenRepo {
            tokens: DashMap::new(),
        }
    }
}

#[async_trait::async_trait]
impl RefreshTokenRepo for MemoryRefreshTokenRepo {
    async fn insert(&self, record: &RefreshTokenRecord) -> Result<InsertOutcome, AuthError> {
        match self.tokens.entry(record.token.clone()) {
            Entry::Occupied(_) => Ok(InsertOutcome::Duplicate),
            Entry::Vacant(slot) => {
                slot.insert(record.clone());
                Ok(InsertOutcome::Inserted)
            }
        }
    }

    async fn find(&self, token: &str) -> Result<Option<RefreshTokenRecord>, AuthError> {
        Ok(self.tokens.get(token).map(|rec| rec.value().clone()))
    }

    async fn touch_if_live(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<RefreshTokenRecord>, AuthError> {
        let Some(mut rec) = self.tokens.get_mut(token) else {
            return Ok(None);
        };
        if rec.is_live(now) {
            rec.updated_at = now;
        }
        Ok(Some(rec.value().clone()))
    }

    async fn revoke(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<RefreshTokenRecord>, AuthError> {
        let Some(mut rec) = self.tokens.get_mut(token) else {
            return Ok(None);
        };
        if rec.revoked_at.is_none() {
            rec.revoked_at = Some(now);
            rec.updated_at = now;
        }
        Ok(Some(rec.value().clone()))
    }

    async fn delete_all(&self) -> Result<u64, AuthError> {
        let removed = self.tokens.len() as u64;
        self.tokens.clear();
        Ok(removed)
    }
}
