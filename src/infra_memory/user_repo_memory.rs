use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

#[derive(Debug, Clone)]
struct UserRow {
    identity: UserIdentity,
    password_hash: String,
}

/// Users keyed by id with a unique email index. A guard on one map is never
/// held while locking the other.
#[derive(Debug, Default)]
pub struct MemoryUserRepo {
    users: DashMap<UserId, UserRow>,
    emails: DashMap<String, UserId>,
}

impl MemoryUserRepo {
    pub fn new() -> Self {
        MemoryUserRepo {
            users: DashMap::new(),
            emails: DashMap::new(),
        }
    }

    fn claim_email(&self, email: &str, user_id: UserId) -> Result<(), AuthError> {
        match self.emails.entry(email.to_string()) {
            Entry::Occupied(owner) if *owner.get() != user_id => Err(AuthError::UserExists),
            Entry::Occupied(_) => Ok(()),
            Entry::Vacant(slot) => {
                slot.insert(user_id);
                Ok(())
            }
        }
    }

    fn release_email(&self, email: &str, user_id: UserId) {
        self.emails.remove_if(email, |_, owner| *owner == user_id);
    }
}

#[async_trait::async_trait]
impl UserRepo for MemoryUserRepo {
    async fn create(&self, record: NewUserRecord) -> Result<UserIdentity, AuthError> {
        self.claim_email(&record.email, record.user_id)?;

        let identity = UserIdentity {
            id: record.user_id,
            created_at: record.created_at,
            updated_at: record.created_at,
            email: record.email,
            is_chirpy_red: false,
        };
        self.users.insert(
            record.user_id,
            UserRow {
                identity: identity.clone(),
                password_hash: record.password_hash,
            },
        );
        Ok(identity)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<UserCredentials>, AuthError> {
        let Some(user_id) = self.emails.get(email).map(|id| *id.value()) else {
            return Ok(None);
        };
        Ok(self.users.get(&user_id).map(|row| UserCredentials {
            identity: row.identity.clone(),
            password_hash: row.password_hash.clone(),
        }))
    }

    async fn find_by_id(&self, user_id: UserId) -> Result<Option<UserIdentity>, AuthError> {
        Ok(self.users.get(&user_id).map(|row| row.identity.clone()))
    }

    async fn update_credential(
        &self,
        user_id: UserId,
        password_hash: &str,
        email: &str,
        updated_at: DateTime<Utc>,
    ) -> Result<Option<UserIdentity>, AuthError> {
        self.claim_email(email, user_id)?;

        let Some(mut row) = self.users.get_mut(&user_id) else {
            self.release_email(email, user_id);
            return Ok(None);
        };
        let old_email = std::mem::replace(&mut row.identity.email, email.to_string());
        row.password_hash = password_hash.to_string();
        row.identity.updated_at = updated_at;
        let identity = row.identity.clone();
        drop(row);

        if old_email != email {
            self.release_email(&old_email, user_id);
        }
        Ok(Some(identity))
    }

    async fn set_privilege_flag(
        &self,
        user_id: UserId,
        is_chirpy_red: bool,
        updated_at: DateTime<Utc>,
    ) -> Result<Option<UserIdentity>, AuthError> {
        Ok(self.users.get_mut(&user_id).map(|mut row| {
            row.identity.is_chirpy_red = is_chirpy_red;
            row.identity.updated_at = updated_at;
            row.identity.clone()
        }))
    }

    async fn delete_all(&self) -> Result<u64, AuthError> {
        let removed = self.users.len() as u64;
        self.users.clear();
        self.emails.clear();
        Ok(removed)
    }
}
