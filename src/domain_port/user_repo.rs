use crate::application_port::*;
use crate::domain_model::*;
use chrono::{DateTime, Utc};

#[derive(Debug, Clone)]
pub struct NewUserRecord {
    pub user_id: UserId,
    pub email: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

#[async_trait::async_trait]
pub trait UserRepo: Send + Sync {
    /// Fails with `UserExists` when the email is taken.
    async fn create(&self, record: NewUserRecord) -> Result<UserIdentity, AuthError>;

    /// Fetch a user with its password hash (for login).
    async fn find_by_email(&self, email: &str) -> Result<Option<UserCredentials>, AuthError>;

    async fn find_by_id(&self, user_id: UserId) -> Result<Option<UserIdentity>, AuthError>;

    /// Replace email and password hash. `None` when the user does not exist;
    /// `UserExists` when the new email belongs to someone else.
    async fn update_credential(
        &self,
        user_id: UserId,
        password_hash: &str,
        email: &str,
        updated_at: DateTime<Utc>,
    ) -> Result<Option<UserIdentity>, AuthError>;

    /// `None` when the user does not exist.
    async fn set_privilege_flag(
        &self,
        user_id: UserId,
        is_chirpy_red: bool,
        updated_at: DateTime<Utc>,
    ) -> Result<Option<UserIdentity>, AuthError>;

    /// Returns the number of users removed.
    async fn delete_all(&self) -> Result<u64, AuthError>;
}
