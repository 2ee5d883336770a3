use crate::application_port::AuthError;
use crate::domain_model::{UserId, UserIdentity};

#[derive(Clone)]
pub struct NewUserInput {
    pub email: String,
    pub password: String,
}

#[derive(Clone)]
pub struct UpdateCredentialsInput {
    pub user_id: UserId,
    pub email: String,
    pub password: String,
}

#[async_trait::async_trait]
pub trait UserService: Send + Sync {
    async fn create_user(&self, request: NewUserInput) -> Result<UserIdentity, AuthError>;
    async fn update_credentials(
        &self,
        request: UpdateCredentialsInput,
    ) -> Result<UserIdentity, AuthError>;
    /// Deletes every user and, by cascade, every refresh token. Only allowed
    /// on the dev platform.
    async fn reset(&self) -> Result<u64, AuthError>;
}
