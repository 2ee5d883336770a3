use crate::application_port::*;
use crate::domain_model::{UserId, UserIdentity};
use crate::domain_port::{Clock, NewUserRecord, RefreshTokenRepo, UserRepo};
use std::sync::Arc;
use tracing::{info, warn};

pub struct RealUserService {
    user_repo: Arc<dyn UserRepo>,
    refresh_token_repo: Arc<dyn RefreshTokenRepo>,
    credential_hasher: Arc<dyn CredentialHasher>,
    secrets: Arc<SecretConfig>,
    clock: Arc<dyn Clock>,
}

impl RealUserService {
    pub fn new(
        user_repo: Arc<dyn UserRepo>,
        refresh_token_repo: Arc<dyn RefreshTokenRepo>,
        credential_hasher: Arc<dyn CredentialHasher>,
        secrets: Arc<SecretConfig>,
        clock: Arc<dyn Clock>,
    ) -> RealUserService {
        RealUserService {
            user_repo,
            refresh_token_repo,
            credential_hasher,
            secrets,
            clock,
        }
    }

    fn validate(email: &str, password: &str) -> Result<(), AuthError> {
        if email.trim().is_empty() || !email.contains('@') {
            return Err(AuthError::InvalidInput("email is not valid".to_string()));
        }
        if password.is_empty() {
            return Err(AuthError::InvalidInput("password is empty".to_string()));
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl UserService for RealUserService {
    async fn create_user(&self, request: NewUserInput) -> Result<UserIdentity, AuthError> {
        let NewUserInput { email, password } = request;
        Self::validate(&email, &password)?;

        let password_hash = self.credential_hasher.hash_password(&password).await?;
        let user = self
            .user_repo
            .create(NewUserRecord {
                user_id: UserId::new_random(),
                email,
                password_hash,
                created_at: self.clock.now(),
            })
            .await?;

        info!(user_id = %user.id, "user created");
        Ok(user)
    }

    async fn update_credentials(
        &self,
        request: UpdateCredentialsInput,
    ) -> Result<UserIdentity, AuthError> {
        let UpdateCredentialsInput {
            user_id,
            email,
            password,
        } = request;
        Self::validate(&email, &password)?;

        let password_hash = self.credential_hasher.hash_password(&password).await?;
        let user = self
            .user_repo
            .update_credential(user_id, &password_hash, &email, self.clock.now())
            .await?
            .ok_or(AuthError::UserNotFound)?;

        info!(%user_id, "user credentials updated");
        Ok(user)
    }

    async fn reset(&self) -> Result<u64, AuthError> {
        if !self.secrets.allows_reset() {
            warn!(platform = ?self.secrets.platform, "reset refused");
            return Err(AuthError::Forbidden);
        }

        let tokens = self.refresh_token_repo.delete_all().await?;
        let users = self.user_repo.delete_all().await?;

        info!(users, tokens, "store reset");
        Ok(users)
    }
}
