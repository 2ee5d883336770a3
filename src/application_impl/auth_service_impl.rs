use super::credential_extractor::{api_key_matches, bearer_token};
use crate::application_port::*;
use crate::domain_model::UserId;
use crate::domain_port::{Clock, UserRepo};
use serde::Deserialize;
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};
use warp::http::HeaderMap;

const DECOY_PASSWORD: &str = "chirpy.login.decoy";

#[derive(Deserialize)]
struct UpgradePayload {
    user_id: UserId,
}

pub struct RealAuthService {
    user_repo: Arc<dyn UserRepo>,
    credential_hasher: Arc<dyn CredentialHasher>,
    token_codec: Arc<dyn TokenCodec>,
    refresh_tokens: Arc<dyn RefreshTokenStore>,
    secrets: Arc<SecretConfig>,
    clock: Arc<dyn Clock>,
    decoy_hash: OnceCell<String>,
}

impl RealAuthService {
    pub fn new(
        user_repo: Arc<dyn UserRepo>,
        credential_hasher: Arc<dyn CredentialHasher>,
        token_codec: Arc<dyn TokenCodec>,
        refresh_tokens: Arc<dyn RefreshTokenStore>,
        secrets: Arc<SecretConfig>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            user_repo,
            credential_hasher,
            token_codec,
            refresh_tokens,
            secrets,
            clock,
            decoy_hash: OnceCell::new(),
        }
    }

    /// Verifies against a throwaway hash made by the same hasher, so an unknown
    /// email costs as much as a wrong password.
    async fn burn_verify(&self, password: &str) {
        let decoy = self
            .decoy_hash
            .get_or_try_init(|| self.credential_hasher.hash_password(DECOY_PASSWORD))
            .await;
        match decoy {
            Ok(hash) => {
                let _ = self.credential_hasher.verify_password(password, hash).await;
            }
            Err(e) => warn!("decoy hash unavailable: {}", e),
        }
    }
}

#[async_trait::async_trait]
impl AuthService for RealAuthService {
    async fn login(&self, request: LoginInput) -> Result<LoginResult, AuthError> {
        let LoginInput { email, password } = request;

        // Unknown email and wrong password must be indistinguishable to the caller.
        let Some(rec) = self.user_repo.find_by_email(&email).await? else {
            self.burn_verify(&password).await;
            debug!("login rejected: unknown email");
            return Err(AuthError::InvalidCredential);
        };

        let ok = self
            .credential_hasher
            .verify_password(&password, &rec.password_hash)
            .await
            .inspect_err(|e| warn!(user_id = %rec.identity.id, "stored hash unusable: {}", e))?;
        if !ok {
            debug!(user_id = %rec.identity.id, "login rejected: wrong password");
            return Err(AuthError::InvalidCredential);
        }

        let user_id = rec.identity.id;
        let (access_token, access_exp) = self.token_codec.issue_access_token(user_id)?;
        let refresh = self.refresh_tokens.issue(user_id).await?;

        info!(%user_id, "user logged in");
        Ok(LoginResult {
            user: rec.identity,
            tokens: AuthTokens {
                access_token,
                refresh_token: RefreshToken(refresh.token),
                access_token_expires_at: access_exp,
                refresh_token_expires_at: refresh.expires_at,
            },
        })
    }

    async fn refresh(&self, refresh_token: &str) -> Result<AccessGrant, AuthError> {
        let rec = self.refresh_tokens.use_for_refresh(refresh_token).await?;
        let (access_token, expires_at) = self.token_codec.issue_access_token(rec.user_id)?;

        debug!(user_id = %rec.user_id, "access token refreshed");
        Ok(AccessGrant {
            access_token,
            expires_at,
        })
    }

    async fn revoke(&self, refresh_token: &str) -> Result<(), AuthError> {
        self.refresh_tokens.revoke(refresh_token).await?;
        debug!("refresh token revoked");
        Ok(())
    }

    async fn authorize_webhook(&self, api_key: &str) -> Result<(), AuthError> {
        if api_key_matches(api_key, &self.secrets.webhook_api_key) {
            Ok(())
        } else {
            Err(AuthError::InvalidCredential)
        }
    }

    async fn upgrade_via_webhook(
        &self,
        request: WebhookInput,
    ) -> Result<WebhookOutcome, AuthError> {
        self.authorize_webhook(&request.api_key).await?;
        if request.event != UPGRADE_EVENT {
            debug!(event = %request.event, "ignoring webhook event");
            return Ok(WebhookOutcome::Ignored);
        }

        let UpgradePayload { user_id } = serde_json::from_value(request.data)
            .map_err(|e| AuthError::InvalidInput(format!("upgrade payload: {e}")))?;
        self.user_repo
            .set_privilege_flag(user_id, true, self.clock.now())
            .await?
            .ok_or(AuthError::UserNotFound)?;

        info!(%user_id, "user upgraded");
        Ok(WebhookOutcome::Upgraded)
    }

    async fn verify_bearer(&self, headers: &HeaderMap) -> Result<UserId, AuthError> {
        let token = bearer_token(headers)?;
        self.token_codec
            .verify_access_token(&AccessToken(token.to_string()))
    }

    async fn hash_password(&self, password: &str) -> Result<String, AuthError> {
        self.credential_hasher.hash_password(password).await
    }

    async fn verify_password(
        &self,
        password: &str,
        password_hash: &str,
    ) -> Result<bool, AuthError> {
        self.credential_hasher
            .verify_password(password, password_hash)
            .await
    }
}
