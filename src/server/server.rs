use crate::application_impl::*;
use crate::application_port::*;
use crate::domain_port::*;
use crate::infra_memory::*;
use crate::infra_mysql::*;
use crate::logger::*;
use crate::settings::{Auth, Settings};
use anyhow::anyhow;
use chrono::{Duration, Utc};
use sqlx::{MySql, Pool};
use std::sync::Arc;

/// How long issued credentials stay valid.
#[derive(Debug, Clone, Copy)]
pub struct SessionLifetimes {
    pub access_ttl: Duration,
    pub refresh_ttl: Duration,
}

fn fits_after_now(ttl: &Duration) -> bool {
    Utc::now().checked_add_signed(*ttl).is_some()
}

impl SessionLifetimes {
    /// Both lifetimes must be positive and representable.
    pub fn from_settings(auth: &Auth) -> anyhow::Result<Self> {
        let access_ttl = Some(auth.access_ttl_secs)
            .filter(|secs| *secs > 0)
            .and_then(Duration::try_seconds)
            .filter(fits_after_now)
            .ok_or_else(|| anyhow!("auth.access_ttl_secs out of range: {}", auth.access_ttl_secs))?;
        let refresh_ttl = Some(auth.refresh_ttl_days)
            .filter(|days| *days > 0)
            .and_then(Duration::try_days)
            .filter(fits_after_now)
            .ok_or_else(|| {
                anyhow!("auth.refresh_ttl_days out of range: {}", auth.refresh_ttl_days)
            })?;
        Ok(SessionLifetimes {
            access_ttl,
            refresh_ttl,
        })
    }
}

impl Default for SessionLifetimes {
    fn default() -> Self {
        SessionLifetimes {
            access_ttl: Duration::hours(1),
            refresh_ttl: Duration::days(60),
        }
    }
}

pub struct Server {
    pub auth_service: Arc<dyn AuthService>,
    pub user_service: Arc<dyn UserService>,
    pool: Option<Pool<MySql>>,
}

impl Server {
    pub async fn try_new(settings: &Settings) -> anyhow::Result<Self> {
        if settings.auth.token_secret.is_empty() {
            return Err(anyhow!("auth.token_secret must be set"));
        }
        let secrets = Arc::new(SecretConfig {
            token_secret: settings.auth.token_secret.clone().into_bytes(),
            webhook_api_key: settings.auth.webhook_api_key.clone(),
            platform: settings.platform.parse()?,
        });
        debug!(?secrets);
        if secrets.webhook_api_key.is_empty() {
            warn!("auth.webhook_api_key is empty, webhooks will be rejected");
        }

        let lifetimes = SessionLifetimes::from_settings(&settings.auth)?;
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);

        let server = match settings.store.backend.as_str() {
            "memory" => Self::assemble(
                Arc::new(MemoryUserRepo::new()),
                Arc::new(MemoryRefreshTokenRepo::new()),
                secrets,
                lifetimes,
                clock,
                None,
            ),
            "mysql" => {
                let dsn = settings
                    .store
                    .mysql_dsn
                    .as_deref()
                    .ok_or_else(|| anyhow!("store.mysql_dsn is required for the mysql backend"))?;
                let pool = Pool::<MySql>::connect(dsn).await?;
                Self::assemble(
                    Arc::new(MySqlUserRepo::new(pool.clone())),
                    Arc::new(MySqlRefreshTokenRepo::new(pool.clone())),
                    secrets,
                    lifetimes,
                    clock,
                    Some(pool),
                )
            }
            other => return Err(anyhow!("Unknown store backend: {}", other)),
        };

        info!(backend = %settings.store.backend, "server started");
        Ok(server)
    }

    /// Memory-backed server with default lifetimes and a caller-supplied clock.
    pub fn in_memory(secrets: SecretConfig, clock: Arc<dyn Clock>) -> Self {
        Self::assemble(
            Arc::new(MemoryUserRepo::new()),
            Arc::new(MemoryRefreshTokenRepo::new()),
            Arc::new(secrets),
            SessionLifetimes::default(),
            clock,
            None,
        )
    }

    fn assemble(
        user_repo: Arc<dyn UserRepo>,
        refresh_token_repo: Arc<dyn RefreshTokenRepo>,
        secrets: Arc<SecretConfig>,
        lifetimes: SessionLifetimes,
        clock: Arc<dyn Clock>,
        pool: Option<Pool<MySql>>,
    ) -> Self {
        let credential_hasher: Arc<dyn CredentialHasher> = Arc::new(Argon2PasswordHasher::new());
        let token_codec: Arc<dyn TokenCodec> = Arc::new(JwtHs256Codec::new(
            JwtConfig {
                issuer: TOKEN_ISSUER.to_string(),
                access_ttl: lifetimes.access_ttl,
                signing_key: secrets.token_secret.clone(),
            },
            clock.clone(),
        ));
        let refresh_tokens: Arc<dyn RefreshTokenStore> = Arc::new(RealRefreshTokenStore::new(
            refresh_token_repo.clone(),
            clock.clone(),
            lifetimes.refresh_ttl,
        ));

        let auth_service: Arc<dyn AuthService> = Arc::new(RealAuthService::new(
            user_repo.clone(),
            credential_hasher.clone(),
            token_codec,
            refresh_tokens,
            secrets.clone(),
            clock.clone(),
        ));
        let user_service: Arc<dyn UserService> = Arc::new(RealUserService::new(
            user_repo,
            refresh_token_repo,
            credential_hasher,
            secrets,
            clock,
        ));

        Self {
            auth_service,
            user_service,
            pool,
        }
    }

    pub async fn shutdown(&self) {
        info!("server shutting down...");

        if let Some(pool) = &self.pool {
            pool.close().await;
        }
    }
}
