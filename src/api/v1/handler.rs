use super::error::*;
use crate::application_impl::{api_key, bearer_token};
use crate::application_port::{
    AccessToken, AuthService, LoginInput, NewUserInput, RefreshToken, UpdateCredentialsInput,
    UserService, WebhookInput, WebhookOutcome,
};
use crate::domain_model::{UserId, UserIdentity};
use crate::logger::*;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use warp::hyper::body::Bytes;
use warp::http::{HeaderMap, StatusCode};
use warp::{self, reject};

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<ApiError>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        ApiResponse {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn err(code: ApiErrorCode, message: impl Into<String>) -> Self {
        ApiResponse {
            success: false,
            data: None,
            error: Some(ApiError {
                code,
                message: message.into(),
            }),
        }
    }
}

fn no_content() -> impl warp::Reply {
    warp::reply::with_status(warp::reply(), StatusCode::NO_CONTENT)
}

pub async fn healthz() -> Result<impl warp::Reply, warp::Rejection> {
    Ok("OK")
}

#[derive(Deserialize)]
pub struct CredentialsRequest {
    pub email: String,
    pub password: String,
}

pub async fn create_user(
    body: CredentialsRequest,
    user_service: Arc<dyn UserService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let user = user_service
        .create_user(NewUserInput {
            email: body.email,
            password: body.password,
        })
        .await
        .map_err(ApiErrorCode::from)
        .map_err(reject::custom)?;

    Ok(warp::reply::with_status(
        warp::reply::json(&ApiResponse::ok(user)),
        StatusCode::CREATED,
    ))
}

pub async fn update_user(
    body: CredentialsRequest,
    user_id: UserId,
    user_service: Arc<dyn UserService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let user = user_service
        .update_credentials(UpdateCredentialsInput {
            user_id,
            email: body.email,
            password: body.password,
        })
        .await
        .map_err(ApiErrorCode::from)
        .map_err(reject::custom)?;

    Ok(warp::reply::json(&ApiResponse::ok(user)))
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    #[serde(flatten)]
    pub user: UserIdentity,
    pub token: AccessToken,
    pub token_expires_at: DateTime<Utc>,
    pub refresh_token: RefreshToken,
}

pub async fn login(
    body: CredentialsRequest,
    auth_service: Arc<dyn AuthService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let login_result = auth_service
        .login(LoginInput {
            email: body.email,
            password: body.password,
        })
        .await
        .map_err(ApiErrorCode::from)
        .map_err(reject::custom)?;

    let login_response = LoginResponse {
        user: login_result.user,
        token: login_result.tokens.access_token,
        token_expires_at: login_result.tokens.access_token_expires_at,
        refresh_token: login_result.tokens.refresh_token,
    };
    Ok(warp::reply::json(&ApiResponse::ok(login_response)))
}

#[derive(Debug, Serialize)]
pub struct RefreshResponse {
    pub token: AccessToken,
    pub expires_at: DateTime<Utc>,
}

/// The refresh token travels as a bearer credential.
pub async fn refresh(
    headers: HeaderMap,
    auth_service: Arc<dyn AuthService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let refresh_token = bearer_token(&headers)
        .map_err(ApiErrorCode::from)
        .map_err(reject::custom)?;
    let grant = auth_service
        .refresh(refresh_token)
        .await
        .map_err(ApiErrorCode::from)
        .map_err(reject::custom)?;

    Ok(warp::reply::json(&ApiResponse::ok(RefreshResponse {
        token: grant.access_token,
        expires_at: grant.expires_at,
    })))
}

pub async fn revoke(
    headers: HeaderMap,
    auth_service: Arc<dyn AuthService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let refresh_token = bearer_token(&headers)
        .map_err(ApiErrorCode::from)
        .map_err(reject::custom)?;
    auth_service
        .revoke(refresh_token)
        .await
        .map_err(ApiErrorCode::from)
        .map_err(reject::custom)?;

    Ok(no_content())
}

#[derive(Deserialize)]
pub struct WebhookRequest {
    pub event: String,
    #[serde(default)]
    pub data: serde_json::Value,
}

/// The body is only decoded once the API key has been accepted.
pub async fn webhook(
    headers: HeaderMap,
    body: Bytes,
    auth_service: Arc<dyn AuthService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let key = api_key(&headers)
        .map_err(ApiErrorCode::from)
        .map_err(reject::custom)?;
    auth_service
        .authorize_webhook(key)
        .await
        .map_err(ApiErrorCode::from)
        .map_err(reject::custom)?;

    let request: WebhookRequest = serde_json::from_slice(&body).map_err(|e| {
        debug!("rejected webhook body: {}", e);
        reject::custom(ApiErrorCode::BadRequest)
    })?;
    let outcome = auth_service
        .upgrade_via_webhook(WebhookInput {
            api_key: key.to_string(),
            event: request.event,
            data: request.data,
        })
        .await
        .map_err(ApiErrorCode::from)
        .map_err(reject::custom)?;

    if outcome == WebhookOutcome::Ignored {
        debug!("webhook acknowledged without change");
    }
    Ok(no_content())
}

#[derive(Debug, Serialize)]
pub struct ResetResponse {
    pub deleted: u64,
}

pub async fn reset(
    user_service: Arc<dyn UserService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let deleted = user_service
        .reset()
        .await
        .map_err(ApiErrorCode::from)
        .map_err(reject::custom)?;

    Ok(warp::reply::json(&ApiResponse::ok(ResetResponse { deleted })))
}
