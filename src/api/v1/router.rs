use super::error::*;
use super::handler;
use crate::application_port::AuthService;
use crate::domain_model::UserId;
use crate::server::*;
use std::convert::Infallible;
use std::sync::Arc;
use warp::http::HeaderMap;
use warp::{Filter, reject};

const MAX_BODY_BYTES: u64 = 16 * 1024;

/// Everything under `/api` plus `/admin`.
pub fn routes(
    server: Arc<Server>,
) -> impl Filter<Extract = (impl warp::Reply,), Error = warp::Rejection> + Clone {
    let healthz = warp::path!("api" / "healthz")
        .and(warp::get())
        .and_then(handler::healthz);

    let create_user = warp::path!("api" / "users")
        .and(warp::post())
        .and(json_body())
        .and(with(server.user_service.clone()))
        .and_then(handler::create_user);

    let update_user = warp::path!("api" / "users")
        .and(warp::put())
        .and(json_body())
        .and(with_verification(server.auth_service.clone()))
        .and(with(server.user_service.clone()))
        .and_then(handler::update_user);

    let login = warp::path!("api" / "login")
        .and(warp::post())
        .and(json_body())
        .and(with(server.auth_service.clone()))
        .and_then(handler::login);

    let refresh = warp::path!("api" / "refresh")
        .and(warp::post())
        .and(warp::header::headers_cloned())
        .and(with(server.auth_service.clone()))
        .and_then(handler::refresh);

    let revoke = warp::path!("api" / "revoke")
        .and(warp::post())
        .and(warp::header::headers_cloned())
        .and(with(server.auth_service.clone()))
        .and_then(handler::revoke);

    let webhook = warp::path!("api" / "polka" / "webhooks")
        .and(warp::post())
        .and(warp::header::headers_cloned())
        .and(warp::body::content_length_limit(MAX_BODY_BYTES))
        .and(warp::body::bytes())
        .and(with(server.auth_service.clone()))
        .and_then(handler::webhook);

    let reset = warp::path!("admin" / "reset")
        .and(warp::post())
        .and(with(server.user_service.clone()))
        .and_then(handler::reset);

    healthz
        .or(create_user)
        .or(update_user)
        .or(login)
        .or(refresh)
        .or(revoke)
        .or(webhook)
        .or(reset)
}

fn json_body<T>() -> impl Filter<Extract = (T,), Error = warp::Rejection> + Clone
where
    T: serde::de::DeserializeOwned + Send,
{
    warp::body::content_length_limit(MAX_BODY_BYTES).and(warp::body::json())
}

fn with<ServiceType>(
    service: Arc<ServiceType>,
) -> impl Filter<Extract = (Arc<ServiceType>,), Error = Infallible> + Clone
where
    ServiceType: Send + Sync + ?Sized,
{
    warp::any().map(move || service.clone())
}

fn with_verification(
    auth_service: Arc<dyn AuthService>,
) -> impl Filter<Extract = (UserId,), Error = warp::Rejection> + Clone {
    warp::header::headers_cloned().and_then(move |headers: HeaderMap| {
        let auth_service = auth_service.clone();
        async move {
            auth_service
                .verify_bearer(&headers)
                .await
                .map_err(ApiErrorCode::from)
                .map_err(reject::custom)
        }
    })
}
