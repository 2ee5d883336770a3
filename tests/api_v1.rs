mod common;

use chirpy::api;
use chirpy::application_port::Platform;
use chrono::Duration;
use common::*;
use serde_json::{Value, json};
use warp::Filter;
use warp::http::StatusCode;
use warp::http::header::AUTHORIZATION;

fn api(
    h: &Harness,
) -> impl Filter<Extract = (impl warp::Reply,), Error = std::convert::Infallible> + Clone + 'static
{
    api::v1::routes(h.server.clone()).recover(api::v1::recover_error)
}

fn body(res: &warp::http::Response<warp::hyper::body::Bytes>) -> Value {
    serde_json::from_slice(res.body()).unwrap()
}

async fn post_json(h: &Harness, path: &str, payload: Value) -> warp::http::Response<warp::hyper::body::Bytes> {
    warp::test::request()
        .method("POST")
        .path(path)
        .json(&payload)
        .reply(&api(h))
        .await
}

async fn post_with_auth(
    h: &Harness,
    path: &str,
    authorization: &str,
) -> warp::http::Response<warp::hyper::body::Bytes> {
    warp::test::request()
        .method("POST")
        .path(path)
        .header(AUTHORIZATION, authorization)
        .reply(&api(h))
        .await
}

async fn signup_and_login(h: &Harness) -> Value {
    let res = post_json(h, "/api/users", json!({"email": "a@b.com", "password": "secret123"})).await;
    assert_eq!(res.status(), StatusCode::CREATED);

    let res = post_json(h, "/api/login", json!({"email": "a@b.com", "password": "secret123"})).await;
    assert_eq!(res.status(), StatusCode::OK);
    body(&res)["data"].clone()
}

#[tokio::test]
async fn healthz_answers_ok() {
    let h = harness(Platform::Dev);
    let res = warp::test::request()
        .method("GET")
        .path("/api/healthz")
        .reply(&api(&h))
        .await;

    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.body().as_ref(), b"OK");
}

#[tokio::test]
async fn create_user_returns_the_public_identity() {
    let h = harness(Platform::Dev);
    let res = post_json(&h, "/api/users", json!({"email": "a@b.com", "password": "secret123"})).await;

    assert_eq!(res.status(), StatusCode::CREATED);
    let v = body(&res);
    assert_eq!(v["success"], true);
    assert_eq!(v["data"]["email"], "a@b.com");
    assert_eq!(v["data"]["is_chirpy_red"], false);
    assert!(v["data"]["id"].is_string());
    assert!(v["data"].get("password_hash").is_none());

    let dup = post_json(&h, "/api/users", json!({"email": "a@b.com", "password": "x"})).await;
    assert_eq!(dup.status(), StatusCode::CONFLICT);
    assert_eq!(body(&dup)["error"]["code"], "EmailTaken");
}

#[tokio::test]
async fn login_returns_user_and_both_tokens() {
    let h = harness(Platform::Dev);
    let data = signup_and_login(&h).await;

    assert_eq!(data["email"], "a@b.com");
    assert!(data["token"].as_str().unwrap().split('.').count() == 3);
    assert_eq!(data["refresh_token"].as_str().unwrap().len(), 64);
}

#[tokio::test]
async fn bad_login_is_a_generic_401() {
    let h = harness(Platform::Dev);
    signup_and_login(&h).await;

    for payload in [
        json!({"email": "a@b.com", "password": "wrong"}),
        json!({"email": "nobody@b.com", "password": "secret123"}),
    ] {
        let res = post_json(&h, "/api/login", payload).await;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
        let v = body(&res);
        assert_eq!(v["success"], false);
        assert_eq!(v["error"]["code"], "Unauthorized");
        assert_eq!(v["error"]["message"], "Unauthorized");
    }
}

#[tokio::test]
async fn refresh_then_revoke() {
    let h = harness(Platform::Dev);
    let data = signup_and_login(&h).await;
    let refresh = format!("Bearer {}", data["refresh_token"].as_str().unwrap());

    let res = post_with_auth(&h, "/api/refresh", &refresh).await;
    assert_eq!(res.status(), StatusCode::OK);
    assert!(body(&res)["data"]["token"].is_string());

    let res = post_with_auth(&h, "/api/revoke", &refresh).await;
    assert_eq!(res.status(), StatusCode::NO_CONTENT);
    assert!(res.body().is_empty());

    let res = post_with_auth(&h, "/api/revoke", &refresh).await;
    assert_eq!(res.status(), StatusCode::NO_CONTENT);

    let res = post_with_auth(&h, "/api/refresh", &refresh).await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn refresh_rejects_access_tokens_and_missing_headers() {
    let h = harness(Platform::Dev);
    let data = signup_and_login(&h).await;
    let access = format!("Bearer {}", data["token"].as_str().unwrap());

    let res = post_with_auth(&h, "/api/refresh", &access).await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = warp::test::request()
        .method("POST")
        .path("/api/refresh")
        .reply(&api(&h))
        .await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn expired_refresh_token_is_401() {
    let h = harness(Platform::Dev);
    let data = signup_and_login(&h).await;
    let refresh = format!("Bearer {}", data["refresh_token"].as_str().unwrap());

    h.clock.advance(Duration::days(61));
    let res = post_with_auth(&h, "/api/refresh", &refresh).await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn update_user_requires_a_valid_access_token() {
    let h = harness(Platform::Dev);
    let data = signup_and_login(&h).await;
    let payload = json!({"email": "new@b.com", "password": "newsecret"});

    let res = warp::test::request()
        .method("PUT")
        .path("/api/users")
        .json(&payload)
        .reply(&api(&h))
        .await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = warp::test::request()
        .method("PUT")
        .path("/api/users")
        .header(AUTHORIZATION, format!("Bearer {}", data["token"].as_str().unwrap()))
        .json(&payload)
        .reply(&api(&h))
        .await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(body(&res)["data"]["email"], "new@b.com");
    assert_eq!(body(&res)["data"]["id"], data["id"]);

    h.clock.advance(Duration::hours(1));
    let res = warp::test::request()
        .method("PUT")
        .path("/api/users")
        .header(AUTHORIZATION, format!("Bearer {}", data["token"].as_str().unwrap()))
        .json(&payload)
        .reply(&api(&h))
        .await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

async fn webhook(h: &Harness, authorization: Option<&str>, payload: Value) -> StatusCode {
    let mut req = warp::test::request()
        .method("POST")
        .path("/api/polka/webhooks")
        .json(&payload);
    if let Some(authorization) = authorization {
        req = req.header(AUTHORIZATION, authorization);
    }
    req.reply(&api(h)).await.status()
}

#[tokio::test]
async fn webhook_upgrades_with_the_right_key() {
    let h = harness(Platform::Dev);
    let data = signup_and_login(&h).await;
    let key = format!("ApiKey {}", WEBHOOK_KEY);
    let upgrade = json!({"event": "user.upgraded", "data": {"user_id": data["id"]}});

    assert_eq!(webhook(&h, None, upgrade.clone()).await, StatusCode::UNAUTHORIZED);
    assert_eq!(
        webhook(&h, Some("ApiKey wrong"), upgrade.clone()).await,
        StatusCode::UNAUTHORIZED
    );
    assert_eq!(
        webhook(&h, Some(&format!("Bearer {}", WEBHOOK_KEY)), upgrade.clone()).await,
        StatusCode::UNAUTHORIZED
    );

    assert_eq!(
        webhook(&h, Some(&key), json!({"event": "user.deleted", "data": {"user_id": data["id"]}}))
            .await,
        StatusCode::NO_CONTENT
    );
    let res = post_json(&h, "/api/login", json!({"email": "a@b.com", "password": "secret123"})).await;
    assert_eq!(body(&res)["data"]["is_chirpy_red"], false);

    assert_eq!(webhook(&h, Some(&key), upgrade).await, StatusCode::NO_CONTENT);
    let res = post_json(&h, "/api/login", json!({"email": "a@b.com", "password": "secret123"})).await;
    assert_eq!(body(&res)["data"]["is_chirpy_red"], true);

    let stranger = json!({
        "event": "user.upgraded",
        "data": {"user_id": "6c9d5d3e-2a55-4a79-9d0c-3c1c2b4f8a11"}
    });
    assert_eq!(webhook(&h, Some(&key), stranger).await, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn webhook_ignores_unknown_events_of_any_shape() {
    let h = harness(Platform::Dev);
    let key = format!("ApiKey {}", WEBHOOK_KEY);

    for payload in [
        json!({"event": "user.deleted", "data": {"user_id": 42}}),
        json!({"event": "invoice.paid", "data": {"user_id": "inv_123"}}),
        json!({"event": "invoice.paid", "data": ["x"]}),
        json!({"event": "invoice.paid"}),
    ] {
        assert_eq!(
            webhook(&h, Some(&key), payload.clone()).await,
            StatusCode::NO_CONTENT,
            "{payload}"
        );
    }

    let bad_upgrade = json!({"event": "user.upgraded", "data": {"user_id": "inv_123"}});
    assert_eq!(webhook(&h, Some(&key), bad_upgrade).await, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn webhook_checks_the_key_before_the_body() {
    let h = harness(Platform::Dev);

    let send = |authorization: Option<String>| {
        let mut req = warp::test::request()
            .method("POST")
            .path("/api/polka/webhooks")
            .header("content-type", "application/json")
            .body("{not json");
        if let Some(authorization) = authorization {
            req = req.header(AUTHORIZATION, authorization);
        }
        req
    };

    let res = send(None).reply(&api(&h)).await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = send(Some("ApiKey wrong".to_string())).reply(&api(&h)).await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = send(Some(format!("ApiKey {}", WEBHOOK_KEY)))
        .reply(&api(&h))
        .await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn reset_depends_on_platform() {
    let dev = harness(Platform::Dev);
    signup_and_login(&dev).await;
    let res = warp::test::request()
        .method("POST")
        .path("/admin/reset")
        .reply(&api(&dev))
        .await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(body(&res)["data"]["deleted"], 1);

    let prod = harness(Platform::Prod);
    let res = warp::test::request()
        .method("POST")
        .path("/admin/reset")
        .reply(&api(&prod))
        .await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    assert_eq!(body(&res)["error"]["code"], "Forbidden");
}

#[tokio::test]
async fn malformed_requests() {
    let h = harness(Platform::Dev);

    let res = warp::test::request()
        .method("POST")
        .path("/api/users")
        .header("content-type", "application/json")
        .body("{not json")
        .reply(&api(&h))
        .await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = post_json(&h, "/api/users", json!({"email": "not-an-email", "password": "x"})).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = warp::test::request()
        .method("GET")
        .path("/api/nothing-here")
        .reply(&api(&h))
        .await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = warp::test::request()
        .method("GET")
        .path("/api/login")
        .reply(&api(&h))
        .await;
    assert_eq!(res.status(), StatusCode::METHOD_NOT_ALLOWED);
}
