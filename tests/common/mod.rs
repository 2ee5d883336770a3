#![allow(dead_code)]

use chirpy::application_port::{NewUserInput, Platform, SecretConfig};
use chirpy::domain_model::UserIdentity;
use chirpy::infra_memory::ManualClock;
use chirpy::server::Server;
use std::sync::Arc;
use warp::http::{HeaderMap, HeaderValue, header::AUTHORIZATION};

pub const TOKEN_SECRET: &str = "test-token-secret";
pub const WEBHOOK_KEY: &str = "f271c81ff7084ee5b99a5091b42d486e";

pub struct Harness {
    pub server: Arc<Server>,
    pub clock: Arc<ManualClock>,
}

pub fn harness(platform: Platform) -> Harness {
    let clock = Arc::new(ManualClock::starting_now());
    let secrets = SecretConfig {
        token_secret: TOKEN_SECRET.as_bytes().to_vec(),
        webhook_api_key: WEBHOOK_KEY.to_string(),
        platform,
    };
    let server = Arc::new(Server::in_memory(secrets, clock.clone()));
    Harness { server, clock }
}

impl Harness {
    pub async fn create_user(&self, email: &str, password: &str) -> UserIdentity {
        self.server
            .user_service
            .create_user(NewUserInput {
                email: email.to_string(),
                password: password.to_string(),
            })
            .await
            .unwrap()
    }
}

pub fn authorization(value: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(AUTHORIZATION, HeaderValue::from_str(value).unwrap());
    headers
}

pub fn bearer(token: &str) -> HeaderMap {
    authorization(&format!("Bearer {}", token))
}
