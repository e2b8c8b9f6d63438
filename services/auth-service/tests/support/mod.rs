#![allow(dead_code)]

use std::sync::Arc;

use anyhow::Result;
use auth_service::directory::{hash_password, UserDirectory, UserRecord};
use auth_service::metrics::AuthMetrics;
use auth_service::{build_router, AppState};
use axum::body::Body;
use axum::http::{header::AUTHORIZATION, header::CONTENT_TYPE, Request, StatusCode};
use axum::Router;
use common_auth::{SigningSecret, TokenConfig, TokenService};
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

pub const SECRET: &str = "fYz2mh6JUkIwNBMKP92zgSNm+r+4UytqnujKBUin0iFv9dQ+zw14oYJByjyHt149";

pub struct TestApp {
    pub state: AppState,
    pub router: Router,
}

pub fn seed_user(username: &str, password: &str, roles: &[&str], activated: bool) -> UserRecord {
    UserRecord {
        username: username.to_string(),
        password_hash: hash_password(password).expect("hash password"),
        roles: roles.iter().map(|role| role.to_string()).collect(),
        activated,
    }
}

pub fn test_app(users: Vec<UserRecord>) -> Result<TestApp> {
    let secret = SigningSecret::new(SECRET)?;
    let state = AppState {
        tokens: Arc::new(TokenService::new(TokenConfig::default(), &secret)?),
        directory: Arc::new(UserDirectory::from_records(users)?),
        metrics: Arc::new(AuthMetrics::new()?),
    };
    let router = build_router(state.clone(), &["http://localhost:3000".to_string()]);
    Ok(TestApp { state, router })
}

impl TestApp {
    pub async fn post_json(&self, uri: &str, body: Value) -> Result<(StatusCode, Value)> {
        let request = Request::builder()
            .method("POST")
            .uri(uri)
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))?;
        self.send(request).await
    }

    pub async fn get(&self, uri: &str, bearer: Option<&str>) -> Result<(StatusCode, Value)> {
        let mut request = Request::builder().uri(uri);
        if let Some(token) = bearer {
            request = request.header(AUTHORIZATION, format!("Bearer {token}"));
        }
        self.send(request.body(Body::empty())?).await
    }

    pub async fn get_text(&self, uri: &str) -> Result<(StatusCode, String)> {
        let request = Request::builder().uri(uri).body(Body::empty())?;
        let response = self.router.clone().oneshot(request).await?;
        let status = response.status();
        let bytes = response.into_body().collect().await?.to_bytes();
        Ok((status, String::from_utf8(bytes.to_vec())?))
    }

    async fn send(&self, request: Request<Body>) -> Result<(StatusCode, Value)> {
        let response = self.router.clone().oneshot(request).await?;
        let status = response.status();
        let bytes = response.into_body().collect().await?.to_bytes();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)?
        };
        Ok((status, body))
    }
}
