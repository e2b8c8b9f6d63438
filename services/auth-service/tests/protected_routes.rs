mod support;

use anyhow::Result;
use axum::http::StatusCode;
use common_auth::{codec, SigningSecret, TokenConfig, TokenService};
use serde_json::json;
use support::{seed_user, test_app, SECRET};

fn issue_for(subject: &str) -> String {
    let secret = SigningSecret::new(SECRET).expect("secret");
    TokenService::new(TokenConfig::default(), &secret)
        .expect("service")
        .issue(subject)
        .expect("issue")
}

#[tokio::test]
async fn me_requires_bearer_token() -> Result<()> {
    let app = test_app(vec![seed_user("alice", "pw", &["admin"], true)])?;

    let (status, body) = app.get("/me", None).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "UNAUTHENTICATED");
    assert_eq!(app.state.metrics.rejection_count("missing_authorization"), 1);
    Ok(())
}

#[tokio::test]
async fn rejections_are_counted_by_reason_but_look_identical() -> Result<()> {
    let app = test_app(vec![seed_user("alice", "pw", &["admin"], true)])?;

    let now = chrono::Utc::now().timestamp();
    let header = codec::encode(br#"{"typ":"JWT","alg":"HS256"}"#);
    let payload = codec::encode(
        json!({"sub": "alice", "exp": now - 10, "nbf": now - 100, "iat": now - 100}).to_string(),
    );
    let input = format!("{header}.{payload}");
    let signer = common_auth::Signer::new(&SigningSecret::new(SECRET)?)?;
    let expired = format!("{input}.{}", codec::encode(signer.sign(input.as_bytes())));

    let (status_expired, body_expired) = app.get("/me", Some(&expired)).await?;
    let (status_malformed, body_malformed) = app.get("/me", Some("a.b")).await?;

    assert_eq!(status_expired, StatusCode::UNAUTHORIZED);
    assert_eq!(status_malformed, StatusCode::UNAUTHORIZED);
    assert_eq!(body_expired, body_malformed);
    assert_eq!(app.state.metrics.rejection_count("expired"), 1);
    assert_eq!(app.state.metrics.rejection_count("malformed_token"), 1);
    Ok(())
}

#[tokio::test]
async fn valid_token_for_removed_user_is_unauthenticated() -> Result<()> {
    let app = test_app(vec![seed_user("alice", "pw", &["admin"], true)])?;

    let (status, body) = app.get("/me", Some(&issue_for("ghost"))).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "UNAUTHENTICATED");
    assert_eq!(app.state.metrics.rejection_count("unknown_subject"), 1);
    Ok(())
}

#[tokio::test]
async fn admin_route_checks_directory_roles() -> Result<()> {
    let app = test_app(vec![
        seed_user("alice", "pw", &["admin"], true),
        seed_user("bob", "pw", &["editor"], true),
    ])?;

    let (status, body) = app.get("/admin/ping", Some(&issue_for("alice"))).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"status": "ok"}));

    let (status, body) = app.get("/admin/ping", Some(&issue_for("bob"))).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "FORBIDDEN");
    Ok(())
}

#[tokio::test]
async fn health_and_metrics_are_public() -> Result<()> {
    let app = test_app(Vec::new())?;

    let (status, body) = app.get_text("/healthz").await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "ok");

    app.get("/me", None).await?;
    let (status, body) = app.get_text("/metrics").await?;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("auth_token_rejections_total"));
    Ok(())
}
