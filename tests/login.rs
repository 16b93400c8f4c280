//! Login and signup flow through the full application router, including the
//! proactive permission-cache population at login.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

use myschool_api::app::{self, AppState};
use myschool_api::auth::gate::SIGNATURE_HEADER;
use myschool_api::cache::MemoryCache;
use myschool_api::config::SecurityConfig;
use myschool_api::permissions::{InMemoryPermissionSource, PermissionRecord, PermissionStore};
use myschool_api::users::{hash_password, InMemoryUserSource, UserRecord};

const API_KEY: &str = "test-api-key";
const JWT_SECRET: &str = "test-jwt-secret";
const PASSWORD: &str = "secret123";

fn seeded_state() -> AppState {
    let admin = UserRecord {
        id: Uuid::new_v4(),
        name: "Admin".to_string(),
        email: "admin@myschool.test".to_string(),
        password_hash: hash_password(PASSWORD).expect("hash"),
        description: None,
    };

    AppState {
        security: Arc::new(SecurityConfig {
            api_key: API_KEY.to_string(),
            jwt_secret: JWT_SECRET.to_string(),
            jwt_expiry_hours: 1,
            permission_cache_ttl_secs: 3600,
        }),
        permissions: Arc::new(PermissionStore::new(
            Arc::new(MemoryCache::new()),
            Arc::new(InMemoryPermissionSource::new(vec![PermissionRecord {
                module: "users".to_string(),
                actions: vec!["r".to_string(), "w".to_string()],
                description: None,
            }])),
            Duration::from_secs(3600),
        )),
        users: Arc::new(InMemoryUserSource::new(vec![admin])),
    }
}

fn post_json(uri: &str, body: &Value) -> Result<Request<Body>> {
    Ok(Request::builder()
        .method("POST")
        .uri(uri)
        .header(SIGNATURE_HEADER, API_KEY)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(serde_json::to_vec(body)?))?)
}

async fn body_json(response: axum::response::Response) -> Result<Value> {
    let bytes = response.into_body().collect().await?.to_bytes();
    Ok(serde_json::from_slice(&bytes)?)
}

async fn login(router: &Router, email: &str, password: &str) -> Result<axum::response::Response> {
    let req = post_json(
        "/api/v1/users/login",
        &json!({ "email": email, "password": password }),
    )?;
    Ok(router.clone().oneshot(req).await?)
}

#[tokio::test]
async fn health_is_public() -> Result<()> {
    let router = app::router(seeded_state());

    let res = router
        .oneshot(Request::builder().uri("/health").body(Body::empty())?)
        .await?;
    assert_eq!(res.status(), StatusCode::OK);

    Ok(())
}

#[tokio::test]
async fn login_issues_token_and_populates_cache() -> Result<()> {
    let state = seeded_state();
    let router = app::router(state.clone());

    assert!(state.permissions.get().await.is_none());

    let res = login(&router, "admin@myschool.test", PASSWORD).await?;
    assert_eq!(res.status(), StatusCode::OK);

    let body = body_json(res).await?;
    assert_eq!(body["success"], true);
    assert!(body["data"]["token"].as_str().is_some_and(|t| !t.is_empty()));
    assert_eq!(body["data"]["permission"][0]["module"], "users");

    // Cache was populated proactively by the login
    let cached = state.permissions.get().await.expect("cache populated");
    assert_eq!(cached[0].module, "users");

    Ok(())
}

#[tokio::test]
async fn login_rejects_bad_credentials() -> Result<()> {
    let router = app::router(seeded_state());

    let res = login(&router, "admin@myschool.test", "wrong").await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = login(&router, "nobody@myschool.test", PASSWORD).await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    Ok(())
}

#[tokio::test]
async fn signup_then_login_then_me() -> Result<()> {
    let router = app::router(seeded_state());

    let res = router
        .clone()
        .oneshot(post_json(
            "/api/v1/users/signup",
            &json!({
                "name": "New Teacher",
                "email": "teacher@myschool.test",
                "password": PASSWORD,
            }),
        )?)
        .await?;
    assert_eq!(res.status(), StatusCode::CREATED);

    let res = login(&router, "teacher@myschool.test", PASSWORD).await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body = body_json(res).await?;
    let token = body["data"]["token"].as_str().expect("token").to_string();

    // The issued token authorizes a protected users-module route
    let res = router
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/v1/users/me")
                .header(SIGNATURE_HEADER, API_KEY)
                .header(header::AUTHORIZATION, format!("Bearer {token}"))
                .body(Body::empty())?,
        )
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let me = body_json(res).await?;
    assert_eq!(me["data"]["email"], "teacher@myschool.test");

    Ok(())
}

#[tokio::test]
async fn signup_rejects_duplicate_email() -> Result<()> {
    let router = app::router(seeded_state());

    let body = json!({
        "name": "Someone Else",
        "email": "admin@myschool.test",
        "password": PASSWORD,
    });
    let res = router
        .clone()
        .oneshot(post_json("/api/v1/users/signup", &body)?)
        .await?;
    assert_eq!(res.status(), StatusCode::CONFLICT);

    let payload = body_json(res).await?;
    assert_eq!(payload["code"], "CONFLICT");

    Ok(())
}
