use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::auth::gate;
use crate::config::SecurityConfig;
use crate::handlers::users;
use crate::permissions::PermissionStore;
use crate::users::UserSource;

#[derive(Clone)]
pub struct AppState {
    pub security: Arc<SecurityConfig>,
    pub permissions: Arc<PermissionStore>,
    pub users: Arc<dyn UserSource>,
}

/// Build the application router. The authentication gate wraps every route,
/// including the allow-listed ones (the signature check still applies there);
/// module CRUD routers mount under `/api/v1/<module>` behind the same gate.
pub fn router(state: AppState) -> Router {
    let api = Router::new()
        .route("/api/v1/users/login", post(users::login))
        .route("/api/v1/users/signup", post(users::signup))
        .route("/api/v1/users/me", get(users::me))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            gate::authentication_middleware,
        ));

    Router::new()
        .route("/health", get(health))
        .merge(api)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> Json<Value> {
    Json(json!({
        "success": true,
        "data": {
            "status": "ok",
            "timestamp": chrono::Utc::now(),
        }
    }))
}
