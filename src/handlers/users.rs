use axum::{extract::State, http::StatusCode, Extension, Json};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::error;

use crate::app::AppState;
use crate::auth::{issue_token, Claims, Identity};
use crate::error::ApiError;
use crate::users::{hash_password, verify_password, NewUser, UserSourceError};

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// POST /api/v1/users/login - verify credentials, issue a token and
/// proactively populate the permission cache so the first authorized
/// request does not pay the refresh.
pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> Result<Json<Value>, ApiError> {
    let user = state
        .users
        .find_by_email(&body.email)
        .await
        .map_err(user_source_error)?
        .ok_or_else(|| ApiError::not_found("User not found. Please register first."))?;

    if !verify_password(&body.password, &user.password_hash) {
        return Err(ApiError::bad_request("Password incorrect."));
    }

    let claims = Claims::new(user.id, user.email.clone(), state.security.jwt_expiry_hours);
    let token = issue_token(&claims, &state.security.jwt_secret).map_err(|err| {
        error!(%err, "failed to issue token");
        ApiError::internal_server_error("Failed to issue token")
    })?;

    let permission = state.permissions.refresh().await.map_err(|err| {
        error!(%err, "failed to load permissions at login");
        ApiError::service_unavailable("Permission service unavailable")
    })?;

    Ok(Json(json!({
        "success": true,
        "message": "User logged in successfully.",
        "data": {
            "user": user.id,
            "email": user.email,
            "token": token,
            "permission": permission,
        }
    })))
}

/// POST /api/v1/users/signup
pub async fn signup(
    State(state): State<AppState>,
    Json(body): Json<SignupRequest>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let password_hash = hash_password(&body.password).map_err(|err| {
        error!(%err, "failed to hash password");
        ApiError::internal_server_error("Failed to create user")
    })?;

    let user = state
        .users
        .create(NewUser {
            name: body.name,
            email: body.email,
            password_hash,
            description: body.description,
        })
        .await
        .map_err(|err| match err {
            UserSourceError::DuplicateEmail => ApiError::conflict("email already exist."),
            other => user_source_error(other),
        })?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "message": "User created successfully.",
            "data": {
                "id": user.id,
                "name": user.name,
                "email": user.email,
                "description": user.description,
            }
        })),
    ))
}

/// GET /api/v1/users/me - echo the identity the gate attached.
pub async fn me(Extension(identity): Extension<Identity>) -> Json<Value> {
    Json(json!({
        "success": true,
        "data": {
            "user": identity.subject_id,
            "email": identity.email,
        }
    }))
}

fn user_source_error(err: UserSourceError) -> ApiError {
    error!(%err, "user source failure");
    ApiError::service_unavailable("User service unavailable")
}
