use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};
use tracing::warn;

use super::authorize::{authorize, Decision, RouteDescriptor};
use super::{bearer_token, verify_token, AuthError};
use crate::app::AppState;
use crate::error::ApiError;

/// Static shared-secret header every request must carry.
pub const SIGNATURE_HEADER: &str = "myschool-signature";

/// Paths exempt from bearer-token enforcement. Exact match only, no
/// prefix or wildcard matching.
const ALLOWED_PATHS: &[&str] = &["/api/v1/users/login", "/api/v1/users/signup"];

/// Per-request authorization pipeline:
/// signature check, allow-list bypass, token verification, permission
/// lookup, decision. Each stage short-circuits the rest; on Allow the
/// verified identity is attached to the request for downstream handlers.
pub async fn authentication_middleware(
    State(state): State<AppState>,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    // Signature gate runs first and unconditionally
    let signature = headers.get(SIGNATURE_HEADER).and_then(|v| v.to_str().ok());
    if state.security.api_key.is_empty() || signature != Some(state.security.api_key.as_str()) {
        return Err(AuthError::SignatureInvalid.into());
    }

    let path = request.uri().path().to_owned();
    if ALLOWED_PATHS.contains(&path.as_str()) {
        return Ok(next.run(request).await);
    }

    let auth_header = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());
    let token = bearer_token(auth_header)?;
    let identity = verify_token(token, &state.security.jwt_secret)?;

    // Cache miss falls back to the source of truth, synchronously. A failed
    // refresh fails closed.
    let permissions = match state.permissions.get().await {
        Some(records) => records,
        None => state.permissions.refresh().await.map_err(|err| {
            warn!(%err, "permission refresh failed during authorization");
            AuthError::PermissionLookupFailed
        })?,
    };

    let route = RouteDescriptor {
        path: &path,
        method: request.method().clone(),
    };

    match authorize(&identity, &route, &permissions) {
        Decision::Allow => {
            request.extensions_mut().insert(identity);
            Ok(next.run(request).await)
        }
        Decision::Deny(reason) => {
            warn!(?reason, %path, subject = %identity.subject_id, "request denied");
            Err(AuthError::PermissionDenied.into())
        }
    }
}
