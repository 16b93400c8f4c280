use chrono::{Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub mod authorize;
pub mod gate;

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub email: String,
    pub iat: i64,
    pub exp: i64,
}

impl Claims {
    pub fn new(sub: Uuid, email: String, expiry_hours: u64) -> Self {
        let now = Utc::now();
        let exp = (now + Duration::hours(expiry_hours as i64)).timestamp();

        Self {
            sub,
            email,
            iat: now.timestamp(),
            exp,
        }
    }
}

/// Identity derived from a verified token. Request-scoped only, never persisted.
#[derive(Clone, Debug)]
pub struct Identity {
    pub subject_id: Uuid,
    pub email: String,
}

impl From<Claims> for Identity {
    fn from(claims: Claims) -> Self {
        Self {
            subject_id: claims.sub,
            email: claims.email,
        }
    }
}

/// Failure taxonomy for the authorization pipeline. The Display strings are
/// the user-facing messages; token kinds share the 401 status but stay
/// distinguishable by message.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Signature invalid")]
    SignatureInvalid,
    #[error("Missing or malformed authorization header")]
    MissingAuthHeader,
    #[error("Authentication token expired")]
    TokenExpired,
    #[error("Invalid authentication token")]
    TokenMalformed,
    #[error("Failed to authenticate token")]
    TokenVerification,
    #[error("Permission not allowed")]
    PermissionLookupFailed,
    #[error("Permission not allowed")]
    PermissionDenied,
}

pub fn issue_token(claims: &Claims, secret: &str) -> Result<String, jsonwebtoken::errors::Error> {
    let encoding_key = EncodingKey::from_secret(secret.as_bytes());
    encode(&Header::default(), claims, &encoding_key)
}

/// Validate a token and decode the identity it carries. Pure verification,
/// no side effects.
pub fn verify_token(token: &str, secret: &str) -> Result<Identity, AuthError> {
    let decoding_key = DecodingKey::from_secret(secret.as_bytes());
    let validation = Validation::default();

    let token_data = decode::<Claims>(token, &decoding_key, &validation).map_err(|err| {
        match err.kind() {
            ErrorKind::ExpiredSignature => AuthError::TokenExpired,
            ErrorKind::InvalidToken
            | ErrorKind::InvalidSignature
            | ErrorKind::Base64(_)
            | ErrorKind::Json(_)
            | ErrorKind::Utf8(_) => AuthError::TokenMalformed,
            _ => AuthError::TokenVerification,
        }
    })?;

    Ok(Identity::from(token_data.claims))
}

/// Extract the token from an `Authorization: Bearer <token>` header value.
/// The scheme check is case-insensitive.
pub fn bearer_token(header: Option<&str>) -> Result<&str, AuthError> {
    let header = header.ok_or(AuthError::MissingAuthHeader)?;
    let (scheme, token) = header.split_once(' ').ok_or(AuthError::MissingAuthHeader)?;

    if !scheme.eq_ignore_ascii_case("bearer") {
        return Err(AuthError::MissingAuthHeader);
    }

    let token = token.trim();
    if token.is_empty() {
        return Err(AuthError::MissingAuthHeader);
    }

    Ok(token)
}
