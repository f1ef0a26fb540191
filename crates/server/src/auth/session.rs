//! Signed, time-limited session tokens.
//!
//! Tokens are HS256 JWTs carrying the user id, email and role. They travel in
//! the HTTP-only `auth-token` cookie, or in an `Authorization: Bearer` header
//! for API clients.

use crate::config::SessionConfig;
use crate::entity::user;
use axum::http::{HeaderMap, header};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use time::OffsetDateTime;
use uuid::Uuid;

pub const SESSION_COOKIE: &str = "auth-token";

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Failed to sign session token: {0}")]
    Sign(jsonwebtoken::errors::Error),
    #[error("Invalid session token: {0}")]
    Invalid(jsonwebtoken::errors::Error),
    #[error("Session token subject is not a user id")]
    BadSubject,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    pub sub: String,
    pub email: String,
    pub role: String,
    pub iat: usize,
    pub exp: usize,
}

impl SessionClaims {
    pub fn user_id(&self) -> Result<Uuid, SessionError> {
        Uuid::parse_str(&self.sub).map_err(|_| SessionError::BadSubject)
    }
}

/// Sign a session token for `user`, valid for the configured TTL.
pub fn issue_token(user: &user::Model, config: &SessionConfig) -> Result<String, SessionError> {
    let now = OffsetDateTime::now_utc();
    let exp = now + time::Duration::hours(config.ttl_hours);
    let claims = SessionClaims {
        sub: user.id.to_string(),
        email: user.email.clone(),
        role: user.role.clone(),
        iat: now.unix_timestamp() as usize,
        exp: exp.unix_timestamp() as usize,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.secret.as_bytes()),
    )
    .map_err(SessionError::Sign)
}

/// Verify signature and expiry.
pub fn verify_token(token: &str, config: &SessionConfig) -> Result<SessionClaims, SessionError> {
    decode::<SessionClaims>(
        token,
        &DecodingKey::from_secret(config.secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(SessionError::Invalid)
}

/// Pull a session token from the `auth-token` cookie or a Bearer header.
pub fn token_from_headers(headers: &HeaderMap) -> Option<String> {
    let from_cookie = headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, value)| value.to_string());

    from_cookie.or_else(|| {
        headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .map(|t| t.trim().to_string())
    })
}

/// `Set-Cookie` value installing the session token.
pub fn session_cookie(token: &str, config: &SessionConfig) -> String {
    let max_age = config.ttl_hours * 60 * 60;
    let mut cookie =
        format!("{SESSION_COOKIE}={token}; Path=/; HttpOnly; SameSite=Strict; Max-Age={max_age}");
    if config.secure_cookie {
        cookie.push_str("; Secure");
    }
    cookie
}

/// `Set-Cookie` value removing the session token.
pub fn clear_session_cookie() -> String {
    format!("{SESSION_COOKIE}=; Path=/; HttpOnly; SameSite=Strict; Max-Age=0")
}
