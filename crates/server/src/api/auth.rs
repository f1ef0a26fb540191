//! Session endpoints and the extractor guarding mutating routes.
//!
//! - `POST /api/auth/register` - create an operator account
//! - `POST /api/auth/login` - exchange credentials for a session cookie
//! - `POST /api/auth/logout` - clear the session cookie
//! - `GET /api/auth/me` - the operator behind the current session

use crate::AppResources;
use crate::auth::Operator;
use crate::auth::session::{clear_session_cookie, session_cookie, token_from_headers};
use crate::error::{ErrorBody, OpsError};
use crate::services::accounts::{Account, AccountService, Credentials, Registration};
use axum::{
    Extension, Json,
    extract::FromRequestParts,
    http::{StatusCode, header, request::Parts},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use utoipa::ToSchema;
use utoipa_axum::{router::OpenApiRouter, routes};

pub const AUTH_TAG: &str = "Authentication";

/// Axum extractor resolving the session token (cookie or Bearer header) to
/// an active operator. Rejects with 401 when there is no valid session.
///
/// ```ignore
/// async fn handler(CurrentOperator(operator): CurrentOperator) -> impl IntoResponse {
///     format!("Hello, {}", operator.display_name)
/// }
/// ```
pub struct CurrentOperator(pub Operator);

impl<S> FromRequestParts<S> for CurrentOperator
where
    S: Send + Sync,
{
    type Rejection = OpsError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let resources = parts
            .extensions
            .get::<AppResources>()
            .cloned()
            .ok_or_else(|| {
                tracing::error!("AppResources not found in extensions");
                OpsError::Upstream("server misconfigured".into())
            })?;

        let token = token_from_headers(&parts.headers).ok_or(OpsError::Unauthorized)?;
        let operator = AccountService::new(resources.db.clone(), resources.config.session.clone())
            .authenticate(&token)
            .await?;
        Ok(CurrentOperator(operator))
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AccountResponse {
    pub user: Account,
}

pub fn router() -> OpenApiRouter {
    OpenApiRouter::new()
        .routes(routes!(register))
        .routes(routes!(login))
        .routes(routes!(logout))
        .routes(routes!(me))
}

fn accounts(resources: &AppResources) -> AccountService {
    AccountService::new(resources.db.clone(), resources.config.session.clone())
}

#[tracing::instrument(skip(resources, payload))]
#[utoipa::path(
    post,
    path = "/api/auth/register",
    tag = AUTH_TAG,
    operation_id = "Register",
    summary = "Create an operator account",
    description = "Creates an account with an Argon2id password hash. The role defaults to `operator`.",
    request_body = Registration,
    responses(
        (status = 200, description = "Account created", body = AccountResponse),
        (status = 400, description = "Invalid input or email already registered", body = ErrorBody),
        (status = 500, description = "Internal server error", body = ErrorBody)
    )
)]
pub async fn register(
    Extension(resources): Extension<AppResources>,
    Json(payload): Json<Registration>,
) -> Result<Json<AccountResponse>, OpsError> {
    let user = accounts(&resources).register(payload).await?;
    Ok(Json(AccountResponse { user }))
}

#[tracing::instrument(skip(resources, payload))]
#[utoipa::path(
    post,
    path = "/api/auth/login",
    tag = AUTH_TAG,
    operation_id = "Login",
    summary = "Start an operator session",
    description = "Verifies the credentials and sets an HTTP-only `auth-token` session cookie.\n\n\
                   The same token is accepted as `Authorization: Bearer <token>` by API clients.",
    request_body = Credentials,
    responses(
        (status = 200, description = "Logged in, session cookie set", body = AccountResponse),
        (status = 401, description = "Invalid credentials", body = ErrorBody),
        (status = 500, description = "Internal server error", body = ErrorBody)
    )
)]
pub async fn login(
    Extension(resources): Extension<AppResources>,
    Json(payload): Json<Credentials>,
) -> Result<Response, OpsError> {
    let session = accounts(&resources).login(payload).await?;
    let cookie = session_cookie(&session.token, &resources.config.session);
    Ok((
        [(header::SET_COOKIE, cookie)],
        Json(AccountResponse {
            user: session.account,
        }),
    )
        .into_response())
}

#[tracing::instrument]
#[utoipa::path(
    post,
    path = "/api/auth/logout",
    tag = AUTH_TAG,
    operation_id = "Logout",
    summary = "End the operator session",
    responses(
        (status = 204, description = "Session cookie cleared")
    )
)]
pub async fn logout() -> impl IntoResponse {
    (
        StatusCode::NO_CONTENT,
        [(header::SET_COOKIE, clear_session_cookie())],
    )
}

#[tracing::instrument(skip(resources, operator), fields(user_id = %operator.id))]
#[utoipa::path(
    get,
    path = "/api/auth/me",
    tag = AUTH_TAG,
    operation_id = "Current Operator",
    summary = "Account of the current session",
    security(("session" = []), ("bearer" = [])),
    responses(
        (status = 200, description = "Current account", body = AccountResponse),
        (status = 401, description = "No valid session", body = ErrorBody)
    )
)]
pub async fn me(
    Extension(resources): Extension<AppResources>,
    CurrentOperator(operator): CurrentOperator,
) -> Result<Json<AccountResponse>, OpsError> {
    let user = accounts(&resources).account(operator.id).await?;
    Ok(Json(AccountResponse { user }))
}
