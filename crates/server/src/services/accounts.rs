//! Operator accounts: registration, login and session resolution.

use crate::audit::{AuditAction, AuditEvent, AuditLog};
use crate::auth::password::check_new_password;
use crate::auth::{Operator, hash_password, issue_token, verify_password, verify_token};
use crate::config::SessionConfig;
use crate::entity::user;
use crate::error::OpsError;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use time::OffsetDateTime;
use utoipa::ToSchema;
use uuid::Uuid;

pub const DEFAULT_ROLE: &str = "operator";

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct Registration {
    pub email: String,
    pub password: String,
    #[serde(alias = "firstName")]
    pub first_name: String,
    #[serde(alias = "lastName")]
    pub last_name: String,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub department: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

/// Public view of a user account.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct Account {
    pub id: Uuid,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub role: String,
    pub department: Option<String>,
}

impl From<user::Model> for Account {
    fn from(u: user::Model) -> Self {
        Self {
            id: u.id,
            email: u.email,
            first_name: u.first_name,
            last_name: u.last_name,
            role: u.role,
            department: u.department,
        }
    }
}

/// A successful login: the account plus its signed session token.
#[derive(Debug, Clone)]
pub struct Session {
    pub account: Account,
    pub token: String,
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

pub struct AccountService {
    db: Arc<DatabaseConnection>,
    session: SessionConfig,
}

impl AccountService {
    pub fn new(db: Arc<DatabaseConnection>, session: SessionConfig) -> Self {
        Self { db, session }
    }

    #[tracing::instrument(skip(self, registration), fields(email = %registration.email))]
    pub async fn register(&self, registration: Registration) -> Result<Account, OpsError> {
        let email = normalize_email(&registration.email);
        if !email.contains('@') {
            return Err(OpsError::validation("email address is invalid"));
        }
        check_new_password(&registration.password, &email)?;
        if registration.first_name.trim().is_empty() || registration.last_name.trim().is_empty() {
            return Err(OpsError::validation("first and last name are required"));
        }

        let existing = user::Entity::find()
            .filter(user::Column::Email.eq(&email))
            .one(self.db.as_ref())
            .await?;
        if existing.is_some() {
            return Err(OpsError::validation("an account with this email already exists"));
        }

        let password_hash = hash_password(&registration.password).map_err(|e| {
            tracing::error!(error = %e, "Failed to hash password");
            OpsError::Upstream("password hashing failed".into())
        })?;

        let now = OffsetDateTime::now_utc();
        let created = user::ActiveModel {
            id: Set(Uuid::new_v4()),
            email: Set(email),
            password_hash: Set(password_hash),
            first_name: Set(registration.first_name.trim().to_string()),
            last_name: Set(registration.last_name.trim().to_string()),
            role: Set(registration
                .role
                .filter(|r| !r.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_ROLE.to_string())),
            department: Set(registration.department),
            phone: Set(registration.phone),
            is_active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(self.db.as_ref())
        .await?;

        tracing::info!(user_id = %created.id, "Account registered");
        Ok(created.into())
    }

    /// Check credentials and issue a session token. Every failure reads the
    /// same to the caller.
    #[tracing::instrument(skip(self, credentials), fields(email = %credentials.email))]
    pub async fn login(&self, credentials: Credentials) -> Result<Session, OpsError> {
        let email = normalize_email(&credentials.email);
        let user = user::Entity::find()
            .filter(user::Column::Email.eq(&email))
            .filter(user::Column::IsActive.eq(true))
            .one(self.db.as_ref())
            .await?
            .ok_or(OpsError::Unauthorized)?;

        if !verify_password(&credentials.password, &user.password_hash) {
            tracing::debug!(user_id = %user.id, "Password mismatch");
            return Err(OpsError::Unauthorized);
        }

        let token = issue_token(&user, &self.session).map_err(|e| {
            tracing::error!(error = %e, "Failed to issue session token");
            OpsError::Upstream("session signing failed".into())
        })?;

        AuditLog::on(self.db.as_ref())
            .append(
                AuditEvent::new(user.id, AuditAction::Login)
                    .details(json!({ "email": user.email })),
            )
            .await?;

        tracing::info!(user_id = %user.id, "Operator logged in");
        Ok(Session {
            account: user.into(),
            token,
        })
    }

    /// Resolve a session token to the active user it was issued for.
    pub async fn authenticate(&self, token: &str) -> Result<Operator, OpsError> {
        let claims = verify_token(token, &self.session).map_err(|e| {
            tracing::debug!(error = %e, "Rejected session token");
            OpsError::Unauthorized
        })?;
        let user_id = claims.user_id().map_err(|_| OpsError::Unauthorized)?;

        let user = user::Entity::find_by_id(user_id)
            .one(self.db.as_ref())
            .await?
            .filter(|u| u.is_active)
            .ok_or(OpsError::Unauthorized)?;
        Ok(Operator::from(&user))
    }

    pub async fn account(&self, user_id: Uuid) -> Result<Account, OpsError> {
        user::Entity::find_by_id(user_id)
            .one(self.db.as_ref())
            .await?
            .map(Account::from)
            .ok_or_else(|| OpsError::not_found("User"))
    }
}
