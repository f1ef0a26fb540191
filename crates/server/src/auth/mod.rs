//! Operator authentication: password hashing and session tokens.

pub mod password;
pub mod session;

pub use password::{hash_password, verify_password};
pub use session::{SESSION_COOKIE, SessionClaims, SessionError, issue_token, verify_token};

use crate::entity::user;
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

/// The authenticated user performing a state-changing operation.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct Operator {
    pub id: Uuid,
    pub email: String,
    pub role: String,
    pub display_name: String,
}

impl From<&user::Model> for Operator {
    fn from(user: &user::Model) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            role: user.role.clone(),
            display_name: user.display_name(),
        }
    }
}
