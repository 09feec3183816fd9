use axum::{extract::FromRequestParts, http::request::Parts};
use uuid::Uuid;

use crate::app_state::AppState;
use crate::db::{User, UserRole, UserStatus};
use crate::error::AppError;

/// Header carrying the id of the user the auth gateway authenticated.
pub const USER_ID_HEADER: &str = "x-user-id";

/// The authenticated caller, loaded from the user store.
#[derive(Debug, Clone)]
pub struct AuthUser(pub User);

impl AuthUser {
    pub fn id(&self) -> Uuid {
        self.0.id
    }

    pub fn role(&self) -> UserRole {
        self.0.role
    }

    pub fn user(&self) -> &User {
        &self.0
    }

    /// Fails with `Forbidden` unless the caller holds one of `roles`.
    pub fn require(&self, roles: &[UserRole]) -> Result<&User, AppError> {
        if roles.contains(&self.0.role) {
            Ok(&self.0)
        } else {
            Err(AppError::Forbidden(
                "You do not have permission to perform this action".to_string(),
            ))
        }
    }
}

fn caller_id(parts: &Parts) -> Result<Uuid, AppError> {
    let raw = parts
        .headers
        .get(USER_ID_HEADER)
        .ok_or_else(|| AppError::Unauthorized("Authentication required".to_string()))?;
    raw.to_str()
        .ok()
        .and_then(|value| Uuid::parse_str(value.trim()).ok())
        .ok_or_else(|| AppError::Unauthorized("Invalid session".to_string()))
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user_id = caller_id(parts)?;
        let user = state
            .repos
            .users
            .get_user(user_id)
            .await?
            .ok_or_else(|| AppError::Unauthorized("Invalid session".to_string()))?;

        if user.status == UserStatus::Suspended {
            tracing::info!(user_id = %user.id, "suspended account rejected");
            return Err(AppError::Unauthorized("Account is suspended".to_string()));
        }

        Ok(AuthUser(user))
    }
}
