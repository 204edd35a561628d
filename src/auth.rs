use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use chrono::Utc;
use model::entities::user;
use store::sessions;
use tracing::{debug, warn};

use crate::error::ApiError;
use crate::policy::{self, Action, Resource};
use crate::schemas::AppState;

/// The user behind the request's `Authorization: Bearer <token>` header.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user: user::Model,
    pub token: String,
}

impl AuthUser {
    pub fn require(&self, resource: Resource, action: Action) -> Result<(), ApiError> {
        if policy::authorize(self.user.role, resource, action) {
            return Ok(());
        }
        warn!(
            "User {} ({:?}) denied {:?} on {:?}",
            self.user.id, self.user.role, action, resource
        );
        Err(ApiError::Forbidden {
            role: self.user.role,
            resource,
            action,
        })
    }
}

fn bearer_token(parts: &Parts) -> Option<&str> {
    let value = parts.headers.get(AUTHORIZATION)?.to_str().ok()?;
    let token = value.strip_prefix("Bearer ")?.trim();
    (!token.is_empty()).then_some(token)
}

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)
            .ok_or_else(|| ApiError::Unauthorized("Missing bearer token".to_string()))?;

        match sessions::resolve(&state.db, token, Utc::now()).await? {
            Some((session, user)) => {
                debug!("Request authenticated as user {}", user.id);
                Ok(AuthUser {
                    user,
                    token: session.token,
                })
            }
            None => Err(ApiError::Unauthorized(
                "Session is invalid or has expired".to_string(),
            )),
        }
    }
}
