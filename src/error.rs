use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use model::entities::user::Role;
use store::StoreError;
use thiserror::Error;
use tracing::{error, warn};

use crate::policy::{Action, Resource};
use crate::schemas::ErrorResponse;

pub type ApiResult<T> = Result<T, ApiError>;

/// Errors a handler can answer with
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Store(#[from] StoreError),

    /// No bearer token, or one that does not match a live session
    #[error("{0}")]
    Unauthorized(String),

    #[error("Role {role:?} is not allowed to {action:?} {resource:?}")]
    Forbidden {
        role: Role,
        resource: Resource,
        action: Action,
    },
}

impl ApiError {
    pub fn not_found(entity: &str, id: i32) -> Self {
        ApiError::Store(StoreError::not_found(entity, id))
    }

    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::Store(err) => match err {
                StoreError::Validation(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
                StoreError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
                StoreError::Conflict(_) => (StatusCode::CONFLICT, "CONFLICT"),
                StoreError::CapacityReached { .. } => (StatusCode::CONFLICT, "COURSE_FULL"),
                StoreError::InvalidCredentials => (StatusCode::UNAUTHORIZED, "INVALID_CREDENTIALS"),
                StoreError::Credential(_) | StoreError::Database(_) => {
                    (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR")
                }
            },
            ApiError::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            ApiError::Forbidden { .. } => (StatusCode::FORBIDDEN, "FORBIDDEN"),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::Store(StoreError::Validation(rejection.body_text()))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        let message = if status.is_server_error() {
            error!("Request failed: {}", self);
            // Driver messages are not for clients
            "Internal server error".to_string()
        } else {
            warn!("Request rejected with {}: {}", status, self);
            self.to_string()
        };

        let body = ErrorResponse {
            error: message,
            code: code.to_string(),
            success: false,
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::DbErr;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (ApiError::from(StoreError::Validation("bad".into())), StatusCode::BAD_REQUEST),
            (ApiError::not_found("Course", 3), StatusCode::NOT_FOUND),
            (ApiError::from(StoreError::Conflict("dup".into())), StatusCode::CONFLICT),
            (
                ApiError::from(StoreError::CapacityReached {
                    course_id: 1,
                    max_students: 2,
                }),
                StatusCode::CONFLICT,
            ),
            (ApiError::from(StoreError::InvalidCredentials), StatusCode::UNAUTHORIZED),
            (ApiError::Unauthorized("no token".into()), StatusCode::UNAUTHORIZED),
            (
                ApiError::Forbidden {
                    role: Role::Student,
                    resource: Resource::Grades,
                    action: Action::Create,
                },
                StatusCode::FORBIDDEN,
            ),
            (
                ApiError::from(StoreError::Database(DbErr::Custom("boom".into()))),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, expected) in cases {
            assert_eq!(err.into_response().status(), expected);
        }
    }
}
