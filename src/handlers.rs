pub mod academic_periods;
pub mod attendance;
pub mod auth;
pub mod courses;
pub mod dashboard;
pub mod departments;
pub mod enrollments;
pub mod grades;
pub mod health;
pub mod schedules;
pub mod students;
pub mod subjects;
pub mod teachers;
pub mod users;

use crate::error::{ApiError, ApiResult};

/// Turns a lookup that came back empty into a 404.
pub(crate) fn found<T>(value: Option<T>, entity: &str, id: i32) -> ApiResult<T> {
    value.ok_or_else(|| ApiError::not_found(entity, id))
}

/// Same for deletes, which report whether a row existed.
pub(crate) fn deleted(existed: bool, entity: &str, id: i32) -> ApiResult<String> {
    if existed {
        Ok(format!("{} {} deleted", entity, id))
    } else {
        Err(ApiError::not_found(entity, id))
    }
}
