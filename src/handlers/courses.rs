use crate::auth::AuthUser;
use crate::error::ApiResult;
use crate::extract::AppJson;
use crate::handlers::{deleted, found, schedules::ScheduleResponse};
use crate::policy::{Action, Resource};
use crate::schemas::{ApiResponse, AppState, ErrorResponse};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use axum_valid::Valid;
use chrono::{DateTime, Utc};
use model::entities::course::{self, CourseStatus};
use serde::{Deserialize, Serialize};
use store::courses::{self, CourseChanges, NewCourse};
use store::schedules;
use tracing::{debug, info, instrument};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CourseResponse {
    pub id: i32,
    pub subject_id: i32,
    pub teacher_id: i32,
    pub academic_period_id: i32,
    pub course_code: String,
    pub max_students: i32,
    pub status: CourseStatus,
    pub created_at: DateTime<Utc>,
}

impl From<course::Model> for CourseResponse {
    fn from(model: course::Model) -> Self {
        Self {
            id: model.id,
            subject_id: model.subject_id,
            teacher_id: model.teacher_id,
            academic_period_id: model.academic_period_id,
            course_code: model.course_code,
            max_students: model.max_students,
            status: model.status,
            created_at: model.created_at,
        }
    }
}

/// Query parameters for listing courses
#[derive(Debug, Deserialize, IntoParams, Validate)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct CourseQuery {
    /// Only courses of this academic period
    #[validate(range(min = 1))]
    pub academic_period_id: Option<i32>,
    /// Only courses taught by this teacher
    #[validate(range(min = 1))]
    pub teacher_id: Option<i32>,
}

/// Get courses, optionally filtered by period and teacher
#[utoipa::path(
    get,
    path = "/api/v1/courses",
    tag = "courses",
    params(CourseQuery),
    responses(
        (status = 200, description = "Courses retrieved successfully", body = ApiResponse<Vec<CourseResponse>>),
        (status = 400, description = "Invalid filter", body = ErrorResponse),
        (status = 401, description = "Not logged in", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[instrument(skip(auth, state), fields(caller = auth.user.id))]
pub async fn get_courses(
    auth: AuthUser,
    Valid(Query(query)): Valid<Query<CourseQuery>>,
    State(state): State<AppState>,
) -> ApiResult<Json<ApiResponse<Vec<CourseResponse>>>> {
    auth.require(Resource::Courses, Action::Read)?;

    let mut courses = match (query.academic_period_id, query.teacher_id) {
        (Some(period_id), _) => courses::get_by_period(&state.db, period_id).await?,
        (None, Some(teacher_id)) => courses::get_by_teacher(&state.db, teacher_id).await?,
        (None, None) => courses::get_all(&state.db).await?,
    };
    if let (Some(_), Some(teacher_id)) = (query.academic_period_id, query.teacher_id) {
        courses.retain(|course| course.teacher_id == teacher_id);
    }

    debug!("Retrieved {} courses", courses.len());
    let data = courses.into_iter().map(CourseResponse::from).collect();
    Ok(Json(ApiResponse::new(data, "Courses retrieved successfully")))
}

/// Create a course offering
#[utoipa::path(
    post,
    path = "/api/v1/courses",
    tag = "courses",
    request_body = NewCourse,
    responses(
        (status = 201, description = "Course created successfully", body = ApiResponse<CourseResponse>),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 403, description = "Not allowed", body = ErrorResponse),
        (status = 409, description = "Unknown subject, teacher or period", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[instrument(skip(auth, state), fields(caller = auth.user.id))]
pub async fn create_course(
    auth: AuthUser,
    State(state): State<AppState>,
    AppJson(request): AppJson<NewCourse>,
) -> ApiResult<(StatusCode, Json<ApiResponse<CourseResponse>>)> {
    auth.require(Resource::Courses, Action::Create)?;

    let course = courses::create(&state.db, request).await?;
    info!("Course {} ({}) created", course.id, course.course_code);
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new(CourseResponse::from(course), "Course created successfully")),
    ))
}

/// Get a course by ID
#[utoipa::path(
    get,
    path = "/api/v1/courses/{course_id}",
    tag = "courses",
    params(("course_id" = i32, Path, description = "Course ID")),
    responses(
        (status = 200, description = "Course retrieved successfully", body = ApiResponse<CourseResponse>),
        (status = 404, description = "Course not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[instrument(skip(auth, state), fields(caller = auth.user.id))]
pub async fn get_course(
    auth: AuthUser,
    Path(course_id): Path<i32>,
    State(state): State<AppState>,
) -> ApiResult<Json<ApiResponse<CourseResponse>>> {
    auth.require(Resource::Courses, Action::Read)?;

    let course = found(courses::get_by_id(&state.db, course_id).await?, "Course", course_id)?;
    Ok(Json(ApiResponse::new(CourseResponse::from(course), "Course retrieved successfully")))
}

/// Update a course
#[utoipa::path(
    put,
    path = "/api/v1/courses/{course_id}",
    tag = "courses",
    params(("course_id" = i32, Path, description = "Course ID")),
    request_body = CourseChanges,
    responses(
        (status = 200, description = "Course updated successfully", body = ApiResponse<CourseResponse>),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 404, description = "Course not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[instrument(skip(auth, state), fields(caller = auth.user.id))]
pub async fn update_course(
    auth: AuthUser,
    Path(course_id): Path<i32>,
    State(state): State<AppState>,
    AppJson(request): AppJson<CourseChanges>,
) -> ApiResult<Json<ApiResponse<CourseResponse>>> {
    auth.require(Resource::Courses, Action::Update)?;

    let course = found(courses::update(&state.db, course_id, request).await?, "Course", course_id)?;
    info!("Course {} updated", course.id);
    Ok(Json(ApiResponse::new(CourseResponse::from(course), "Course updated successfully")))
}

/// Delete a course with its enrollments and schedule
#[utoipa::path(
    delete,
    path = "/api/v1/courses/{course_id}",
    tag = "courses",
    params(("course_id" = i32, Path, description = "Course ID")),
    responses(
        (status = 200, description = "Course deleted successfully", body = ApiResponse<String>),
        (status = 403, description = "Only administrators delete courses", body = ErrorResponse),
        (status = 404, description = "Course not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[instrument(skip(auth, state), fields(caller = auth.user.id))]
pub async fn delete_course(
    auth: AuthUser,
    Path(course_id): Path<i32>,
    State(state): State<AppState>,
) -> ApiResult<Json<ApiResponse<String>>> {
    auth.require(Resource::Courses, Action::Delete)?;

    let message = deleted(courses::delete(&state.db, course_id).await?, "Course", course_id)?;
    Ok(Json(ApiResponse::new(message, "Course deleted successfully")))
}

/// Weekly time slots of a course
#[utoipa::path(
    get,
    path = "/api/v1/courses/{course_id}/schedules",
    tag = "courses",
    params(("course_id" = i32, Path, description = "Course ID")),
    responses(
        (status = 200, description = "Schedules retrieved successfully", body = ApiResponse<Vec<ScheduleResponse>>),
        (status = 404, description = "Course not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[instrument(skip(auth, state), fields(caller = auth.user.id))]
pub async fn get_course_schedules(
    auth: AuthUser,
    Path(course_id): Path<i32>,
    State(state): State<AppState>,
) -> ApiResult<Json<ApiResponse<Vec<ScheduleResponse>>>> {
    auth.require(Resource::Schedules, Action::Read)?;
    found(courses::get_by_id(&state.db, course_id).await?, "Course", course_id)?;

    let slots = schedules::get_by_course(&state.db, course_id).await?;
    let data = slots.into_iter().map(ScheduleResponse::from).collect();
    Ok(Json(ApiResponse::new(data, "Schedules retrieved successfully")))
}
