use crate::auth::AuthUser;
use crate::error::ApiResult;
use crate::extract::AppJson;
use crate::handlers::{attendance::AttendanceResponse, deleted, found, grades::GradeResponse};
use crate::policy::{Action, Resource};
use crate::schemas::{ApiResponse, AppState, ErrorResponse};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use axum_valid::Valid;
use chrono::{DateTime, Utc};
use model::entities::enrollment::{self, EnrollmentStatus};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use store::attendance::{self, AttendanceSummary};
use store::enrollments::{self, EnrollmentChanges, NewEnrollment};
use store::grades;
use tracing::{debug, info, instrument};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EnrollmentResponse {
    pub id: i32,
    pub student_id: i32,
    pub course_id: i32,
    pub enrollment_date: DateTime<Utc>,
    pub status: EnrollmentStatus,
    #[schema(value_type = Option<String>, example = "87.25")]
    pub final_grade: Option<Decimal>,
}

impl From<enrollment::Model> for EnrollmentResponse {
    fn from(model: enrollment::Model) -> Self {
        Self {
            id: model.id,
            student_id: model.student_id,
            course_id: model.course_id,
            enrollment_date: model.enrollment_date,
            status: model.status,
            final_grade: model.final_grade,
        }
    }
}

/// Weighted average of an enrollment's grades, in percent
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AverageResponse {
    pub enrollment_id: i32,
    /// Absent while no grade has been recorded
    #[schema(value_type = Option<String>, example = "87.25")]
    pub average: Option<Decimal>,
}

/// Query parameters for listing enrollments
#[derive(Debug, Deserialize, IntoParams, Validate)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct EnrollmentQuery {
    /// Only enrollments of this student
    #[validate(range(min = 1))]
    pub student_id: Option<i32>,
    /// Only enrollments in this course
    #[validate(range(min = 1))]
    pub course_id: Option<i32>,
}

async fn existing(state: &AppState, enrollment_id: i32) -> ApiResult<enrollment::Model> {
    found(
        enrollments::get_by_id(&state.db, enrollment_id).await?,
        "Enrollment",
        enrollment_id,
    )
}

/// Get enrollments, optionally filtered by student and course
#[utoipa::path(
    get,
    path = "/api/v1/enrollments",
    tag = "enrollments",
    params(EnrollmentQuery),
    responses(
        (status = 200, description = "Enrollments retrieved successfully", body = ApiResponse<Vec<EnrollmentResponse>>),
        (status = 400, description = "Invalid filter", body = ErrorResponse),
        (status = 401, description = "Not logged in", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[instrument(skip(auth, state), fields(caller = auth.user.id))]
pub async fn get_enrollments(
    auth: AuthUser,
    Valid(Query(query)): Valid<Query<EnrollmentQuery>>,
    State(state): State<AppState>,
) -> ApiResult<Json<ApiResponse<Vec<EnrollmentResponse>>>> {
    auth.require(Resource::Enrollments, Action::Read)?;

    let mut enrollments = match (query.student_id, query.course_id) {
        (Some(student_id), _) => enrollments::get_by_student(&state.db, student_id).await?,
        (None, Some(course_id)) => enrollments::get_by_course(&state.db, course_id).await?,
        (None, None) => enrollments::get_all(&state.db).await?,
    };
    if let (Some(_), Some(course_id)) = (query.student_id, query.course_id) {
        enrollments.retain(|enrollment| enrollment.course_id == course_id);
    }

    debug!("Retrieved {} enrollments", enrollments.len());
    let data = enrollments.into_iter().map(EnrollmentResponse::from).collect();
    Ok(Json(ApiResponse::new(data, "Enrollments retrieved successfully")))
}

/// Enroll a student in a course, subject to the course capacity
#[utoipa::path(
    post,
    path = "/api/v1/enrollments",
    tag = "enrollments",
    request_body = NewEnrollment,
    responses(
        (status = 201, description = "Student enrolled successfully", body = ApiResponse<EnrollmentResponse>),
        (status = 404, description = "Student or course not found", body = ErrorResponse),
        (status = 409, description = "Already enrolled or course full", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[instrument(skip(auth, state), fields(caller = auth.user.id))]
pub async fn create_enrollment(
    auth: AuthUser,
    State(state): State<AppState>,
    AppJson(request): AppJson<NewEnrollment>,
) -> ApiResult<(StatusCode, Json<ApiResponse<EnrollmentResponse>>)> {
    auth.require(Resource::Enrollments, Action::Create)?;

    let enrollment = enrollments::enroll(&state.db, request).await?;
    info!(
        "Student {} enrolled in course {} (enrollment {})",
        enrollment.student_id, enrollment.course_id, enrollment.id
    );
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new(
            EnrollmentResponse::from(enrollment),
            "Student enrolled successfully",
        )),
    ))
}

/// Get an enrollment by ID
#[utoipa::path(
    get,
    path = "/api/v1/enrollments/{enrollment_id}",
    tag = "enrollments",
    params(("enrollment_id" = i32, Path, description = "Enrollment ID")),
    responses(
        (status = 200, description = "Enrollment retrieved successfully", body = ApiResponse<EnrollmentResponse>),
        (status = 404, description = "Enrollment not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[instrument(skip(auth, state), fields(caller = auth.user.id))]
pub async fn get_enrollment(
    auth: AuthUser,
    Path(enrollment_id): Path<i32>,
    State(state): State<AppState>,
) -> ApiResult<Json<ApiResponse<EnrollmentResponse>>> {
    auth.require(Resource::Enrollments, Action::Read)?;

    let enrollment = existing(&state, enrollment_id).await?;
    Ok(Json(ApiResponse::new(
        EnrollmentResponse::from(enrollment),
        "Enrollment retrieved successfully",
    )))
}

/// Change the status or final grade of an enrollment
#[utoipa::path(
    put,
    path = "/api/v1/enrollments/{enrollment_id}",
    tag = "enrollments",
    params(("enrollment_id" = i32, Path, description = "Enrollment ID")),
    request_body = EnrollmentChanges,
    responses(
        (status = 200, description = "Enrollment updated successfully", body = ApiResponse<EnrollmentResponse>),
        (status = 404, description = "Enrollment not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[instrument(skip(auth, state), fields(caller = auth.user.id))]
pub async fn update_enrollment(
    auth: AuthUser,
    Path(enrollment_id): Path<i32>,
    State(state): State<AppState>,
    AppJson(request): AppJson<EnrollmentChanges>,
) -> ApiResult<Json<ApiResponse<EnrollmentResponse>>> {
    auth.require(Resource::Enrollments, Action::Update)?;

    let enrollment = found(
        enrollments::update(&state.db, enrollment_id, request).await?,
        "Enrollment",
        enrollment_id,
    )?;
    info!("Enrollment {} updated", enrollment.id);
    Ok(Json(ApiResponse::new(
        EnrollmentResponse::from(enrollment),
        "Enrollment updated successfully",
    )))
}

/// Delete an enrollment with its grades and attendance
#[utoipa::path(
    delete,
    path = "/api/v1/enrollments/{enrollment_id}",
    tag = "enrollments",
    params(("enrollment_id" = i32, Path, description = "Enrollment ID")),
    responses(
        (status = 200, description = "Enrollment deleted successfully", body = ApiResponse<String>),
        (status = 403, description = "Only administrators delete enrollments", body = ErrorResponse),
        (status = 404, description = "Enrollment not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[instrument(skip(auth, state), fields(caller = auth.user.id))]
pub async fn delete_enrollment(
    auth: AuthUser,
    Path(enrollment_id): Path<i32>,
    State(state): State<AppState>,
) -> ApiResult<Json<ApiResponse<String>>> {
    auth.require(Resource::Enrollments, Action::Delete)?;

    let message = deleted(
        enrollments::delete(&state.db, enrollment_id).await?,
        "Enrollment",
        enrollment_id,
    )?;
    Ok(Json(ApiResponse::new(message, "Enrollment deleted successfully")))
}

/// Grades recorded for an enrollment
#[utoipa::path(
    get,
    path = "/api/v1/enrollments/{enrollment_id}/grades",
    tag = "enrollments",
    params(("enrollment_id" = i32, Path, description = "Enrollment ID")),
    responses(
        (status = 200, description = "Grades retrieved successfully", body = ApiResponse<Vec<GradeResponse>>),
        (status = 404, description = "Enrollment not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[instrument(skip(auth, state), fields(caller = auth.user.id))]
pub async fn get_enrollment_grades(
    auth: AuthUser,
    Path(enrollment_id): Path<i32>,
    State(state): State<AppState>,
) -> ApiResult<Json<ApiResponse<Vec<GradeResponse>>>> {
    auth.require(Resource::Grades, Action::Read)?;
    existing(&state, enrollment_id).await?;

    let grades = grades::get_by_enrollment(&state.db, enrollment_id).await?;
    let data = grades.into_iter().map(GradeResponse::from).collect();
    Ok(Json(ApiResponse::new(data, "Grades retrieved successfully")))
}

/// Current weighted average without storing it
#[utoipa::path(
    get,
    path = "/api/v1/enrollments/{enrollment_id}/average",
    tag = "enrollments",
    params(("enrollment_id" = i32, Path, description = "Enrollment ID")),
    responses(
        (status = 200, description = "Average computed", body = ApiResponse<AverageResponse>),
        (status = 404, description = "Enrollment not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[instrument(skip(auth, state), fields(caller = auth.user.id))]
pub async fn get_enrollment_average(
    auth: AuthUser,
    Path(enrollment_id): Path<i32>,
    State(state): State<AppState>,
) -> ApiResult<Json<ApiResponse<AverageResponse>>> {
    auth.require(Resource::Grades, Action::Read)?;

    let average = grades::average_for(&state.db, enrollment_id).await?;
    Ok(Json(ApiResponse::new(
        AverageResponse {
            enrollment_id,
            average,
        },
        "Average computed successfully",
    )))
}

/// Store the weighted average as the enrollment's final grade
#[utoipa::path(
    post,
    path = "/api/v1/enrollments/{enrollment_id}/finalize",
    tag = "enrollments",
    params(("enrollment_id" = i32, Path, description = "Enrollment ID")),
    responses(
        (status = 200, description = "Final grade stored, empty when no grade exists", body = ApiResponse<EnrollmentResponse>),
        (status = 404, description = "Enrollment not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[instrument(skip(auth, state), fields(caller = auth.user.id))]
pub async fn finalize_enrollment(
    auth: AuthUser,
    Path(enrollment_id): Path<i32>,
    State(state): State<AppState>,
) -> ApiResult<Json<ApiResponse<EnrollmentResponse>>> {
    auth.require(Resource::Enrollments, Action::Update)?;

    let enrollment = grades::finalize(&state.db, enrollment_id).await?;
    info!("Enrollment {} finalized with {:?}", enrollment.id, enrollment.final_grade);
    Ok(Json(ApiResponse::new(
        EnrollmentResponse::from(enrollment),
        "Final grade stored successfully",
    )))
}

/// Attendance records of an enrollment, by date
#[utoipa::path(
    get,
    path = "/api/v1/enrollments/{enrollment_id}/attendance",
    tag = "enrollments",
    params(("enrollment_id" = i32, Path, description = "Enrollment ID")),
    responses(
        (status = 200, description = "Attendance retrieved successfully", body = ApiResponse<Vec<AttendanceResponse>>),
        (status = 404, description = "Enrollment not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[instrument(skip(auth, state), fields(caller = auth.user.id))]
pub async fn get_enrollment_attendance(
    auth: AuthUser,
    Path(enrollment_id): Path<i32>,
    State(state): State<AppState>,
) -> ApiResult<Json<ApiResponse<Vec<AttendanceResponse>>>> {
    auth.require(Resource::Attendance, Action::Read)?;
    existing(&state, enrollment_id).await?;

    let records = attendance::get_by_enrollment(&state.db, enrollment_id).await?;
    let data = records.into_iter().map(AttendanceResponse::from).collect();
    Ok(Json(ApiResponse::new(data, "Attendance retrieved successfully")))
}

/// Counts per attendance status and the attendance rate
#[utoipa::path(
    get,
    path = "/api/v1/enrollments/{enrollment_id}/attendance/summary",
    tag = "enrollments",
    params(("enrollment_id" = i32, Path, description = "Enrollment ID")),
    responses(
        (status = 200, description = "Attendance summary", body = ApiResponse<AttendanceSummary>),
        (status = 404, description = "Enrollment not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[instrument(skip(auth, state), fields(caller = auth.user.id))]
pub async fn get_enrollment_attendance_summary(
    auth: AuthUser,
    Path(enrollment_id): Path<i32>,
    State(state): State<AppState>,
) -> ApiResult<Json<ApiResponse<AttendanceSummary>>> {
    auth.require(Resource::Attendance, Action::Read)?;

    let summary = attendance::summary(&state.db, enrollment_id).await?;
    Ok(Json(ApiResponse::new(summary, "Attendance summary computed successfully")))
}
