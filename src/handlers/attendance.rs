use crate::auth::AuthUser;
use crate::error::ApiResult;
use crate::extract::AppJson;
use crate::handlers::{deleted, found};
use crate::policy::{Action, Resource};
use crate::schemas::{ApiResponse, AppState, ErrorResponse};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use chrono::{DateTime, NaiveDate, Utc};
use model::entities::attendance::{self as attendance_entity, AttendanceStatus};
use serde::{Deserialize, Serialize};
use store::attendance::{self, AttendanceChanges, NewAttendance};
use tracing::{debug, info, instrument};
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceResponse {
    pub id: i32,
    pub enrollment_id: i32,
    pub date: NaiveDate,
    pub status: AttendanceStatus,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<attendance_entity::Model> for AttendanceResponse {
    fn from(model: attendance_entity::Model) -> Self {
        Self {
            id: model.id,
            enrollment_id: model.enrollment_id,
            date: model.date,
            status: model.status,
            notes: model.notes,
            created_at: model.created_at,
        }
    }
}

/// Get all attendance records
#[utoipa::path(
    get,
    path = "/api/v1/attendance",
    tag = "attendance",
    responses(
        (status = 200, description = "Attendance retrieved successfully", body = ApiResponse<Vec<AttendanceResponse>>),
        (status = 401, description = "Not logged in", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[instrument(skip(auth, state), fields(caller = auth.user.id))]
pub async fn get_attendance_records(
    auth: AuthUser,
    State(state): State<AppState>,
) -> ApiResult<Json<ApiResponse<Vec<AttendanceResponse>>>> {
    auth.require(Resource::Attendance, Action::Read)?;

    let records = attendance::get_all(&state.db).await?;
    debug!("Retrieved {} attendance records", records.len());
    let data = records.into_iter().map(AttendanceResponse::from).collect();
    Ok(Json(ApiResponse::new(data, "Attendance retrieved successfully")))
}

/// Create an attendance record; a second one for the same day is a conflict
#[utoipa::path(
    post,
    path = "/api/v1/attendance",
    tag = "attendance",
    request_body = NewAttendance,
    responses(
        (status = 201, description = "Attendance created successfully", body = ApiResponse<AttendanceResponse>),
        (status = 403, description = "Not allowed", body = ErrorResponse),
        (status = 409, description = "Already recorded for that day", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[instrument(skip(auth, state), fields(caller = auth.user.id))]
pub async fn create_attendance(
    auth: AuthUser,
    State(state): State<AppState>,
    AppJson(request): AppJson<NewAttendance>,
) -> ApiResult<(StatusCode, Json<ApiResponse<AttendanceResponse>>)> {
    auth.require(Resource::Attendance, Action::Create)?;

    let record = attendance::create(&state.db, request).await?;
    info!("Attendance {} created for enrollment {}", record.id, record.enrollment_id);
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new(
            AttendanceResponse::from(record),
            "Attendance created successfully",
        )),
    ))
}

/// Insert or overwrite the attendance of an enrollment for a day
#[utoipa::path(
    post,
    path = "/api/v1/attendance/record",
    tag = "attendance",
    request_body = NewAttendance,
    responses(
        (status = 200, description = "Attendance recorded", body = ApiResponse<AttendanceResponse>),
        (status = 403, description = "Not allowed", body = ErrorResponse),
        (status = 404, description = "Enrollment not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[instrument(skip(auth, state), fields(caller = auth.user.id))]
pub async fn record_attendance(
    auth: AuthUser,
    State(state): State<AppState>,
    AppJson(request): AppJson<NewAttendance>,
) -> ApiResult<Json<ApiResponse<AttendanceResponse>>> {
    auth.require(Resource::Attendance, Action::Create)?;
    auth.require(Resource::Attendance, Action::Update)?;

    let record = attendance::record(&state.db, request).await?;
    Ok(Json(ApiResponse::new(
        AttendanceResponse::from(record),
        "Attendance recorded successfully",
    )))
}

/// Get an attendance record by ID
#[utoipa::path(
    get,
    path = "/api/v1/attendance/{attendance_id}",
    tag = "attendance",
    params(("attendance_id" = i32, Path, description = "Attendance record ID")),
    responses(
        (status = 200, description = "Attendance retrieved successfully", body = ApiResponse<AttendanceResponse>),
        (status = 404, description = "Attendance record not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[instrument(skip(auth, state), fields(caller = auth.user.id))]
pub async fn get_attendance(
    auth: AuthUser,
    Path(attendance_id): Path<i32>,
    State(state): State<AppState>,
) -> ApiResult<Json<ApiResponse<AttendanceResponse>>> {
    auth.require(Resource::Attendance, Action::Read)?;

    let record = found(
        attendance::get_by_id(&state.db, attendance_id).await?,
        "Attendance record",
        attendance_id,
    )?;
    Ok(Json(ApiResponse::new(
        AttendanceResponse::from(record),
        "Attendance retrieved successfully",
    )))
}

/// Update an attendance record
#[utoipa::path(
    put,
    path = "/api/v1/attendance/{attendance_id}",
    tag = "attendance",
    params(("attendance_id" = i32, Path, description = "Attendance record ID")),
    request_body = AttendanceChanges,
    responses(
        (status = 200, description = "Attendance updated successfully", body = ApiResponse<AttendanceResponse>),
        (status = 404, description = "Attendance record not found", body = ErrorResponse),
        (status = 409, description = "Moved onto a day already recorded", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[instrument(skip(auth, state), fields(caller = auth.user.id))]
pub async fn update_attendance(
    auth: AuthUser,
    Path(attendance_id): Path<i32>,
    State(state): State<AppState>,
    AppJson(request): AppJson<AttendanceChanges>,
) -> ApiResult<Json<ApiResponse<AttendanceResponse>>> {
    auth.require(Resource::Attendance, Action::Update)?;

    let record = found(
        attendance::update(&state.db, attendance_id, request).await?,
        "Attendance record",
        attendance_id,
    )?;
    info!("Attendance {} updated", record.id);
    Ok(Json(ApiResponse::new(
        AttendanceResponse::from(record),
        "Attendance updated successfully",
    )))
}

/// Delete an attendance record
#[utoipa::path(
    delete,
    path = "/api/v1/attendance/{attendance_id}",
    tag = "attendance",
    params(("attendance_id" = i32, Path, description = "Attendance record ID")),
    responses(
        (status = 200, description = "Attendance deleted successfully", body = ApiResponse<String>),
        (status = 404, description = "Attendance record not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[instrument(skip(auth, state), fields(caller = auth.user.id))]
pub async fn delete_attendance(
    auth: AuthUser,
    Path(attendance_id): Path<i32>,
    State(state): State<AppState>,
) -> ApiResult<Json<ApiResponse<String>>> {
    auth.require(Resource::Attendance, Action::Delete)?;

    let message = deleted(
        attendance::delete(&state.db, attendance_id).await?,
        "Attendance record",
        attendance_id,
    )?;
    Ok(Json(ApiResponse::new(message, "Attendance deleted successfully")))
}
