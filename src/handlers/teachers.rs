use crate::auth::AuthUser;
use crate::error::ApiResult;
use crate::extract::AppJson;
use crate::handlers::{deleted, found, users::UserResponse};
use crate::policy::{Action, Resource};
use crate::schemas::{ApiResponse, AppState, ErrorResponse};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use chrono::{DateTime, NaiveDate, Utc};
use model::entities::teacher::{self, TeacherStatus};
use serde::{Deserialize, Serialize};
use store::teachers::{self, NewTeacher, NewTeacherAccount, TeacherChanges};
use tracing::{debug, info, instrument};
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TeacherResponse {
    pub id: i32,
    pub user_id: i32,
    pub teacher_code: String,
    pub department_id: Option<i32>,
    pub specialization: Option<String>,
    pub phone: Option<String>,
    pub hire_date: NaiveDate,
    pub contract_end_date: Option<NaiveDate>,
    pub status: TeacherStatus,
    pub created_at: DateTime<Utc>,
}

impl From<teacher::Model> for TeacherResponse {
    fn from(model: teacher::Model) -> Self {
        Self {
            id: model.id,
            user_id: model.user_id,
            teacher_code: model.teacher_code,
            department_id: model.department_id,
            specialization: model.specialization,
            phone: model.phone,
            hire_date: model.hire_date,
            contract_end_date: model.contract_end_date,
            status: model.status,
            created_at: model.created_at,
        }
    }
}

/// Account and teacher profile created together
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TeacherAccountResponse {
    pub user: UserResponse,
    pub teacher: TeacherResponse,
}

/// Get all teachers
#[utoipa::path(
    get,
    path = "/api/v1/teachers",
    tag = "teachers",
    responses(
        (status = 200, description = "Teachers retrieved successfully", body = ApiResponse<Vec<TeacherResponse>>),
        (status = 401, description = "Not logged in", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[instrument(skip(auth, state), fields(caller = auth.user.id))]
pub async fn get_teachers(
    auth: AuthUser,
    State(state): State<AppState>,
) -> ApiResult<Json<ApiResponse<Vec<TeacherResponse>>>> {
    auth.require(Resource::Teachers, Action::Read)?;

    let teachers = teachers::get_all(&state.db).await?;
    debug!("Retrieved {} teachers", teachers.len());
    let data = teachers.into_iter().map(TeacherResponse::from).collect();
    Ok(Json(ApiResponse::new(data, "Teachers retrieved successfully")))
}

/// Create a teacher profile for an existing teacher account
#[utoipa::path(
    post,
    path = "/api/v1/teachers",
    tag = "teachers",
    request_body = NewTeacher,
    responses(
        (status = 201, description = "Teacher created successfully", body = ApiResponse<TeacherResponse>),
        (status = 400, description = "Invalid request or user is not a teacher", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse),
        (status = 409, description = "Profile or code already exists", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[instrument(skip(auth, state), fields(caller = auth.user.id))]
pub async fn create_teacher(
    auth: AuthUser,
    State(state): State<AppState>,
    AppJson(request): AppJson<NewTeacher>,
) -> ApiResult<(StatusCode, Json<ApiResponse<TeacherResponse>>)> {
    auth.require(Resource::Teachers, Action::Create)?;

    let teacher = teachers::create(&state.db, request).await?;
    info!("Teacher {} ({}) created", teacher.id, teacher.teacher_code);
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new(TeacherResponse::from(teacher), "Teacher created successfully")),
    ))
}

/// Create a teacher account and profile in one step
#[utoipa::path(
    post,
    path = "/api/v1/teachers/accounts",
    tag = "teachers",
    request_body = NewTeacherAccount,
    responses(
        (status = 201, description = "Teacher account created successfully", body = ApiResponse<TeacherAccountResponse>),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 409, description = "Email or code already used", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[instrument(skip(auth, state), fields(caller = auth.user.id))]
pub async fn create_teacher_account(
    auth: AuthUser,
    State(state): State<AppState>,
    AppJson(request): AppJson<NewTeacherAccount>,
) -> ApiResult<(StatusCode, Json<ApiResponse<TeacherAccountResponse>>)> {
    auth.require(Resource::Teachers, Action::Create)?;
    auth.require(Resource::Users, Action::Create)?;

    let (user, teacher) = teachers::create_with_user(&state.db, request).await?;
    info!("Teacher account {} created with profile {}", user.id, teacher.id);
    let response = TeacherAccountResponse {
        user: UserResponse::from(user),
        teacher: TeacherResponse::from(teacher),
    };
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new(response, "Teacher account created successfully")),
    ))
}

/// Get a teacher by ID
#[utoipa::path(
    get,
    path = "/api/v1/teachers/{teacher_id}",
    tag = "teachers",
    params(("teacher_id" = i32, Path, description = "Teacher ID")),
    responses(
        (status = 200, description = "Teacher retrieved successfully", body = ApiResponse<TeacherResponse>),
        (status = 404, description = "Teacher not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[instrument(skip(auth, state), fields(caller = auth.user.id))]
pub async fn get_teacher(
    auth: AuthUser,
    Path(teacher_id): Path<i32>,
    State(state): State<AppState>,
) -> ApiResult<Json<ApiResponse<TeacherResponse>>> {
    auth.require(Resource::Teachers, Action::Read)?;

    let teacher = found(teachers::get_by_id(&state.db, teacher_id).await?, "Teacher", teacher_id)?;
    Ok(Json(ApiResponse::new(TeacherResponse::from(teacher), "Teacher retrieved successfully")))
}

/// Update a teacher profile
#[utoipa::path(
    put,
    path = "/api/v1/teachers/{teacher_id}",
    tag = "teachers",
    params(("teacher_id" = i32, Path, description = "Teacher ID")),
    request_body = TeacherChanges,
    responses(
        (status = 200, description = "Teacher updated successfully", body = ApiResponse<TeacherResponse>),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 404, description = "Teacher not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[instrument(skip(auth, state), fields(caller = auth.user.id))]
pub async fn update_teacher(
    auth: AuthUser,
    Path(teacher_id): Path<i32>,
    State(state): State<AppState>,
    AppJson(request): AppJson<TeacherChanges>,
) -> ApiResult<Json<ApiResponse<TeacherResponse>>> {
    auth.require(Resource::Teachers, Action::Update)?;

    let teacher = found(
        teachers::update(&state.db, teacher_id, request).await?,
        "Teacher",
        teacher_id,
    )?;
    info!("Teacher {} updated", teacher.id);
    Ok(Json(ApiResponse::new(TeacherResponse::from(teacher), "Teacher updated successfully")))
}

/// Delete a teacher profile that teaches no course
#[utoipa::path(
    delete,
    path = "/api/v1/teachers/{teacher_id}",
    tag = "teachers",
    params(("teacher_id" = i32, Path, description = "Teacher ID")),
    responses(
        (status = 200, description = "Teacher deleted successfully", body = ApiResponse<String>),
        (status = 404, description = "Teacher not found", body = ErrorResponse),
        (status = 409, description = "Teacher still has courses", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[instrument(skip(auth, state), fields(caller = auth.user.id))]
pub async fn delete_teacher(
    auth: AuthUser,
    Path(teacher_id): Path<i32>,
    State(state): State<AppState>,
) -> ApiResult<Json<ApiResponse<String>>> {
    auth.require(Resource::Teachers, Action::Delete)?;

    let message = deleted(teachers::delete(&state.db, teacher_id).await?, "Teacher", teacher_id)?;
    Ok(Json(ApiResponse::new(message, "Teacher deleted successfully")))
}
