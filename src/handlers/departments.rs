use crate::auth::AuthUser;
use crate::error::ApiResult;
use crate::extract::AppJson;
use crate::handlers::{deleted, found, subjects::SubjectResponse, teachers::TeacherResponse};
use crate::policy::{Action, Resource};
use crate::schemas::{ApiResponse, AppState, ErrorResponse};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use chrono::{DateTime, Utc};
use model::entities::department;
use serde::{Deserialize, Serialize};
use store::departments::{self, DepartmentChanges, NewDepartment};
use tracing::{debug, info, instrument};
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DepartmentResponse {
    pub id: i32,
    pub name: String,
    pub description: Option<String>,
    pub head: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<department::Model> for DepartmentResponse {
    fn from(model: department::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            description: model.description,
            head: model.head,
            created_at: model.created_at,
        }
    }
}

/// Get all departments, ordered by name
#[utoipa::path(
    get,
    path = "/api/v1/departments",
    tag = "departments",
    responses(
        (status = 200, description = "Departments retrieved successfully", body = ApiResponse<Vec<DepartmentResponse>>),
        (status = 401, description = "Not logged in", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[instrument(skip(auth, state), fields(caller = auth.user.id))]
pub async fn get_departments(
    auth: AuthUser,
    State(state): State<AppState>,
) -> ApiResult<Json<ApiResponse<Vec<DepartmentResponse>>>> {
    auth.require(Resource::Departments, Action::Read)?;

    let departments = departments::get_all(&state.db).await?;
    debug!("Retrieved {} departments", departments.len());
    let data = departments.into_iter().map(DepartmentResponse::from).collect();
    Ok(Json(ApiResponse::new(data, "Departments retrieved successfully")))
}

/// Create a department
#[utoipa::path(
    post,
    path = "/api/v1/departments",
    tag = "departments",
    request_body = NewDepartment,
    responses(
        (status = 201, description = "Department created successfully", body = ApiResponse<DepartmentResponse>),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 403, description = "Not allowed", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[instrument(skip(auth, state), fields(caller = auth.user.id))]
pub async fn create_department(
    auth: AuthUser,
    State(state): State<AppState>,
    AppJson(request): AppJson<NewDepartment>,
) -> ApiResult<(StatusCode, Json<ApiResponse<DepartmentResponse>>)> {
    auth.require(Resource::Departments, Action::Create)?;

    let department = departments::create(&state.db, request).await?;
    info!("Department {} created", department.id);
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new(
            DepartmentResponse::from(department),
            "Department created successfully",
        )),
    ))
}

/// Get a department by ID
#[utoipa::path(
    get,
    path = "/api/v1/departments/{department_id}",
    tag = "departments",
    params(("department_id" = i32, Path, description = "Department ID")),
    responses(
        (status = 200, description = "Department retrieved successfully", body = ApiResponse<DepartmentResponse>),
        (status = 404, description = "Department not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[instrument(skip(auth, state), fields(caller = auth.user.id))]
pub async fn get_department(
    auth: AuthUser,
    Path(department_id): Path<i32>,
    State(state): State<AppState>,
) -> ApiResult<Json<ApiResponse<DepartmentResponse>>> {
    auth.require(Resource::Departments, Action::Read)?;

    let department = found(
        departments::get_by_id(&state.db, department_id).await?,
        "Department",
        department_id,
    )?;
    Ok(Json(ApiResponse::new(
        DepartmentResponse::from(department),
        "Department retrieved successfully",
    )))
}

/// Update a department
#[utoipa::path(
    put,
    path = "/api/v1/departments/{department_id}",
    tag = "departments",
    params(("department_id" = i32, Path, description = "Department ID")),
    request_body = DepartmentChanges,
    responses(
        (status = 200, description = "Department updated successfully", body = ApiResponse<DepartmentResponse>),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 404, description = "Department not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[instrument(skip(auth, state), fields(caller = auth.user.id))]
pub async fn update_department(
    auth: AuthUser,
    Path(department_id): Path<i32>,
    State(state): State<AppState>,
    AppJson(request): AppJson<DepartmentChanges>,
) -> ApiResult<Json<ApiResponse<DepartmentResponse>>> {
    auth.require(Resource::Departments, Action::Update)?;

    let department = found(
        departments::update(&state.db, department_id, request).await?,
        "Department",
        department_id,
    )?;
    info!("Department {} updated", department.id);
    Ok(Json(ApiResponse::new(
        DepartmentResponse::from(department),
        "Department updated successfully",
    )))
}

/// Delete a department. Its subjects and teachers are kept without a department.
#[utoipa::path(
    delete,
    path = "/api/v1/departments/{department_id}",
    tag = "departments",
    params(("department_id" = i32, Path, description = "Department ID")),
    responses(
        (status = 200, description = "Department deleted successfully", body = ApiResponse<String>),
        (status = 404, description = "Department not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[instrument(skip(auth, state), fields(caller = auth.user.id))]
pub async fn delete_department(
    auth: AuthUser,
    Path(department_id): Path<i32>,
    State(state): State<AppState>,
) -> ApiResult<Json<ApiResponse<String>>> {
    auth.require(Resource::Departments, Action::Delete)?;

    let message = deleted(
        departments::delete(&state.db, department_id).await?,
        "Department",
        department_id,
    )?;
    Ok(Json(ApiResponse::new(message, "Department deleted successfully")))
}

/// Subjects offered by a department
#[utoipa::path(
    get,
    path = "/api/v1/departments/{department_id}/subjects",
    tag = "departments",
    params(("department_id" = i32, Path, description = "Department ID")),
    responses(
        (status = 200, description = "Subjects retrieved successfully", body = ApiResponse<Vec<SubjectResponse>>),
        (status = 404, description = "Department not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[instrument(skip(auth, state), fields(caller = auth.user.id))]
pub async fn get_department_subjects(
    auth: AuthUser,
    Path(department_id): Path<i32>,
    State(state): State<AppState>,
) -> ApiResult<Json<ApiResponse<Vec<SubjectResponse>>>> {
    auth.require(Resource::Subjects, Action::Read)?;
    found(
        departments::get_by_id(&state.db, department_id).await?,
        "Department",
        department_id,
    )?;

    let subjects = departments::subjects_of(&state.db, department_id).await?;
    let data = subjects.into_iter().map(SubjectResponse::from).collect();
    Ok(Json(ApiResponse::new(data, "Subjects retrieved successfully")))
}

/// Teachers belonging to a department
#[utoipa::path(
    get,
    path = "/api/v1/departments/{department_id}/teachers",
    tag = "departments",
    params(("department_id" = i32, Path, description = "Department ID")),
    responses(
        (status = 200, description = "Teachers retrieved successfully", body = ApiResponse<Vec<TeacherResponse>>),
        (status = 404, description = "Department not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[instrument(skip(auth, state), fields(caller = auth.user.id))]
pub async fn get_department_teachers(
    auth: AuthUser,
    Path(department_id): Path<i32>,
    State(state): State<AppState>,
) -> ApiResult<Json<ApiResponse<Vec<TeacherResponse>>>> {
    auth.require(Resource::Teachers, Action::Read)?;
    found(
        departments::get_by_id(&state.db, department_id).await?,
        "Department",
        department_id,
    )?;

    let teachers = departments::teachers_of(&state.db, department_id).await?;
    let data = teachers.into_iter().map(TeacherResponse::from).collect();
    Ok(Json(ApiResponse::new(data, "Teachers retrieved successfully")))
}
