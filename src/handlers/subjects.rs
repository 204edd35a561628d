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
use chrono::{DateTime, Utc};
use model::entities::subject;
use serde::{Deserialize, Serialize};
use store::subjects::{self, NewSubject, SubjectChanges};
use tracing::{debug, info, instrument};
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SubjectResponse {
    pub id: i32,
    pub name: String,
    pub code: String,
    pub description: Option<String>,
    pub credits: i32,
    pub department_id: Option<i32>,
    pub created_at: DateTime<Utc>,
}

impl From<subject::Model> for SubjectResponse {
    fn from(model: subject::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            code: model.code,
            description: model.description,
            credits: model.credits,
            department_id: model.department_id,
            created_at: model.created_at,
        }
    }
}

/// Get all subjects
#[utoipa::path(
    get,
    path = "/api/v1/subjects",
    tag = "subjects",
    responses(
        (status = 200, description = "Subjects retrieved successfully", body = ApiResponse<Vec<SubjectResponse>>),
        (status = 401, description = "Not logged in", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[instrument(skip(auth, state), fields(caller = auth.user.id))]
pub async fn get_subjects(
    auth: AuthUser,
    State(state): State<AppState>,
) -> ApiResult<Json<ApiResponse<Vec<SubjectResponse>>>> {
    auth.require(Resource::Subjects, Action::Read)?;

    let subjects = subjects::get_all(&state.db).await?;
    debug!("Retrieved {} subjects", subjects.len());
    let data = subjects.into_iter().map(SubjectResponse::from).collect();
    Ok(Json(ApiResponse::new(data, "Subjects retrieved successfully")))
}

/// Create a subject
#[utoipa::path(
    post,
    path = "/api/v1/subjects",
    tag = "subjects",
    request_body = NewSubject,
    responses(
        (status = 201, description = "Subject created successfully", body = ApiResponse<SubjectResponse>),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 409, description = "Code already used or unknown department", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[instrument(skip(auth, state), fields(caller = auth.user.id))]
pub async fn create_subject(
    auth: AuthUser,
    State(state): State<AppState>,
    AppJson(request): AppJson<NewSubject>,
) -> ApiResult<(StatusCode, Json<ApiResponse<SubjectResponse>>)> {
    auth.require(Resource::Subjects, Action::Create)?;

    let subject = subjects::create(&state.db, request).await?;
    info!("Subject {} ({}) created", subject.id, subject.code);
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new(SubjectResponse::from(subject), "Subject created successfully")),
    ))
}

/// Get a subject by ID
#[utoipa::path(
    get,
    path = "/api/v1/subjects/{subject_id}",
    tag = "subjects",
    params(("subject_id" = i32, Path, description = "Subject ID")),
    responses(
        (status = 200, description = "Subject retrieved successfully", body = ApiResponse<SubjectResponse>),
        (status = 404, description = "Subject not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[instrument(skip(auth, state), fields(caller = auth.user.id))]
pub async fn get_subject(
    auth: AuthUser,
    Path(subject_id): Path<i32>,
    State(state): State<AppState>,
) -> ApiResult<Json<ApiResponse<SubjectResponse>>> {
    auth.require(Resource::Subjects, Action::Read)?;

    let subject = found(subjects::get_by_id(&state.db, subject_id).await?, "Subject", subject_id)?;
    Ok(Json(ApiResponse::new(SubjectResponse::from(subject), "Subject retrieved successfully")))
}

/// Update a subject
#[utoipa::path(
    put,
    path = "/api/v1/subjects/{subject_id}",
    tag = "subjects",
    params(("subject_id" = i32, Path, description = "Subject ID")),
    request_body = SubjectChanges,
    responses(
        (status = 200, description = "Subject updated successfully", body = ApiResponse<SubjectResponse>),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 404, description = "Subject not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[instrument(skip(auth, state), fields(caller = auth.user.id))]
pub async fn update_subject(
    auth: AuthUser,
    Path(subject_id): Path<i32>,
    State(state): State<AppState>,
    AppJson(request): AppJson<SubjectChanges>,
) -> ApiResult<Json<ApiResponse<SubjectResponse>>> {
    auth.require(Resource::Subjects, Action::Update)?;

    let subject = found(
        subjects::update(&state.db, subject_id, request).await?,
        "Subject",
        subject_id,
    )?;
    info!("Subject {} updated", subject.id);
    Ok(Json(ApiResponse::new(SubjectResponse::from(subject), "Subject updated successfully")))
}

/// Delete a subject no course is built on
#[utoipa::path(
    delete,
    path = "/api/v1/subjects/{subject_id}",
    tag = "subjects",
    params(("subject_id" = i32, Path, description = "Subject ID")),
    responses(
        (status = 200, description = "Subject deleted successfully", body = ApiResponse<String>),
        (status = 404, description = "Subject not found", body = ErrorResponse),
        (status = 409, description = "Courses still use the subject", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[instrument(skip(auth, state), fields(caller = auth.user.id))]
pub async fn delete_subject(
    auth: AuthUser,
    Path(subject_id): Path<i32>,
    State(state): State<AppState>,
) -> ApiResult<Json<ApiResponse<String>>> {
    auth.require(Resource::Subjects, Action::Delete)?;

    let message = deleted(subjects::delete(&state.db, subject_id).await?, "Subject", subject_id)?;
    Ok(Json(ApiResponse::new(message, "Subject deleted successfully")))
}
