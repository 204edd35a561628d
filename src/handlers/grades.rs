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
use model::entities::grade;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use store::grades::{self, GradeChanges, NewGrade};
use tracing::{debug, info, instrument};
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GradeResponse {
    pub id: i32,
    pub enrollment_id: i32,
    pub assessment_type: String,
    pub assessment_name: String,
    #[schema(value_type = String, example = "42.5")]
    pub score: Decimal,
    #[schema(value_type = String, example = "50")]
    pub max_score: Decimal,
    #[schema(value_type = Option<String>, example = "0.25")]
    pub weight: Option<Decimal>,
    /// score / maxScore in percent
    #[schema(value_type = Option<String>, example = "85")]
    pub percentage: Option<Decimal>,
    pub assessment_date: NaiveDate,
    pub created_at: DateTime<Utc>,
}

impl From<grade::Model> for GradeResponse {
    fn from(model: grade::Model) -> Self {
        Self {
            percentage: model.percentage(),
            id: model.id,
            enrollment_id: model.enrollment_id,
            assessment_type: model.assessment_type,
            assessment_name: model.assessment_name,
            score: model.score,
            max_score: model.max_score,
            weight: model.weight,
            assessment_date: model.assessment_date,
            created_at: model.created_at,
        }
    }
}

/// Get all grades
#[utoipa::path(
    get,
    path = "/api/v1/grades",
    tag = "grades",
    responses(
        (status = 200, description = "Grades retrieved successfully", body = ApiResponse<Vec<GradeResponse>>),
        (status = 401, description = "Not logged in", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[instrument(skip(auth, state), fields(caller = auth.user.id))]
pub async fn get_grades(
    auth: AuthUser,
    State(state): State<AppState>,
) -> ApiResult<Json<ApiResponse<Vec<GradeResponse>>>> {
    auth.require(Resource::Grades, Action::Read)?;

    let grades = grades::get_all(&state.db).await?;
    debug!("Retrieved {} grades", grades.len());
    let data = grades.into_iter().map(GradeResponse::from).collect();
    Ok(Json(ApiResponse::new(data, "Grades retrieved successfully")))
}

/// Record a grade for an enrollment
#[utoipa::path(
    post,
    path = "/api/v1/grades",
    tag = "grades",
    request_body = NewGrade,
    responses(
        (status = 201, description = "Grade created successfully", body = ApiResponse<GradeResponse>),
        (status = 400, description = "Score out of range", body = ErrorResponse),
        (status = 403, description = "Not allowed", body = ErrorResponse),
        (status = 409, description = "Unknown enrollment", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[instrument(skip(auth, state), fields(caller = auth.user.id))]
pub async fn create_grade(
    auth: AuthUser,
    State(state): State<AppState>,
    AppJson(request): AppJson<NewGrade>,
) -> ApiResult<(StatusCode, Json<ApiResponse<GradeResponse>>)> {
    auth.require(Resource::Grades, Action::Create)?;

    let grade = grades::create(&state.db, request).await?;
    info!("Grade {} recorded for enrollment {}", grade.id, grade.enrollment_id);
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new(GradeResponse::from(grade), "Grade created successfully")),
    ))
}

/// Get a grade by ID
#[utoipa::path(
    get,
    path = "/api/v1/grades/{grade_id}",
    tag = "grades",
    params(("grade_id" = i32, Path, description = "Grade ID")),
    responses(
        (status = 200, description = "Grade retrieved successfully", body = ApiResponse<GradeResponse>),
        (status = 404, description = "Grade not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[instrument(skip(auth, state), fields(caller = auth.user.id))]
pub async fn get_grade(
    auth: AuthUser,
    Path(grade_id): Path<i32>,
    State(state): State<AppState>,
) -> ApiResult<Json<ApiResponse<GradeResponse>>> {
    auth.require(Resource::Grades, Action::Read)?;

    let grade = found(grades::get_by_id(&state.db, grade_id).await?, "Grade", grade_id)?;
    Ok(Json(ApiResponse::new(GradeResponse::from(grade), "Grade retrieved successfully")))
}

/// Update a grade
#[utoipa::path(
    put,
    path = "/api/v1/grades/{grade_id}",
    tag = "grades",
    params(("grade_id" = i32, Path, description = "Grade ID")),
    request_body = GradeChanges,
    responses(
        (status = 200, description = "Grade updated successfully", body = ApiResponse<GradeResponse>),
        (status = 400, description = "Score out of range", body = ErrorResponse),
        (status = 404, description = "Grade not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[instrument(skip(auth, state), fields(caller = auth.user.id))]
pub async fn update_grade(
    auth: AuthUser,
    Path(grade_id): Path<i32>,
    State(state): State<AppState>,
    AppJson(request): AppJson<GradeChanges>,
) -> ApiResult<Json<ApiResponse<GradeResponse>>> {
    auth.require(Resource::Grades, Action::Update)?;

    let grade = found(grades::update(&state.db, grade_id, request).await?, "Grade", grade_id)?;
    info!("Grade {} updated", grade.id);
    Ok(Json(ApiResponse::new(GradeResponse::from(grade), "Grade updated successfully")))
}

/// Delete a grade
#[utoipa::path(
    delete,
    path = "/api/v1/grades/{grade_id}",
    tag = "grades",
    params(("grade_id" = i32, Path, description = "Grade ID")),
    responses(
        (status = 200, description = "Grade deleted successfully", body = ApiResponse<String>),
        (status = 404, description = "Grade not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[instrument(skip(auth, state), fields(caller = auth.user.id))]
pub async fn delete_grade(
    auth: AuthUser,
    Path(grade_id): Path<i32>,
    State(state): State<AppState>,
) -> ApiResult<Json<ApiResponse<String>>> {
    auth.require(Resource::Grades, Action::Delete)?;

    let message = deleted(grades::delete(&state.db, grade_id).await?, "Grade", grade_id)?;
    Ok(Json(ApiResponse::new(message, "Grade deleted successfully")))
}
