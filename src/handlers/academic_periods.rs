use crate::auth::AuthUser;
use crate::error::{ApiError, ApiResult};
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
use model::entities::academic_period;
use serde::{Deserialize, Serialize};
use store::academic_periods::{self, AcademicPeriodChanges, NewAcademicPeriod};
use store::StoreError;
use tracing::{debug, info, instrument};
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AcademicPeriodResponse {
    pub id: i32,
    pub name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl From<academic_period::Model> for AcademicPeriodResponse {
    fn from(model: academic_period::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            start_date: model.start_date,
            end_date: model.end_date,
            is_active: model.is_active,
            created_at: model.created_at,
        }
    }
}

/// Get all academic periods, latest first
#[utoipa::path(
    get,
    path = "/api/v1/academic-periods",
    tag = "academic-periods",
    responses(
        (status = 200, description = "Academic periods retrieved successfully", body = ApiResponse<Vec<AcademicPeriodResponse>>),
        (status = 401, description = "Not logged in", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[instrument(skip(auth, state), fields(caller = auth.user.id))]
pub async fn get_academic_periods(
    auth: AuthUser,
    State(state): State<AppState>,
) -> ApiResult<Json<ApiResponse<Vec<AcademicPeriodResponse>>>> {
    auth.require(Resource::AcademicPeriods, Action::Read)?;

    let periods = academic_periods::get_all(&state.db).await?;
    debug!("Retrieved {} academic periods", periods.len());
    let data = periods.into_iter().map(AcademicPeriodResponse::from).collect();
    Ok(Json(ApiResponse::new(data, "Academic periods retrieved successfully")))
}

/// Create an academic period; an active one deactivates the rest
#[utoipa::path(
    post,
    path = "/api/v1/academic-periods",
    tag = "academic-periods",
    request_body = NewAcademicPeriod,
    responses(
        (status = 201, description = "Academic period created successfully", body = ApiResponse<AcademicPeriodResponse>),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 403, description = "Not allowed", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[instrument(skip(auth, state), fields(caller = auth.user.id))]
pub async fn create_academic_period(
    auth: AuthUser,
    State(state): State<AppState>,
    AppJson(request): AppJson<NewAcademicPeriod>,
) -> ApiResult<(StatusCode, Json<ApiResponse<AcademicPeriodResponse>>)> {
    auth.require(Resource::AcademicPeriods, Action::Create)?;

    let period = academic_periods::create(&state.db, request).await?;
    info!("Academic period {} created", period.id);
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new(
            AcademicPeriodResponse::from(period),
            "Academic period created successfully",
        )),
    ))
}

/// The period currently marked active
#[utoipa::path(
    get,
    path = "/api/v1/academic-periods/active",
    tag = "academic-periods",
    responses(
        (status = 200, description = "Active academic period", body = ApiResponse<AcademicPeriodResponse>),
        (status = 404, description = "No period is active", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[instrument(skip(auth, state), fields(caller = auth.user.id))]
pub async fn get_active_academic_period(
    auth: AuthUser,
    State(state): State<AppState>,
) -> ApiResult<Json<ApiResponse<AcademicPeriodResponse>>> {
    auth.require(Resource::AcademicPeriods, Action::Read)?;

    let period = academic_periods::get_active(&state.db)
        .await?
        .ok_or_else(|| ApiError::from(StoreError::NotFound("No academic period is active".to_string())))?;
    Ok(Json(ApiResponse::new(
        AcademicPeriodResponse::from(period),
        "Active academic period retrieved successfully",
    )))
}

/// Get an academic period by ID
#[utoipa::path(
    get,
    path = "/api/v1/academic-periods/{period_id}",
    tag = "academic-periods",
    params(("period_id" = i32, Path, description = "Academic period ID")),
    responses(
        (status = 200, description = "Academic period retrieved successfully", body = ApiResponse<AcademicPeriodResponse>),
        (status = 404, description = "Academic period not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[instrument(skip(auth, state), fields(caller = auth.user.id))]
pub async fn get_academic_period(
    auth: AuthUser,
    Path(period_id): Path<i32>,
    State(state): State<AppState>,
) -> ApiResult<Json<ApiResponse<AcademicPeriodResponse>>> {
    auth.require(Resource::AcademicPeriods, Action::Read)?;

    let period = found(
        academic_periods::get_by_id(&state.db, period_id).await?,
        "Academic period",
        period_id,
    )?;
    Ok(Json(ApiResponse::new(
        AcademicPeriodResponse::from(period),
        "Academic period retrieved successfully",
    )))
}

/// Update an academic period
#[utoipa::path(
    put,
    path = "/api/v1/academic-periods/{period_id}",
    tag = "academic-periods",
    params(("period_id" = i32, Path, description = "Academic period ID")),
    request_body = AcademicPeriodChanges,
    responses(
        (status = 200, description = "Academic period updated successfully", body = ApiResponse<AcademicPeriodResponse>),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 404, description = "Academic period not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[instrument(skip(auth, state), fields(caller = auth.user.id))]
pub async fn update_academic_period(
    auth: AuthUser,
    Path(period_id): Path<i32>,
    State(state): State<AppState>,
    AppJson(request): AppJson<AcademicPeriodChanges>,
) -> ApiResult<Json<ApiResponse<AcademicPeriodResponse>>> {
    auth.require(Resource::AcademicPeriods, Action::Update)?;

    let period = found(
        academic_periods::update(&state.db, period_id, request).await?,
        "Academic period",
        period_id,
    )?;
    info!("Academic period {} updated", period.id);
    Ok(Json(ApiResponse::new(
        AcademicPeriodResponse::from(period),
        "Academic period updated successfully",
    )))
}

/// Delete an academic period that no course refers to
#[utoipa::path(
    delete,
    path = "/api/v1/academic-periods/{period_id}",
    tag = "academic-periods",
    params(("period_id" = i32, Path, description = "Academic period ID")),
    responses(
        (status = 200, description = "Academic period deleted successfully", body = ApiResponse<String>),
        (status = 404, description = "Academic period not found", body = ErrorResponse),
        (status = 409, description = "Courses still use the period", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[instrument(skip(auth, state), fields(caller = auth.user.id))]
pub async fn delete_academic_period(
    auth: AuthUser,
    Path(period_id): Path<i32>,
    State(state): State<AppState>,
) -> ApiResult<Json<ApiResponse<String>>> {
    auth.require(Resource::AcademicPeriods, Action::Delete)?;

    let message = deleted(
        academic_periods::delete(&state.db, period_id).await?,
        "Academic period",
        period_id,
    )?;
    Ok(Json(ApiResponse::new(message, "Academic period deleted successfully")))
}

/// Make this the only active period
#[utoipa::path(
    post,
    path = "/api/v1/academic-periods/{period_id}/activate",
    tag = "academic-periods",
    params(("period_id" = i32, Path, description = "Academic period ID")),
    responses(
        (status = 200, description = "Academic period activated", body = ApiResponse<AcademicPeriodResponse>),
        (status = 404, description = "Academic period not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[instrument(skip(auth, state), fields(caller = auth.user.id))]
pub async fn activate_academic_period(
    auth: AuthUser,
    Path(period_id): Path<i32>,
    State(state): State<AppState>,
) -> ApiResult<Json<ApiResponse<AcademicPeriodResponse>>> {
    auth.require(Resource::AcademicPeriods, Action::Update)?;

    let period = academic_periods::activate(&state.db, period_id).await?;
    Ok(Json(ApiResponse::new(
        AcademicPeriodResponse::from(period),
        "Academic period activated successfully",
    )))
}
