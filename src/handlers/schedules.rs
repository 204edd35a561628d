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
use chrono::{DateTime, NaiveTime, Utc};
use model::entities::schedule::{self, DayOfWeek};
use serde::{Deserialize, Serialize};
use store::schedules::{self, NewSchedule, ScheduleChanges};
use tracing::{debug, info, instrument};
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleResponse {
    pub id: i32,
    pub course_id: i32,
    pub day_of_week: DayOfWeek,
    #[schema(value_type = String, example = "09:00:00")]
    pub start_time: NaiveTime,
    #[schema(value_type = String, example = "10:30:00")]
    pub end_time: NaiveTime,
    pub classroom: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<schedule::Model> for ScheduleResponse {
    fn from(model: schedule::Model) -> Self {
        Self {
            id: model.id,
            course_id: model.course_id,
            day_of_week: model.day_of_week,
            start_time: model.start_time,
            end_time: model.end_time,
            classroom: model.classroom,
            created_at: model.created_at,
        }
    }
}

/// Get all schedules
#[utoipa::path(
    get,
    path = "/api/v1/schedules",
    tag = "schedules",
    responses(
        (status = 200, description = "Schedules retrieved successfully", body = ApiResponse<Vec<ScheduleResponse>>),
        (status = 401, description = "Not logged in", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[instrument(skip(auth, state), fields(caller = auth.user.id))]
pub async fn get_schedules(
    auth: AuthUser,
    State(state): State<AppState>,
) -> ApiResult<Json<ApiResponse<Vec<ScheduleResponse>>>> {
    auth.require(Resource::Schedules, Action::Read)?;

    let slots = schedules::get_all(&state.db).await?;
    debug!("Retrieved {} schedules", slots.len());
    let data = slots.into_iter().map(ScheduleResponse::from).collect();
    Ok(Json(ApiResponse::new(data, "Schedules retrieved successfully")))
}

/// Add a weekly slot to a course
#[utoipa::path(
    post,
    path = "/api/v1/schedules",
    tag = "schedules",
    request_body = NewSchedule,
    responses(
        (status = 201, description = "Schedule created successfully", body = ApiResponse<ScheduleResponse>),
        (status = 400, description = "Start is not before end", body = ErrorResponse),
        (status = 409, description = "Overlaps another slot of the course", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[instrument(skip(auth, state), fields(caller = auth.user.id))]
pub async fn create_schedule(
    auth: AuthUser,
    State(state): State<AppState>,
    AppJson(request): AppJson<NewSchedule>,
) -> ApiResult<(StatusCode, Json<ApiResponse<ScheduleResponse>>)> {
    auth.require(Resource::Schedules, Action::Create)?;

    let slot = schedules::create(&state.db, request).await?;
    info!("Schedule {} created for course {}", slot.id, slot.course_id);
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new(ScheduleResponse::from(slot), "Schedule created successfully")),
    ))
}

/// Get a schedule by ID
#[utoipa::path(
    get,
    path = "/api/v1/schedules/{schedule_id}",
    tag = "schedules",
    params(("schedule_id" = i32, Path, description = "Schedule ID")),
    responses(
        (status = 200, description = "Schedule retrieved successfully", body = ApiResponse<ScheduleResponse>),
        (status = 404, description = "Schedule not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[instrument(skip(auth, state), fields(caller = auth.user.id))]
pub async fn get_schedule(
    auth: AuthUser,
    Path(schedule_id): Path<i32>,
    State(state): State<AppState>,
) -> ApiResult<Json<ApiResponse<ScheduleResponse>>> {
    auth.require(Resource::Schedules, Action::Read)?;

    let slot = found(schedules::get_by_id(&state.db, schedule_id).await?, "Schedule", schedule_id)?;
    Ok(Json(ApiResponse::new(ScheduleResponse::from(slot), "Schedule retrieved successfully")))
}

/// Update a schedule
#[utoipa::path(
    put,
    path = "/api/v1/schedules/{schedule_id}",
    tag = "schedules",
    params(("schedule_id" = i32, Path, description = "Schedule ID")),
    request_body = ScheduleChanges,
    responses(
        (status = 200, description = "Schedule updated successfully", body = ApiResponse<ScheduleResponse>),
        (status = 400, description = "Start is not before end", body = ErrorResponse),
        (status = 404, description = "Schedule not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[instrument(skip(auth, state), fields(caller = auth.user.id))]
pub async fn update_schedule(
    auth: AuthUser,
    Path(schedule_id): Path<i32>,
    State(state): State<AppState>,
    AppJson(request): AppJson<ScheduleChanges>,
) -> ApiResult<Json<ApiResponse<ScheduleResponse>>> {
    auth.require(Resource::Schedules, Action::Update)?;

    let slot = found(
        schedules::update(&state.db, schedule_id, request).await?,
        "Schedule",
        schedule_id,
    )?;
    info!("Schedule {} updated", slot.id);
    Ok(Json(ApiResponse::new(ScheduleResponse::from(slot), "Schedule updated successfully")))
}

/// Delete a schedule
#[utoipa::path(
    delete,
    path = "/api/v1/schedules/{schedule_id}",
    tag = "schedules",
    params(("schedule_id" = i32, Path, description = "Schedule ID")),
    responses(
        (status = 200, description = "Schedule deleted successfully", body = ApiResponse<String>),
        (status = 404, description = "Schedule not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[instrument(skip(auth, state), fields(caller = auth.user.id))]
pub async fn delete_schedule(
    auth: AuthUser,
    Path(schedule_id): Path<i32>,
    State(state): State<AppState>,
) -> ApiResult<Json<ApiResponse<String>>> {
    auth.require(Resource::Schedules, Action::Delete)?;

    let message = deleted(schedules::delete(&state.db, schedule_id).await?, "Schedule", schedule_id)?;
    Ok(Json(ApiResponse::new(message, "Schedule deleted successfully")))
}
