use crate::auth::AuthUser;
use crate::error::ApiResult;
use crate::policy::{Action, Resource};
use crate::schemas::{ApiResponse, AppState, ErrorResponse};
use axum::{extract::State, response::Json};
use store::dashboard::{self, Statistics};
use tracing::instrument;

/// Headline counts for the landing page
#[utoipa::path(
    get,
    path = "/api/v1/dashboard/statistics",
    tag = "dashboard",
    responses(
        (status = 200, description = "Statistics retrieved successfully", body = ApiResponse<Statistics>),
        (status = 401, description = "Not logged in", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[instrument(skip(auth, state), fields(caller = auth.user.id))]
pub async fn get_statistics(
    auth: AuthUser,
    State(state): State<AppState>,
) -> ApiResult<Json<ApiResponse<Statistics>>> {
    auth.require(Resource::Dashboard, Action::Read)?;

    let statistics = dashboard::statistics(&state.db).await?;
    Ok(Json(ApiResponse::new(statistics, "Statistics retrieved successfully")))
}
